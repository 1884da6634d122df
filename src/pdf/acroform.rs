//! # AcroForm Fields
//!
//! Turns [`InteractiveField`]s into an interactive form. Each widget gets a
//! normal appearance stream so filled values show up even in viewers that
//! never regenerate appearances, and the catalog additionally sets
//! `/NeedAppearances` so editing viewers redraw after a change.
//!
//! Field names are dot-separated. PDF treats the partial name `/T` of each
//! node as one level of a tree, so the flat names are folded into a trie:
//! interior nodes become non-terminal fields (`/T`, `/Kids`), leaves become
//! merged field/widget dictionaries.

use std::fmt::Write as FmtWrite;

use super::encoding::{pdf_text_string, win_ansi_literal};
use super::PdfBuilder;
use crate::error::ExportError;
use crate::font::StandardFont;
use crate::form::{FieldWidget, InteractiveField};
use crate::text::wrap_paragraphs;

/// Field flag: text field accepts multiple lines.
const FF_MULTILINE: u32 = 1 << 12;
/// Field flag: choice field is a combo box (dropdown).
const FF_COMBO: u32 = 1 << 17;

const MULTILINE_FONT_SIZE: f64 = 9.0;
const MAX_FONT_SIZE: f64 = 10.0;
const MIN_FONT_SIZE: f64 = 6.0;
const PADDING: f64 = 2.0;

/// Object ids of the fonts the form's default resources point at.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FormFonts {
    pub helvetica: usize,
    pub zapf_dingbats: usize,
}

/// Normal appearance stream(s) of one widget.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Appearance {
    Single(usize),
    OnOff { on: usize, off: usize },
}

/// A widget whose object id and appearance are written but whose dictionary
/// waits for its place in the field tree.
pub(crate) struct PendingWidget<'a> {
    pub id: usize,
    pub page_id: usize,
    /// `[llx lly urx ury]` in PDF user space.
    pub rect: [f64; 4],
    pub field: &'a InteractiveField,
    pub appearance: Appearance,
}

/// Font size for a text-like widget, shared by `/DA` and the appearance.
fn font_size(field: &InteractiveField) -> f64 {
    match field.widget {
        FieldWidget::Text {
            multiline: true, ..
        } => MULTILINE_FONT_SIZE,
        _ => (field.rect.height * 0.6).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
    }
}

/// Write the appearance XObject(s) for a field.
pub(crate) fn write_appearance(
    builder: &mut PdfBuilder,
    field: &InteractiveField,
    fonts: FormFonts,
) -> Appearance {
    let (w, h) = (field.rect.width, field.rect.height);
    match &field.widget {
        FieldWidget::Text {
            multiline: true,
            value,
        } => {
            let content = multiline_text_stream(value.as_deref().unwrap_or(""), w, h);
            Appearance::Single(write_form_xobject(builder, w, h, fonts.helvetica, "Helv", &content))
        }
        FieldWidget::Text { value, .. } => {
            let content = single_line_stream(value.as_deref().unwrap_or(""), w, h, font_size(field));
            Appearance::Single(write_form_xobject(builder, w, h, fonts.helvetica, "Helv", &content))
        }
        FieldWidget::Dropdown { selected, .. } => {
            let content =
                single_line_stream(selected.as_deref().unwrap_or(""), w, h, font_size(field));
            Appearance::Single(write_form_xobject(builder, w, h, fonts.helvetica, "Helv", &content))
        }
        FieldWidget::Checkbox { .. } => {
            let on = write_form_xobject(
                builder,
                w,
                h,
                fonts.zapf_dingbats,
                "ZaDb",
                &check_mark_stream(w, h),
            );
            let off = write_form_xobject(builder, w, h, fonts.zapf_dingbats, "ZaDb", "");
            Appearance::OnOff { on, off }
        }
    }
}

fn write_form_xobject(
    builder: &mut PdfBuilder,
    w: f64,
    h: f64,
    font_id: usize,
    font_name: &str,
    content: &str,
) -> usize {
    let dict = format!(
        "/Type /XObject /Subtype /Form /BBox [0 0 {:.2} {:.2}] \
         /Resources << /Font << /{} {} 0 R >> >>",
        w, h, font_name, font_id
    );
    builder.push_stream(&dict, content.as_bytes())
}

fn single_line_stream(text: &str, w: f64, h: f64, size: f64) -> String {
    let mut s = String::from("/Tx BMC\nq\n");
    if !text.is_empty() {
        let baseline = ((h - size * 0.72) / 2.0).max(1.0);
        let _ = write!(
            s,
            "{:.2} {:.2} {:.2} {:.2} re W n\nBT\n/Helv {:.1} Tf\n0 g\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            1.0,
            1.0,
            (w - 2.0).max(0.0),
            (h - 2.0).max(0.0),
            size,
            PADDING,
            baseline,
            win_ansi_literal(text)
        );
    }
    s.push_str("Q\nEMC\n");
    s
}

fn multiline_text_stream(text: &str, w: f64, h: f64) -> String {
    let mut s = String::from("/Tx BMC\nq\n");
    if !text.is_empty() {
        let size = MULTILINE_FONT_SIZE;
        let leading = size * 1.15;
        let metrics = StandardFont::Helvetica.metrics();
        let lines = wrap_paragraphs(text, &metrics, size, (w - 2.0 * PADDING).max(1.0));
        let _ = write!(
            s,
            "{:.2} {:.2} {:.2} {:.2} re W n\nBT\n/Helv {:.1} Tf\n0 g\n{:.2} TL\n{:.2} {:.2} Td\n",
            1.0,
            1.0,
            (w - 2.0).max(0.0),
            (h - 2.0).max(0.0),
            size,
            leading,
            PADDING,
            h - PADDING - size * 0.8
        );
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                s.push_str("T*\n");
            }
            let _ = writeln!(s, "({}) Tj", win_ansi_literal(line));
        }
        s.push_str("ET\n");
    }
    s.push_str("Q\nEMC\n");
    s
}

/// ZapfDingbats "4" is a check mark, 0.846 em wide.
fn check_mark_stream(w: f64, h: f64) -> String {
    let size = w.min(h) * 0.8;
    format!(
        "q\n0 g\nBT\n/ZaDb {:.2} Tf\n{:.2} {:.2} Td\n(4) Tj\nET\nQ\n",
        size,
        (w - 0.846 * size) / 2.0,
        (h - 0.7 * size) / 2.0
    )
}

/// One level of the field name trie.
#[derive(Debug, Default)]
struct FieldNode<'a> {
    children: Vec<(&'a str, FieldNode<'a>)>,
    widget: Option<usize>,
}

impl<'a> FieldNode<'a> {
    fn insert(&mut self, segments: &[&'a str], widget: usize, name: &str) -> Result<(), ExportError> {
        let conflict = || {
            ExportError::Render(format!(
                "field name '{}' collides with another field's hierarchy",
                name
            ))
        };
        match segments.split_first() {
            None => {
                if self.widget.is_some() || !self.children.is_empty() {
                    return Err(conflict());
                }
                self.widget = Some(widget);
                Ok(())
            }
            Some((head, rest)) => {
                if self.widget.is_some() {
                    return Err(conflict());
                }
                let index = match self.children.iter().position(|(seg, _)| seg == head) {
                    Some(i) => i,
                    None => {
                        self.children.push((head, FieldNode::default()));
                        self.children.len() - 1
                    }
                };
                self.children[index].1.insert(rest, widget, name)
            }
        }
    }
}

/// Write the field hierarchy and the `/AcroForm` dictionary. Returns the
/// dictionary's object id, or `None` when there are no fields.
pub(crate) fn write_form(
    builder: &mut PdfBuilder,
    widgets: &[PendingWidget<'_>],
    fonts: FormFonts,
) -> Result<Option<usize>, ExportError> {
    if widgets.is_empty() {
        return Ok(None);
    }

    let mut root = FieldNode::default();
    for (i, widget) in widgets.iter().enumerate() {
        let segments: Vec<&str> = widget.field.name.split('.').collect();
        root.insert(&segments, i, &widget.field.name)?;
    }
    if root.widget.is_some() {
        return Err(ExportError::Render("field with an empty name".to_string()));
    }

    let top_level: Vec<usize> = root
        .children
        .iter()
        .map(|(seg, node)| write_node(builder, seg, node, None, widgets))
        .collect();

    let mut dict = String::from("<< /Fields [");
    for id in &top_level {
        let _ = write!(dict, " {} 0 R", id);
    }
    let _ = write!(
        dict,
        " ] /NeedAppearances true /DR << /Font << /Helv {} 0 R /ZaDb {} 0 R >> >> \
         /DA (/Helv 0 Tf 0 g) >>",
        fonts.helvetica, fonts.zapf_dingbats
    );
    Ok(Some(builder.push(dict.into_bytes())))
}

fn write_node(
    builder: &mut PdfBuilder,
    partial_name: &str,
    node: &FieldNode<'_>,
    parent: Option<usize>,
    widgets: &[PendingWidget<'_>],
) -> usize {
    if let Some(index) = node.widget {
        let widget = &widgets[index];
        builder.set(widget.id, widget_dict(widget, partial_name, parent).into_bytes());
        return widget.id;
    }

    let id = builder.reserve();
    let kids: Vec<usize> = node
        .children
        .iter()
        .map(|(seg, child)| write_node(builder, seg, child, Some(id), widgets))
        .collect();

    let mut dict = format!("<< /T {}", pdf_text_string(partial_name));
    if let Some(parent) = parent {
        let _ = write!(dict, " /Parent {} 0 R", parent);
    }
    dict.push_str(" /Kids [");
    for kid in kids {
        let _ = write!(dict, " {} 0 R", kid);
    }
    dict.push_str(" ] >>");
    builder.set(id, dict.into_bytes());
    id
}

fn widget_dict(widget: &PendingWidget<'_>, partial_name: &str, parent: Option<usize>) -> String {
    let field = widget.field;
    let [x1, y1, x2, y2] = widget.rect;
    let mut d = format!(
        "<< /Type /Annot /Subtype /Widget /T {} /Rect [{:.2} {:.2} {:.2} {:.2}] /P {} 0 R /F 4",
        pdf_text_string(partial_name),
        x1,
        y1,
        x2,
        y2,
        widget.page_id
    );
    if let Some(parent) = parent {
        let _ = write!(d, " /Parent {} 0 R", parent);
    }
    if let Some(tooltip) = &field.tooltip {
        let _ = write!(d, " /TU {}", pdf_text_string(tooltip));
    }

    match &field.widget {
        FieldWidget::Text { multiline, value } => {
            let _ = write!(d, " /FT /Tx /DA (/Helv {:.1} Tf 0 g)", font_size(field));
            if *multiline {
                let _ = write!(d, " /Ff {}", FF_MULTILINE);
            }
            if let Some(value) = value {
                let _ = write!(d, " /V {}", pdf_text_string(value));
            }
        }
        FieldWidget::Dropdown { options, selected } => {
            let _ = write!(
                d,
                " /FT /Ch /Ff {} /DA (/Helv {:.1} Tf 0 g) /Opt [",
                FF_COMBO,
                font_size(field)
            );
            for option in options {
                let _ = write!(d, " {}", pdf_text_string(option));
            }
            d.push_str(" ]");
            if let Some(selected) = selected {
                let _ = write!(d, " /V {}", pdf_text_string(selected));
            }
        }
        FieldWidget::Checkbox { checked } => {
            let state = if *checked { "Yes" } else { "Off" };
            let _ = write!(
                d,
                " /FT /Btn /DA (/ZaDb 0 Tf 0 g) /MK << /CA (4) >> /V /{} /AS /{}",
                state, state
            );
        }
    }

    match widget.appearance {
        Appearance::Single(id) => {
            let _ = write!(d, " /AP << /N {} 0 R >>", id);
        }
        Appearance::OnOff { on, off } => {
            let _ = write!(d, " /AP << /N << /Yes {} 0 R /Off {} 0 R >> >>", on, off);
        }
    }
    d.push_str(" >>");
    d
}
