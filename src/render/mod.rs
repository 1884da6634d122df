//! # Content Rendering
//!
//! Walks sections and fields, drawing them through the page cursor. Every
//! renderer follows the same contract: measure, `ensure_space`, draw at the
//! cursor, `advance`. Fillable widgets are pushed onto whatever page the
//! cursor is on when they are drawn.
//!
//! The [`RenderContext`] owns all per-export state: the cursor, the field
//! namer and the current horizontal band (nested blocks indent it).

pub mod field;
pub mod section;
pub mod structured;

use crate::config::PageConfig;
use crate::error::ExportError;
use crate::font::StandardFont;
use crate::form::{FieldNamer, FieldPath, FieldWidget, InteractiveField};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, PageCursor, Rect, TextLine};
use crate::model::Field;
use crate::style::{Color, Theme};
use crate::text::wrap_paragraphs;

/// Gap between a field's label and its widget.
pub(crate) const LABEL_GAP: f64 = 3.0;

/// Mutable state threaded through one export's content pass.
pub struct RenderContext<'a> {
    pub cursor: PageCursor,
    pub theme: &'a Theme,
    namer: FieldNamer,
    x: f64,
    width: f64,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &PageConfig, theme: &'a Theme, namer: FieldNamer) -> Self {
        Self {
            cursor: PageCursor::new(config),
            theme,
            namer,
            x: config.content_left(),
            width: config.content_width(),
        }
    }

    /// Left edge of the current band.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Width of the current band.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Run `f` with the band shifted right by `dx`.
    pub fn indented<R>(&mut self, dx: f64, f: impl FnOnce(&mut Self) -> R) -> R {
        let (x, width) = (self.x, self.width);
        self.x += dx;
        self.width = (width - dx).max(1.0);
        let result = f(self);
        self.x = x;
        self.width = width;
        result
    }

    pub fn issued_fields(&self) -> usize {
        self.namer.issued_count()
    }

    pub fn into_pages(self) -> Vec<LayoutPage> {
        self.cursor.into_pages()
    }

    /// Height of `text` wrapped to the band at `size`.
    pub fn measure_paragraphs(&self, text: &str, font: StandardFont, size: f64) -> f64 {
        let lines = wrap_paragraphs(text, &font.metrics(), size, self.width);
        lines.len() as f64 * self.theme.leading(size)
    }

    /// Draw wrapped text line by line, breaking pages between lines.
    pub fn paragraphs(&mut self, text: &str, font: StandardFont, size: f64, color: Color) {
        let leading = self.theme.leading(size);
        for line in wrap_paragraphs(text, &font.metrics(), size, self.width) {
            self.cursor.ensure_space(leading);
            let y = self.cursor.y();
            self.push_text(self.x, y, &line, font, size, color);
            self.cursor.advance(leading);
        }
    }

    /// Push a single line of text whose line box starts at `y`. Does not move
    /// the cursor.
    pub fn push_text(&mut self, x: f64, y: f64, text: &str, font: StandardFont, size: f64, color: Color) {
        let metrics = font.metrics();
        let leading = self.theme.leading(size);
        let baseline = y + (leading - size) / 2.0 + metrics.ascent(size);
        self.cursor.push(LayoutElement {
            x,
            y,
            width: metrics.measure_string(text, size),
            height: leading,
            draw: DrawCommand::Text {
                lines: vec![TextLine {
                    x,
                    y: baseline,
                    text: text.to_string(),
                    font,
                    font_size: size,
                }],
                color,
            },
        });
    }

    pub fn push_rect(&mut self, rect: Rect, fill: Option<Color>, stroke: Option<Color>, radius: f64) {
        self.cursor.push(LayoutElement {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            draw: DrawCommand::Rect {
                fill,
                stroke,
                stroke_width: 0.75,
                radius,
            },
        });
    }

    /// A horizontal rule across the band at the cursor.
    pub fn rule(&mut self, color: Color) {
        let y = self.cursor.y();
        self.cursor.push(LayoutElement {
            x: self.x,
            y,
            width: self.width,
            height: 0.0,
            draw: DrawCommand::Line {
                color,
                line_width: 0.75,
            },
        });
    }

    /// Height of a field's label block.
    pub fn label_height(&self, field: &Field) -> f64 {
        if field.label.trim().is_empty() {
            return 0.0;
        }
        self.measure_paragraphs(&label_text(field), StandardFont::HelveticaBold, self.theme.label_size)
            + LABEL_GAP
    }

    /// Bold label with a required marker.
    pub fn label(&mut self, field: &Field) {
        if field.label.trim().is_empty() {
            return;
        }
        let size = self.theme.label_size;
        let font = StandardFont::HelveticaBold;
        let leading = self.theme.leading(size);
        let lines = wrap_paragraphs(&label_text(field), &font.metrics(), size, self.width);
        let last = lines.len().saturating_sub(1);
        for (i, line) in lines.iter().enumerate() {
            self.cursor.ensure_space(leading);
            let y = self.cursor.y();
            match line.strip_suffix(" *") {
                Some(text) if i == last && field.required => {
                    self.push_text(self.x, y, text, font, size, self.theme.text);
                    let marker_x = self.x + font.metrics().measure_string(text, size);
                    self.push_text(marker_x, y, " *", font, size, self.theme.required);
                }
                _ => self.push_text(self.x, y, line, font, size, self.theme.text),
            }
            self.cursor.advance(leading);
        }
        self.cursor.advance(LABEL_GAP);
    }

    /// Draw a widget box at `rect` and register its interactive field.
    /// The cursor does not move.
    pub fn widget(
        &mut self,
        rect: Rect,
        path: &FieldPath,
        widget: FieldWidget,
        tooltip: Option<&str>,
    ) -> Result<(), ExportError> {
        let radius = match widget {
            FieldWidget::Checkbox { .. } => 1.5,
            _ => 2.0,
        };
        self.push_rect(rect, Some(Color::WHITE), Some(self.theme.border), radius);
        let name = self.namer.issue(path)?;
        self.cursor.push_field(InteractiveField {
            name,
            rect,
            widget,
            tooltip: tooltip.map(str::to_string),
        });
        Ok(())
    }

    /// A full-width widget of `height` at the cursor; the cursor advances
    /// past it.
    pub fn widget_row(
        &mut self,
        height: f64,
        path: &FieldPath,
        widget: FieldWidget,
        tooltip: Option<&str>,
    ) -> Result<(), ExportError> {
        self.cursor.ensure_space(height);
        let rect = Rect::new(self.x, self.cursor.y(), self.width, height);
        self.widget(rect, path, widget, tooltip)?;
        self.cursor.advance(height);
        Ok(())
    }

    /// A multiline text box sized for `rows` lines.
    pub fn text_area(
        &mut self,
        rows: u32,
        path: &FieldPath,
        value: Option<String>,
        tooltip: Option<&str>,
    ) -> Result<(), ExportError> {
        let height = textarea_height(self.theme, rows);
        self.widget_row(
            height,
            path,
            FieldWidget::Text {
                multiline: true,
                value,
            },
            tooltip,
        )
    }
}

pub(crate) fn textarea_height(theme: &Theme, rows: u32) -> f64 {
    rows.max(1) as f64 * theme.textarea_row_height + 6.0
}

fn label_text(field: &Field) -> String {
    if field.required {
        format!("{} *", field.label.trim())
    } else {
        field.label.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(label: &str, required: bool) -> Field {
        serde_json::from_value(serde_json::json!({
            "id": "f", "type": "text", "label": label, "required": required
        }))
        .unwrap()
    }

    #[test]
    fn indented_restores_band() {
        let theme = Theme::default();
        let config = PageConfig::default();
        let mut ctx = RenderContext::new(&config, &theme, FieldNamer::new());
        let x0 = ctx.x();
        let inner = ctx.indented(20.0, |ctx| ctx.x());
        assert_eq!(inner, x0 + 20.0);
        assert_eq!(ctx.x(), x0);
    }

    #[test]
    fn required_label_draws_marker_separately() {
        let theme = Theme::default();
        let config = PageConfig::default();
        let mut ctx = RenderContext::new(&config, &theme, FieldNamer::new());
        ctx.label(&field("Name", true));
        let pages = ctx.into_pages();
        let texts: Vec<&str> = pages[0].text_lines().collect();
        assert_eq!(texts, vec!["Name", " *"]);
    }

    #[test]
    fn widget_row_registers_named_field() {
        let theme = Theme::default();
        let config = PageConfig::default();
        let mut ctx = RenderContext::new(&config, &theme, FieldNamer::new());
        let path = FieldPath::root("s").child("f");
        ctx.widget_row(
            20.0,
            &path,
            FieldWidget::Text {
                multiline: false,
                value: None,
            },
            Some("hint"),
        )
        .unwrap();
        let y = ctx.cursor.y();
        let pages = ctx.into_pages();
        assert_eq!(pages[0].fields.len(), 1);
        assert_eq!(pages[0].fields[0].name, "s.f.0");
        assert_eq!(pages[0].fields[0].tooltip.as_deref(), Some("hint"));
        assert_eq!(y, config.content_top() + 20.0);
    }

    #[test]
    fn label_height_matches_drawn_height() {
        let theme = Theme::default();
        let config = PageConfig::default();
        let mut ctx = RenderContext::new(&config, &theme, FieldNamer::new());
        let f = field("How often did you notice the thought during the week?", false);
        let expected = ctx.label_height(&f);
        let start = ctx.cursor.y();
        ctx.label(&f);
        assert!((ctx.cursor.y() - start - expected).abs() < 1e-9);
    }
}
