//! # Document Assembly
//!
//! Orchestrates one export:
//!
//! ```text
//! embed logo → front matter → [entries | sections] → chrome on every page
//! ```
//!
//! Content is laid out first; the running header and footer are painted in
//! a second pass once the page count is final.

use chrono::Utc;
use log::debug;
use serde_json::Value;

use crate::chrome::{Chrome, LogoPlacement};
use crate::config::ExportOptions;
use crate::error::ExportError;
use crate::font::StandardFont;
use crate::form::{FieldNamer, FieldPath, InteractiveField};
use crate::image_loader::{load_image, LoadedImage};
use crate::layout::{LayoutPage, Rect};
use crate::model::values::entries;
use crate::model::{Answer, ExportRequest, Section};
use crate::pdf::DocumentInfo;
use crate::render::section::render_section;
use crate::render::RenderContext;
use crate::text::wrap_paragraphs;

const PANEL_PADDING: f64 = 8.0;

/// A laid-out document, ready for serialization.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub pages: Vec<LayoutPage>,
    pub images: Vec<LoadedImage>,
    pub info: DocumentInfo,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every interactive field, in page order.
    pub fn fields(&self) -> impl Iterator<Item = &InteractiveField> {
        self.pages.iter().flat_map(|p| p.fields.iter())
    }

    /// The first field whose name, minus its disambiguator, is `path`.
    pub fn field_by_path(&self, path: &str) -> Option<&InteractiveField> {
        self.fields().find(|f| f.path() == path)
    }

    /// All fields whose path is `path` or lies beneath it.
    pub fn fields_under<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a InteractiveField> {
        self.fields().filter(move |f| {
            let p = f.path();
            p == path || (p.starts_with(path) && p[path.len()..].starts_with('.'))
        })
    }
}

/// Lay out a request.
pub fn assemble(
    request: &ExportRequest,
    options: &ExportOptions,
) -> Result<RenderedDocument, ExportError> {
    let theme = &options.theme;
    let config = &options.page;

    // Resources
    let mut images = Vec::new();
    let mut logo = None;
    if request.show_branding {
        if let Some(src) = options.branding.logo.as_deref() {
            let image = load_image(src).map_err(ExportError::Resource)?;
            let height = options.branding.logo_height;
            logo = Some(LogoPlacement {
                image_index: images.len(),
                width: height * image.aspect_ratio(),
                height,
            });
            images.push(image);
        }
    }

    let namer = FieldNamer::for_schema(&request.schema);
    let mut ctx = RenderContext::new(config, theme, namer);

    draw_front_matter(&mut ctx, request);

    let schema = &request.schema;
    let values = request.values.as_ref();
    match entries(values).filter(|_| schema.repeatable) {
        Some(stored) if !stored.is_empty() => {
            debug!("rendering {} stored entries", stored.len());
            for (i, entry) in stored.iter().enumerate() {
                draw_entry(&mut ctx, &schema.sections, i + 1, entry)?;
            }
        }
        Some(_) => {
            debug!("entry container is empty; rendering a blank form");
            draw_sections(&mut ctx, &schema.sections, None, Answer::empty())?;
        }
        None => draw_sections(&mut ctx, &schema.sections, None, Answer::new(values))?,
    }

    let field_count = ctx.issued_fields();
    let mut pages = ctx.into_pages();

    // Second pass: the page total is now known.
    let chrome = Chrome {
        title: &request.title,
        brand: request
            .show_branding
            .then_some(options.branding.name.as_str()),
        logo,
        generated_at: options.generated_at.unwrap_or_else(Utc::now),
        config,
        theme,
    };
    chrome.paint(&mut pages);

    debug!(
        "laid out '{}': {} pages, {} fields",
        request.title,
        pages.len(),
        field_count
    );

    Ok(RenderedDocument {
        pages,
        images,
        info: DocumentInfo {
            title: Some(request.title.clone()).filter(|t| !t.is_empty()),
            subject: request.description.clone(),
            created: Some(chrome.generated_at),
        },
    })
}

fn draw_sections(
    ctx: &mut RenderContext<'_>,
    sections: &[Section],
    prefix: Option<&FieldPath>,
    answers: Answer<'_>,
) -> Result<(), ExportError> {
    for section in sections {
        render_section(ctx, section, prefix, answers)?;
    }
    Ok(())
}

/// One stored entry: an "Entry N" heading, a separator, then the sections.
fn draw_entry(
    ctx: &mut RenderContext<'_>,
    sections: &[Section],
    number: usize,
    entry: &Value,
) -> Result<(), ExportError> {
    let theme = ctx.theme;
    let size = theme.heading_size + 1.0;
    let heading_height = theme.leading(size) + 8.0;
    ctx.cursor.ensure_space(heading_height + theme.leading(theme.heading_size) + theme.input_height);

    ctx.paragraphs(
        &format!("Entry {}", number),
        StandardFont::HelveticaBold,
        size,
        theme.text,
    );
    ctx.cursor.advance(3.0);
    ctx.rule(theme.text);
    ctx.cursor.advance(5.0);

    let prefix = FieldPath::root(&format!("entry{}", number));
    draw_sections(ctx, sections, Some(&prefix), Answer::new(Some(entry)))
}

/// Title, description and the instructions panel.
fn draw_front_matter(ctx: &mut RenderContext<'_>, request: &ExportRequest) {
    let theme = ctx.theme;
    if !request.title.trim().is_empty() {
        ctx.paragraphs(
            request.title.trim(),
            StandardFont::HelveticaBold,
            theme.title_size,
            theme.text,
        );
        ctx.cursor.advance(6.0);
    }
    if let Some(description) = request.description.as_deref().filter(|d| !d.trim().is_empty()) {
        ctx.paragraphs(description, StandardFont::Helvetica, theme.body_size, theme.muted);
        ctx.cursor.advance(8.0);
    }
    if let Some(instructions) = request.instructions.as_deref().filter(|i| !i.trim().is_empty()) {
        draw_instructions(ctx, instructions);
    }
    ctx.cursor.advance(theme.section_gap / 2.0);
}

/// Instructions in a tinted panel. When the panel would not fit on one page
/// the text is drawn unboxed so it can flow across pages.
fn draw_instructions(ctx: &mut RenderContext<'_>, text: &str) {
    let theme = ctx.theme;
    let heading_size = theme.label_size;
    let size = theme.body_size;
    let inner_width = (ctx.width() - 2.0 * PANEL_PADDING).max(1.0);
    let lines = wrap_paragraphs(text, &StandardFont::Helvetica.metrics(), size, inner_width);
    let height = 2.0 * PANEL_PADDING
        + theme.leading(heading_size)
        + lines.len() as f64 * theme.leading(size);

    if height > ctx.cursor.config().content_height() {
        ctx.paragraphs("Instructions", StandardFont::HelveticaBold, heading_size, theme.accent);
        ctx.paragraphs(text, StandardFont::Helvetica, size, theme.text);
        ctx.cursor.advance(8.0);
        return;
    }

    ctx.cursor.ensure_space(height);
    let top = ctx.cursor.y();
    ctx.push_rect(
        Rect::new(ctx.x(), top, ctx.width(), height),
        Some(theme.panel),
        Some(theme.accent.lighten(0.6)),
        3.0,
    );
    ctx.cursor.advance(PANEL_PADDING);
    ctx.indented(PANEL_PADDING, |ctx| {
        ctx.paragraphs("Instructions", StandardFont::HelveticaBold, heading_size, theme.accent);
        for line in &lines {
            let y = ctx.cursor.y();
            ctx.push_text(ctx.x(), y, line, StandardFont::Helvetica, size, theme.text);
            ctx.cursor.advance(theme.leading(size));
        }
    });
    ctx.cursor.advance(PANEL_PADDING + 8.0);
}
