//! Section rendering: heading, hint, description, then the fields.

use super::field::render_fields;
use super::{RenderContext, LABEL_GAP};
use crate::error::ExportError;
use crate::font::StandardFont;
use crate::form::FieldPath;
use crate::model::{Answer, Section};

/// The heading text, numbered when the section is a step.
pub fn section_heading(section: &Section) -> String {
    match section.step {
        Some(step) => format!("Step {} \u{00B7} {}", step, section.heading()),
        None => section.heading().to_string(),
    }
}

/// Render a section against the answers for its fields. `prefix` is the
/// entry path in a multi-entry export.
pub fn render_section(
    ctx: &mut RenderContext<'_>,
    section: &Section,
    prefix: Option<&FieldPath>,
    answers: Answer<'_>,
) -> Result<(), ExportError> {
    let theme = ctx.theme;
    let path = match prefix {
        Some(prefix) => prefix.child(&section.id),
        None => FieldPath::root(&section.id),
    };

    // Keep the heading together with the start of the first field.
    let heading = section_heading(section);
    let heading_height =
        ctx.measure_paragraphs(&heading, StandardFont::HelveticaBold, theme.heading_size);
    let follow = theme.leading(theme.label_size) + theme.input_height;
    if heading_height + follow <= ctx.cursor.config().content_height() {
        ctx.cursor.ensure_space(heading_height + follow);
    }

    ctx.paragraphs(&heading, StandardFont::HelveticaBold, theme.heading_size, theme.accent);
    ctx.cursor.ensure_space(LABEL_GAP * 2.0);
    ctx.rule(theme.accent.lighten(0.6));
    ctx.cursor.advance(LABEL_GAP * 2.0);

    if let Some(hint) = section.hint.as_deref().filter(|h| !h.trim().is_empty()) {
        ctx.paragraphs(hint, StandardFont::HelveticaOblique, theme.small_size, theme.muted);
        ctx.cursor.advance(LABEL_GAP);
    }
    if let Some(description) = section.description.as_deref().filter(|d| !d.trim().is_empty()) {
        ctx.paragraphs(description, StandardFont::Helvetica, theme.body_size, theme.text);
        ctx.cursor.advance(LABEL_GAP * 2.0);
    }

    render_fields(ctx, &section.fields, &path, answers)?;
    ctx.cursor.advance(theme.section_gap);
    Ok(())
}
