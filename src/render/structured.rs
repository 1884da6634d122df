//! Structured field kinds: tables, safety plans, decision trees,
//! formulations and records. Each nests sub-fields that go back through
//! [`render_field`](super::field::render_field), so a sub-field looks exactly
//! like a top-level field of its kind.

use log::{debug, warn};

use super::field::{keep_with_label, render_fields};
use super::{textarea_height, RenderContext, LABEL_GAP};
use crate::error::ExportError;
use crate::font::StandardFont;
use crate::form::{FieldPath, FieldWidget};
use crate::layout::Rect;
use crate::model::{
    Answer, DecisionBranch, DecisionTree, Field, Formulation, PlanStep, RecordGroup, TableSpec,
};
use crate::style::Color;
use crate::text::truncate_text;

/// Rows of a free-text box standing in for a container without sub-fields.
const FALLBACK_ROWS: u32 = 3;
const BADGE_SIZE: f64 = 16.0;
const SWATCH_SIZE: f64 = 10.0;
const CELL_PADDING: f64 = 4.0;

// ─── Tables ─────────────────────────────────────────────────────

/// Table and hierarchy fields. The header row repeats at the top of every
/// page the table continues onto.
pub fn render_table(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    spec: &TableSpec,
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    let theme = ctx.theme;
    let row_height = theme.table_row_height;
    let header_height = theme.leading(theme.small_size) + 2.0 * CELL_PADDING;

    keep_with_label(ctx, field, header_height + row_height);
    ctx.label(field);

    if spec.columns.is_empty() {
        debug!("table '{}' declares no columns", path);
        ctx.paragraphs(
            "No columns defined.",
            StandardFont::HelveticaOblique,
            theme.small_size,
            theme.muted,
        );
        ctx.cursor.advance(LABEL_GAP);
        return ctx.text_area(FALLBACK_ROWS, path, answer.text(), field.placeholder.as_deref());
    }

    let widths = column_widths(spec, ctx.width());
    let stored = answer.rows();
    let row_count = spec.min_rows.max(stored.len());

    ctx.cursor.ensure_space(header_height + row_height);
    draw_table_header(ctx, spec, &widths, header_height);

    for i in 0..row_count {
        if ctx.cursor.ensure_space(row_height) {
            draw_table_header(ctx, spec, &widths, header_height);
        }
        let row_answer = Answer::new(stored.get(i));
        let row_path = path.child(&format!("row{}", i + 1));
        let y = ctx.cursor.y();
        let mut x = ctx.x();
        for (column, width) in spec.columns.iter().zip(&widths) {
            ctx.widget(
                Rect::new(x, y, *width, row_height),
                &row_path.child(&column.id),
                FieldWidget::Text {
                    multiline: false,
                    value: row_answer.get(&column.id).text(),
                },
                None,
            )?;
            x += width;
        }
        ctx.cursor.advance(row_height);
    }
    Ok(())
}

/// Column widths across `total`, proportional to declared weights. Columns
/// without a weight count as 1.
fn column_widths(spec: &TableSpec, total: f64) -> Vec<f64> {
    let weights: Vec<f64> = spec
        .columns
        .iter()
        .map(|c| c.width.filter(|w| w.is_finite() && *w > 0.0).unwrap_or(1.0))
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| total * w / sum).collect()
}

fn draw_table_header(ctx: &mut RenderContext<'_>, spec: &TableSpec, widths: &[f64], height: f64) {
    let theme = ctx.theme;
    let size = theme.small_size;
    let font = StandardFont::HelveticaBold;
    let y = ctx.cursor.y();
    ctx.push_rect(
        Rect::new(ctx.x(), y, ctx.width(), height),
        Some(theme.panel),
        Some(theme.border),
        0.0,
    );
    let mut x = ctx.x();
    for (column, width) in spec.columns.iter().zip(widths) {
        let label = truncate_text(
            &column.label,
            &font.metrics(),
            size,
            (width - 2.0 * CELL_PADDING).max(0.0),
        );
        ctx.push_text(x + CELL_PADDING, y + CELL_PADDING, &label, font, size, theme.text);
        x += width;
    }
    ctx.cursor.advance(height);
}

// ─── Safety plan ────────────────────────────────────────────────

pub fn render_safety_plan(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    steps: &[PlanStep],
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    let theme = ctx.theme;
    if steps.is_empty() {
        return fallback_box(ctx, field, path, answer);
    }
    keep_with_label(ctx, field, BADGE_SIZE);
    ctx.label(field);

    for (i, step) in steps.iter().enumerate() {
        if i > 0 {
            ctx.cursor.advance(theme.field_gap);
        }
        let step_answer = answer.get(&step.id);
        let step_path = path.child(&step.id);

        let title_height = ctx.indented(BADGE_SIZE + 8.0, |ctx| {
            ctx.measure_paragraphs(&step.label, StandardFont::HelveticaBold, theme.label_size)
        });
        let head = title_height.max(BADGE_SIZE) + LABEL_GAP;
        if head + theme.input_height <= ctx.cursor.config().content_height() {
            ctx.cursor.ensure_space(head + theme.input_height);
        }
        ctx.cursor.ensure_space(head);

        let y = ctx.cursor.y();
        let badge_color = if step.highlight {
            theme.highlight
        } else {
            theme.accent
        };
        ctx.push_rect(
            Rect::new(ctx.x(), y, BADGE_SIZE, BADGE_SIZE),
            Some(badge_color),
            None,
            BADGE_SIZE / 2.0,
        );
        let number = (i + 1).to_string();
        let font = StandardFont::HelveticaBold;
        let size = theme.small_size;
        let number_x = ctx.x() + (BADGE_SIZE - font.metrics().measure_string(&number, size)) / 2.0;
        let number_y = y + (BADGE_SIZE - theme.leading(size)) / 2.0;
        ctx.push_text(number_x, number_y, &number, font, size, Color::WHITE);

        let label_color = if step.highlight { theme.highlight } else { theme.text };
        let start = ctx.cursor.y();
        ctx.indented(BADGE_SIZE + 8.0, |ctx| {
            ctx.paragraphs(&step.label, StandardFont::HelveticaBold, theme.label_size, label_color);
        });
        let drawn = ctx.cursor.y() - start;
        ctx.cursor.advance((BADGE_SIZE - drawn).max(0.0) + LABEL_GAP);

        ctx.indented(BADGE_SIZE + 8.0, |ctx| -> Result<(), ExportError> {
            if let Some(hint) = step.hint.as_deref().filter(|h| !h.trim().is_empty()) {
                ctx.paragraphs(hint, StandardFont::HelveticaOblique, theme.small_size, theme.muted);
                ctx.cursor.advance(LABEL_GAP);
            }
            if step.fields.is_empty() {
                ctx.text_area(FALLBACK_ROWS, &step_path, step_answer.text(), None)
            } else {
                render_fields(ctx, &step.fields, &step_path, step_answer)
            }
        })?;
    }
    Ok(())
}

// ─── Decision tree ──────────────────────────────────────────────

/// Both branches are always drawn in full; a stored choice between them
/// does not affect layout.
pub fn render_decision_tree(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    tree: &DecisionTree,
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    let theme = ctx.theme;
    let question_height =
        ctx.measure_paragraphs(&tree.question, StandardFont::Helvetica, theme.body_size);
    keep_with_label(ctx, field, question_height);
    ctx.label(field);
    if !tree.question.trim().is_empty() {
        ctx.paragraphs(&tree.question, StandardFont::Helvetica, theme.body_size, theme.text);
        ctx.cursor.advance(LABEL_GAP * 2.0);
    }

    for (key, branch) in [("yes", &tree.yes), ("no", &tree.no)] {
        render_branch(ctx, key, branch, path, answer.get(key))?;
        ctx.cursor.advance(theme.field_gap);
    }
    Ok(())
}

fn render_branch(
    ctx: &mut RenderContext<'_>,
    key: &str,
    branch: &DecisionBranch,
    path: &FieldPath,
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    let theme = ctx.theme;
    let size = theme.label_size;
    let font = StandardFont::HelveticaBold;
    let pill_height = theme.leading(size) + 4.0;
    let label = match branch.label.trim() {
        "" if key == "yes" => "Yes",
        "" => "No",
        label => label,
    };
    let pill_width = font.metrics().measure_string(label, size) + 14.0;

    ctx.cursor.ensure_space(pill_height + theme.input_height);
    let y = ctx.cursor.y();
    ctx.push_rect(
        Rect::new(ctx.x(), y, pill_width.min(ctx.width()), pill_height),
        Some(theme.accent.lighten(0.85)),
        Some(theme.accent),
        pill_height / 2.0,
    );
    ctx.push_text(ctx.x() + 7.0, y + 2.0, label, font, size, theme.accent);
    ctx.cursor.advance(pill_height + LABEL_GAP * 2.0);

    let branch_path = path.child(key);
    ctx.indented(theme.indent, |ctx| -> Result<(), ExportError> {
        if branch.fields.is_empty() {
            ctx.text_area(FALLBACK_ROWS, &branch_path, answer.text(), None)?;
        } else {
            render_fields(ctx, &branch.fields, &branch_path, answer)?;
        }
        if let Some(outcome) = branch.outcome.as_deref().filter(|o| !o.trim().is_empty()) {
            ctx.cursor.advance(LABEL_GAP * 2.0);
            ctx.paragraphs(
                &format!("Outcome: {}", outcome),
                StandardFont::HelveticaOblique,
                theme.body_size,
                theme.muted,
            );
        }
        Ok(())
    })
}

// ─── Formulation ────────────────────────────────────────────────

/// The node graph is flattened into a vertical list in declared order.
pub fn render_formulation(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    formulation: &Formulation,
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    if formulation.nodes.is_empty() && formulation.item_template.is_none() {
        return fallback_box(ctx, field, path, answer);
    }
    let theme = ctx.theme;
    keep_with_label(ctx, field, theme.leading(theme.label_size) + theme.input_height);
    ctx.label(field);

    let nodes_path = path.child("nodes");
    let node_answers = answer.get("nodes");
    for (i, node) in formulation.nodes.iter().enumerate() {
        if i > 0 {
            ctx.cursor.advance(theme.field_gap);
        }
        let size = theme.label_size;
        let leading = theme.leading(size);
        ctx.cursor.ensure_space(leading + theme.input_height);

        let y = ctx.cursor.y();
        let swatch = node.color.as_deref().and_then(|raw| {
            let parsed = Color::parse_hex(raw);
            if parsed.is_none() {
                warn!("formulation node '{}': ignoring unparsable colour '{}'", node.id, raw);
            }
            parsed
        });
        let text_x = match swatch {
            Some(color) => {
                ctx.push_rect(
                    Rect::new(ctx.x(), y + (leading - SWATCH_SIZE) / 2.0, SWATCH_SIZE, SWATCH_SIZE),
                    Some(color),
                    None,
                    2.0,
                );
                ctx.x() + SWATCH_SIZE + 6.0
            }
            None => ctx.x(),
        };
        let label = truncate_text(
            &node.label,
            &StandardFont::HelveticaBold.metrics(),
            size,
            ctx.x() + ctx.width() - text_x,
        );
        ctx.push_text(text_x, y, &label, StandardFont::HelveticaBold, size, theme.text);
        ctx.cursor.advance(leading + LABEL_GAP);

        let node_path = nodes_path.child(&node.id);
        let node_answer = node_answers.get(&node.id);
        ctx.indented(theme.indent, |ctx| -> Result<(), ExportError> {
            if let Some(description) = node.description.as_deref().filter(|d| !d.trim().is_empty()) {
                ctx.paragraphs(description, StandardFont::Helvetica, theme.small_size, theme.muted);
                ctx.cursor.advance(LABEL_GAP);
            }
            if node.fields.is_empty() {
                ctx.text_area(FALLBACK_ROWS, &node_path, node_answer.text(), None)
            } else {
                render_fields(ctx, &node.fields, &node_path, node_answer)
            }
        })?;
    }

    if let Some(template) = &formulation.item_template {
        if !formulation.nodes.is_empty() {
            ctx.cursor.advance(theme.field_gap);
        }
        let heading = if template.label.trim().is_empty() {
            "Item 1".to_string()
        } else {
            format!("{} 1", template.label.trim())
        };
        let leading = theme.leading(theme.label_size);
        ctx.cursor.ensure_space(leading + theme.input_height);
        let y = ctx.cursor.y();
        ctx.push_text(ctx.x(), y, &heading, StandardFont::HelveticaBold, theme.label_size, theme.text);
        ctx.cursor.advance(leading + LABEL_GAP);

        let item_path = path.child("item1");
        let item_answer = answer.get("items").at(0);
        ctx.indented(theme.indent, |ctx| {
            render_fields(ctx, &template.fields, &item_path, item_answer)
        })?;
        ctx.cursor.advance(LABEL_GAP * 2.0);
        ctx.paragraphs(
            "Further items can be added in the interactive version.",
            StandardFont::HelveticaOblique,
            theme.small_size,
            theme.muted,
        );
    }
    Ok(())
}

// ─── Record ─────────────────────────────────────────────────────

/// One block per stored record, or a single blank block when none are
/// stored. Blocks are numbered only when there is more than one.
pub fn render_record(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    groups: &[RecordGroup],
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    if groups.is_empty() {
        return fallback_box(ctx, field, path, answer);
    }
    let theme = ctx.theme;
    keep_with_label(ctx, field, theme.leading(theme.label_size) + theme.input_height);
    ctx.label(field);

    let stored = if answer.items().is_empty() {
        answer.get("records").items()
    } else {
        answer.items()
    };
    let count = stored.len().max(1);

    for i in 0..count {
        let record = Answer::new(stored.get(i));
        let record_path = path.child(&format!("rec{}", i + 1));
        if i > 0 {
            ctx.cursor.advance(theme.field_gap);
            ctx.cursor.ensure_space(theme.field_gap);
            ctx.rule(theme.border);
            ctx.cursor.advance(theme.field_gap);
        }
        if count > 1 {
            let leading = theme.leading(theme.label_size);
            ctx.cursor.ensure_space(leading + theme.input_height);
            let y = ctx.cursor.y();
            ctx.push_text(
                ctx.x(),
                y,
                &format!("Record {}", i + 1),
                StandardFont::HelveticaBold,
                theme.label_size,
                theme.accent,
            );
            ctx.cursor.advance(leading + LABEL_GAP);
        }

        for (g, group) in groups.iter().enumerate() {
            if g > 0 {
                ctx.cursor.advance(theme.field_gap);
            }
            let size = theme.small_size;
            let leading = theme.leading(size);
            ctx.cursor.ensure_space(leading + theme.input_height);
            let y = ctx.cursor.y();
            let title = group.label.trim().to_uppercase();
            ctx.push_text(ctx.x(), y, &title, StandardFont::HelveticaBold, size, theme.muted);
            ctx.cursor.advance(leading + LABEL_GAP);

            let group_path = record_path.child(&group.id);
            let group_answer = record.get(&group.id);
            ctx.indented(theme.indent / 2.0, |ctx| {
                if group.fields.is_empty() {
                    ctx.text_area(FALLBACK_ROWS, &group_path, group_answer.text(), None)
                } else {
                    render_fields(ctx, &group.fields, &group_path, group_answer)
                }
            })?;
        }
    }
    Ok(())
}

/// A labelled free-text box at the field's own path, for a container that
/// declares nothing to render inside it.
fn fallback_box(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    debug!("{} field '{}' is empty; drawing a free-text box", field.kind.name(), path);
    let height = textarea_height(ctx.theme, FALLBACK_ROWS);
    keep_with_label(ctx, field, height);
    ctx.label(field);
    ctx.text_area(FALLBACK_ROWS, path, answer.text(), field.placeholder.as_deref())
}
