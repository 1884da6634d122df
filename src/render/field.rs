//! Field renderer dispatch and the simple (single-widget) kinds.

use log::trace;

use super::{structured, textarea_height, RenderContext, LABEL_GAP};
use crate::error::ExportError;
use crate::font::StandardFont;
use crate::form::{FieldPath, FieldWidget};
use crate::layout::Rect;
use crate::model::values::format_number;
use crate::model::{Answer, ChoiceOption, Field, FieldKind, LikertScale};

const DEFAULT_TEXTAREA_ROWS: u32 = 4;

/// Render one field under `parent` with its stored answer.
pub fn render_field(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    parent: &FieldPath,
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    let path = parent.child(&field.id);
    trace!(
        "rendering {} field '{}'{}",
        field.kind.name(),
        path,
        if answer.is_empty() { " (blank)" } else { "" }
    );
    let tooltip = field.placeholder.as_deref();
    let theme = ctx.theme;

    match &field.kind {
        FieldKind::Text | FieldKind::Date | FieldKind::Time => {
            keep_with_label(ctx, field, theme.input_height);
            ctx.label(field);
            ctx.widget_row(theme.input_height, &path, single_line(answer), tooltip)
        }
        FieldKind::Number { unit } => render_number(ctx, field, &path, unit.as_deref(), answer),
        FieldKind::Textarea { rows } => {
            let rows = rows.unwrap_or(DEFAULT_TEXTAREA_ROWS);
            keep_with_label(ctx, field, textarea_height(theme, rows));
            ctx.label(field);
            ctx.text_area(rows, &path, answer.text(), tooltip)
        }
        FieldKind::Select { options } => {
            keep_with_label(ctx, field, theme.input_height);
            ctx.label(field);
            let widget = FieldWidget::Dropdown {
                options: options.iter().map(|o| o.label.clone()).collect(),
                selected: selected_option(options, answer),
            };
            ctx.widget_row(theme.input_height, &path, widget, tooltip)
        }
        FieldKind::Checklist { options } => render_checklist(ctx, field, &path, options, answer),
        FieldKind::Likert(scale) => render_likert(ctx, field, &path, scale, answer),
        FieldKind::Computed { .. } => render_computed(ctx, field),
        FieldKind::Table(spec) | FieldKind::Hierarchy(spec) => {
            structured::render_table(ctx, field, &path, spec, answer)
        }
        FieldKind::SafetyPlan { steps } => {
            structured::render_safety_plan(ctx, field, &path, steps, answer)
        }
        FieldKind::DecisionTree(tree) => {
            structured::render_decision_tree(ctx, field, &path, tree, answer)
        }
        FieldKind::Formulation(formulation) => {
            structured::render_formulation(ctx, field, &path, formulation, answer)
        }
        FieldKind::Record { groups } => structured::render_record(ctx, field, &path, groups, answer),
    }
}

/// Render a list of sibling fields with the inter-field gap between them.
pub fn render_fields(
    ctx: &mut RenderContext<'_>,
    fields: &[Field],
    parent: &FieldPath,
    answers: Answer<'_>,
) -> Result<(), ExportError> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            ctx.cursor.advance(ctx.theme.field_gap);
        }
        render_field(ctx, field, parent, answers.get(&field.id))?;
    }
    Ok(())
}

/// Keep a label on the same page as the first `body` points of its widget.
pub(crate) fn keep_with_label(ctx: &mut RenderContext<'_>, field: &Field, body: f64) {
    let label = ctx.label_height(field);
    if label + body <= ctx.cursor.config().content_height() {
        ctx.cursor.ensure_space(label + body);
    }
}

fn single_line(answer: Answer<'_>) -> FieldWidget {
    FieldWidget::Text {
        multiline: false,
        value: answer.text(),
    }
}

fn render_number(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    unit: Option<&str>,
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    let height = ctx.theme.input_height;
    keep_with_label(ctx, field, height);
    ctx.label(field);

    let unit = unit.map(str::trim).filter(|u| !u.is_empty());
    let Some(unit) = unit else {
        return ctx.widget_row(height, path, single_line(answer), field.placeholder.as_deref());
    };

    let size = ctx.theme.body_size;
    let font = StandardFont::Helvetica;
    let unit_width = font.metrics().measure_string(unit, size) + 8.0;
    ctx.cursor.ensure_space(height);
    let y = ctx.cursor.y();
    let box_width = (ctx.width() - unit_width).max(ctx.width() * 0.5);
    let rect = Rect::new(ctx.x(), y, box_width, height);
    ctx.widget(rect, path, single_line(answer), field.placeholder.as_deref())?;
    let text_y = y + (height - ctx.theme.leading(size)) / 2.0;
    ctx.push_text(ctx.x() + box_width + 6.0, text_y, unit, font, size, ctx.theme.muted);
    ctx.cursor.advance(height);
    Ok(())
}

/// The label of the option whose id matches the stored value.
fn selected_option(options: &[ChoiceOption], answer: Answer<'_>) -> Option<String> {
    let stored = answer.text()?;
    options
        .iter()
        .find(|o| o.id == stored)
        .map(|o| o.label.clone())
}

fn render_checklist(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    options: &[ChoiceOption],
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    let theme = ctx.theme;
    let size = theme.body_size;
    let row = theme.leading(size).max(theme.checkbox_size) + 3.0;
    keep_with_label(ctx, field, row);
    ctx.label(field);

    let checked = answer.string_set();
    let font = StandardFont::Helvetica;
    let box_size = theme.checkbox_size;
    for option in options {
        let text_x = ctx.x() + box_size + 6.0;
        let text_width = (ctx.width() - box_size - 6.0).max(1.0);
        let lines = crate::text::wrap_text(&option.label, &font.metrics(), size, text_width);
        let leading = theme.leading(size);
        let height = (lines.len() as f64 * leading).max(box_size) + 3.0;

        ctx.cursor.ensure_space(height);
        let y = ctx.cursor.y();
        let box_y = y + (leading - box_size).max(0.0) / 2.0;
        ctx.widget(
            Rect::new(ctx.x(), box_y, box_size, box_size),
            &path.child(&option.id),
            FieldWidget::Checkbox {
                checked: checked.contains(option.id.as_str()),
            },
            None,
        )?;
        for (i, line) in lines.iter().enumerate() {
            ctx.push_text(text_x, y + i as f64 * leading, line, font, size, theme.text);
        }
        ctx.cursor.advance(height);
    }
    Ok(())
}

/// Every value on the scale, from `min` to `max` by `step`. A step that is
/// not positive counts as 1.
pub(crate) fn likert_values(scale: &LikertScale) -> Vec<f64> {
    let step = if scale.step.is_finite() && scale.step > 0.0 {
        scale.step
    } else {
        1.0
    };
    if scale.max < scale.min {
        return vec![scale.min];
    }
    let count = (((scale.max - scale.min) / step) + 1e-9).floor() as usize + 1;
    (0..count)
        .map(|i| scale.min + i as f64 * step)
        .collect()
}

fn anchor_at(scale: &LikertScale, value: f64) -> Option<&str> {
    scale
        .anchors
        .iter()
        .find(|(k, _)| {
            k.trim()
                .parse::<f64>()
                .map(|k| (k - value).abs() < 1e-9)
                .unwrap_or(false)
        })
        .map(|(_, v)| v.as_str())
}

/// Option label for a scale value: `"7"`, or `"10 — Severe"` when an anchor
/// sits exactly on it.
pub(crate) fn likert_label(scale: &LikertScale, value: f64) -> String {
    match anchor_at(scale, value) {
        Some(anchor) => format!("{} \u{2014} {}", format_number(value), anchor),
        None => format_number(value),
    }
}

/// `0 = None · 10 = Severe`, anchors in scale order.
fn anchor_hint(scale: &LikertScale) -> Option<String> {
    let mut anchors: Vec<(f64, &str)> = scale
        .anchors
        .iter()
        .filter_map(|(k, v)| k.trim().parse::<f64>().ok().map(|k| (k, v.as_str())))
        .collect();
    if anchors.is_empty() {
        return None;
    }
    anchors.sort_by(|a, b| a.0.total_cmp(&b.0));
    Some(
        anchors
            .iter()
            .map(|(k, v)| format!("{} = {}", format_number(*k), v))
            .collect::<Vec<_>>()
            .join(" \u{00B7} "),
    )
}

fn render_likert(
    ctx: &mut RenderContext<'_>,
    field: &Field,
    path: &FieldPath,
    scale: &LikertScale,
    answer: Answer<'_>,
) -> Result<(), ExportError> {
    let hint = anchor_hint(scale);
    let size = ctx.theme.small_size;
    let hint_height = hint
        .as_deref()
        .map(|h| ctx.measure_paragraphs(h, StandardFont::HelveticaOblique, size) + LABEL_GAP)
        .unwrap_or(0.0);
    let input_height = ctx.theme.input_height;
    keep_with_label(ctx, field, hint_height + input_height);
    ctx.label(field);
    if let Some(hint) = hint {
        ctx.paragraphs(&hint, StandardFont::HelveticaOblique, size, ctx.theme.muted);
        ctx.cursor.advance(LABEL_GAP);
    }

    let options: Vec<String> = likert_values(scale)
        .into_iter()
        .map(|v| likert_label(scale, v))
        .collect();
    let selected = answer
        .number()
        .map(|n| likert_label(scale, n))
        .filter(|label| options.contains(label));
    ctx.widget_row(
        input_height,
        path,
        FieldWidget::Dropdown { options, selected },
        field.placeholder.as_deref(),
    )
}

fn render_computed(ctx: &mut RenderContext<'_>, field: &Field) -> Result<(), ExportError> {
    let size = ctx.theme.small_size;
    let note = "Calculated automatically in the interactive version.";
    let note_height = ctx.measure_paragraphs(note, StandardFont::HelveticaOblique, size);
    keep_with_label(ctx, field, note_height);
    ctx.label(field);
    ctx.paragraphs(note, StandardFont::HelveticaOblique, size, ctx.theme.muted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::form::{FieldNamer, InteractiveField};
    use crate::style::Theme;
    use serde_json::{json, Value};

    fn render(field: Value, answer: Value) -> Vec<InteractiveField> {
        let field: Field = serde_json::from_value(field).unwrap();
        let theme = Theme::default();
        let mut ctx = RenderContext::new(&PageConfig::default(), &theme, FieldNamer::new());
        render_field(&mut ctx, &field, &FieldPath::root("s"), Answer::new(Some(&answer))).unwrap();
        ctx.into_pages().into_iter().flat_map(|p| p.fields).collect()
    }

    fn likert() -> LikertScale {
        serde_json::from_value(json!({
            "min": 0, "max": 10, "step": 1,
            "anchors": { "0": "None", "10": "Severe" }
        }))
        .unwrap()
    }

    #[test]
    fn text_value_is_stringified() {
        let fields = render(json!({ "id": "n", "type": "number" }), json!(2.5));
        assert_eq!(fields[0].value(), Some("2.5"));
        let fields = render(json!({ "id": "t", "type": "text" }), json!("hello"));
        assert_eq!(fields[0].value(), Some("hello"));
        assert_eq!(fields[0].path(), "s.t");
    }

    #[test]
    fn number_with_unit_keeps_one_widget() {
        let fields = render(
            json!({ "id": "hrs", "type": "number", "unit": "hours" }),
            json!(7),
        );
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value(), Some("7"));
    }

    #[test]
    fn select_matches_option_id() {
        let field = json!({
            "id": "mood", "type": "select",
            "options": [{ "id": "lo", "label": "Low" }, { "id": "hi", "label": "High" }]
        });
        assert_eq!(render(field.clone(), json!("hi"))[0].value(), Some("High"));
        assert_eq!(render(field, json!("nope"))[0].value(), None);
    }

    #[test]
    fn checklist_checks_stored_ids() {
        let fields = render(
            json!({
                "id": "c", "type": "checklist",
                "options": [{ "id": "a", "label": "A" }, { "id": "b", "label": "B" }]
            }),
            json!(["b"]),
        );
        assert_eq!(fields.len(), 2);
        assert!(!fields[0].is_checked());
        assert!(fields[1].is_checked());
        assert_eq!(fields[1].path(), "s.c.b");
    }

    #[test]
    fn likert_labels_and_selection() {
        let scale = likert();
        assert_eq!(likert_values(&scale).len(), 11);
        assert_eq!(likert_label(&scale, 7.0), "7");
        assert_eq!(likert_label(&scale, 10.0), "10 \u{2014} Severe");
        assert_eq!(anchor_hint(&scale).unwrap(), "0 = None \u{00B7} 10 = Severe");

        let field = json!({
            "id": "mood", "type": "likert", "min": 0, "max": 10, "step": 1,
            "anchors": { "0": "None", "10": "Severe" }
        });
        assert_eq!(render(field.clone(), json!(7))[0].value(), Some("7"));
        assert_eq!(render(field.clone(), json!(10))[0].value(), Some("10 \u{2014} Severe"));
        assert_eq!(render(field, json!(11))[0].value(), None);
    }

    #[test]
    fn likert_guards_bad_steps() {
        let scale: LikertScale =
            serde_json::from_value(json!({ "min": 1, "max": 5, "step": 0 })).unwrap();
        assert_eq!(likert_values(&scale), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let half: LikertScale =
            serde_json::from_value(json!({ "min": 0, "max": 1, "step": 0.25 })).unwrap();
        assert_eq!(likert_values(&half).len(), 5);
    }

    #[test]
    fn wide_likert_lists_every_value() {
        let fields = render(
            json!({ "id": "v", "type": "likert", "min": 0, "max": 1000, "step": 1 }),
            json!(500),
        );
        assert_eq!(fields[0].value(), Some("500"));
        match &fields[0].widget {
            FieldWidget::Dropdown { options, .. } => {
                assert_eq!(options.len(), 1001);
                assert_eq!(options.last().map(String::as_str), Some("1000"));
            }
            other => panic!("expected dropdown, got {:?}", other),
        }
    }

    #[test]
    fn computed_has_no_widget() {
        let fields = render(
            json!({ "id": "total", "type": "computed", "label": "Total" }),
            json!(42),
        );
        assert!(fields.is_empty());
    }

    #[test]
    fn malformed_values_read_as_empty() {
        let fields = render(
            json!({ "id": "notes", "type": "textarea" }),
            json!({ "unexpected": true }),
        );
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value(), None);
    }
}
