//! # Worksheet Model
//!
//! The input representation: a worksheet schema is an ordered list of
//! sections, each holding typed fields. Field kinds form a closed set,
//! modelled as `FieldKind` and tagged in JSON by `"type"`.
//!
//! Structured kinds (safety plans, decision trees, formulations, records)
//! hold full `Field` definitions for their sub-fields, so a sub-field renders
//! exactly like a top-level field of the same kind.

pub mod values;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use values::Answer;

/// A complete worksheet definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorksheetSchema {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Diary mode: the worksheet can be filled in several times, and its
    /// stored value is `{ "_entries": [...] }`.
    #[serde(default)]
    pub repeatable: bool,
    /// Upper bound the interactive editor enforces. Informational only.
    #[serde(default)]
    pub max_entries: Option<u32>,
}

fn default_version() -> u32 {
    1
}

/// A titled group of fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    /// Step number shown in the heading ("Step 2 · ...").
    #[serde(default)]
    pub step: Option<u32>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Section {
    /// The text used for the section heading: title, then label, then id.
    pub fn heading(&self) -> &str {
        self.title
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or(&self.id)
    }
}

/// One field of a section (or a sub-field of a structured field).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// The closed set of field kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea {
        #[serde(default)]
        rows: Option<u32>,
    },
    Number {
        #[serde(default)]
        unit: Option<String>,
    },
    Date,
    Time,
    Select {
        #[serde(default)]
        options: Vec<ChoiceOption>,
    },
    Checklist {
        #[serde(default)]
        options: Vec<ChoiceOption>,
    },
    Likert(LikertScale),
    Table(TableSpec),
    /// A table the interactive editor keeps sorted; statically identical.
    Hierarchy(TableSpec),
    Computed {
        #[serde(default)]
        formula: Option<String>,
    },
    SafetyPlan {
        #[serde(default)]
        steps: Vec<PlanStep>,
    },
    DecisionTree(DecisionTree),
    Formulation(Formulation),
    Record {
        #[serde(default)]
        groups: Vec<RecordGroup>,
    },
}

impl FieldKind {
    /// The JSON tag of this kind, for logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea { .. } => "textarea",
            FieldKind::Number { .. } => "number",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Select { .. } => "select",
            FieldKind::Checklist { .. } => "checklist",
            FieldKind::Likert(_) => "likert",
            FieldKind::Table(_) => "table",
            FieldKind::Hierarchy(_) => "hierarchy",
            FieldKind::Computed { .. } => "computed",
            FieldKind::SafetyPlan { .. } => "safety_plan",
            FieldKind::DecisionTree(_) => "decision_tree",
            FieldKind::Formulation(_) => "formulation",
            FieldKind::Record { .. } => "record",
        }
    }
}

/// A selectable option: stored by id, displayed by label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

/// A numeric scale rendered as a dropdown of every step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikertScale {
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_likert_max")]
    pub max: f64,
    #[serde(default = "default_likert_step")]
    pub step: f64,
    /// Labels attached to exact scale points, keyed by the value as text
    /// (`"0"`, `"10"`, `"2.5"`).
    #[serde(default)]
    pub anchors: BTreeMap<String, String>,
}

fn default_likert_max() -> f64 {
    10.0
}

fn default_likert_step() -> f64 {
    1.0
}

/// Column layout shared by `table` and `hierarchy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
}

fn default_min_rows() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Relative width weight; columns without one count as 1.
    #[serde(default)]
    pub width: Option<f64>,
}

/// One numbered step of a safety plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub hint: Option<String>,
    /// Render the step badge in the reserved highlight style (e.g. the
    /// emergency-contact step).
    #[serde(default)]
    pub highlight: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A yes/no question with a fully specified branch for each answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    #[serde(default)]
    pub question: String,
    #[serde(default = "DecisionBranch::default_yes")]
    pub yes: DecisionBranch,
    #[serde(default = "DecisionBranch::default_no")]
    pub no: DecisionBranch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionBranch {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub outcome: Option<String>,
}

impl DecisionBranch {
    fn default_yes() -> Self {
        Self {
            label: "Yes".to_string(),
            fields: Vec::new(),
            outcome: None,
        }
    }

    fn default_no() -> Self {
        Self {
            label: "No".to_string(),
            fields: Vec::new(),
            outcome: None,
        }
    }
}

/// A node graph (cognitive formulation, maintenance cycle, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Formulation {
    #[serde(default)]
    pub nodes: Vec<FormulationNode>,
    /// Legacy layout: a single repeatable item definition instead of a
    /// fixed node set.
    #[serde(default)]
    pub item_template: Option<ItemTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulationNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Swatch colour as `#rrggbb`.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTemplate {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A labelled group of sub-fields inside each record entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordGroup {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// One export call: the worksheet, its front matter, and optional answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub schema: WorksheetSchema,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default = "default_true", alias = "showBranding")]
    pub show_branding: bool,
    /// A flat map keyed by field id, or `{ "_entries": [...] }` for a
    /// repeatable worksheet. Absent values give a blank form.
    #[serde(default)]
    pub values: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl WorksheetSchema {
    /// Every id declared anywhere in the schema: sections, fields, options,
    /// columns, steps, nodes and groups.
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for section in &self.sections {
            ids.push(section.id.as_str());
            collect_field_ids(&section.fields, &mut ids);
        }
        ids
    }
}

fn collect_field_ids<'a>(fields: &'a [Field], ids: &mut Vec<&'a str>) {
    for field in fields {
        ids.push(field.id.as_str());
        match &field.kind {
            FieldKind::Text
            | FieldKind::Textarea { .. }
            | FieldKind::Number { .. }
            | FieldKind::Date
            | FieldKind::Time
            | FieldKind::Likert(_)
            | FieldKind::Computed { .. } => {}
            FieldKind::Select { options } | FieldKind::Checklist { options } => {
                ids.extend(options.iter().map(|o| o.id.as_str()));
            }
            FieldKind::Table(spec) | FieldKind::Hierarchy(spec) => {
                ids.extend(spec.columns.iter().map(|c| c.id.as_str()));
            }
            FieldKind::SafetyPlan { steps } => {
                for step in steps {
                    ids.push(step.id.as_str());
                    collect_field_ids(&step.fields, ids);
                }
            }
            FieldKind::DecisionTree(tree) => {
                collect_field_ids(&tree.yes.fields, ids);
                collect_field_ids(&tree.no.fields, ids);
            }
            FieldKind::Formulation(formulation) => {
                for node in &formulation.nodes {
                    ids.push(node.id.as_str());
                    collect_field_ids(&node.fields, ids);
                }
                if let Some(template) = &formulation.item_template {
                    collect_field_ids(&template.fields, ids);
                }
            }
            FieldKind::Record { groups } => {
                for group in groups {
                    ids.push(group.id.as_str());
                    collect_field_ids(&group.fields, ids);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_fields() {
        let json = r#"{
            "version": 2,
            "sections": [{
                "id": "s1",
                "title": "Mood",
                "fields": [
                    { "id": "name", "type": "text", "label": "Name", "required": true },
                    { "id": "mood", "type": "likert", "label": "Mood", "min": 0, "max": 10,
                      "anchors": { "0": "None", "10": "Severe" } },
                    { "id": "log", "type": "table", "label": "Log",
                      "columns": [{ "id": "when", "label": "When" }], "min_rows": 2 },
                    { "id": "plan", "type": "safety_plan", "label": "Plan",
                      "steps": [{ "id": "warn", "label": "Warning signs",
                                  "fields": [{ "id": "a", "type": "textarea" }] }] }
                ]
            }]
        }"#;
        let schema: WorksheetSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.version, 2);
        let fields = &schema.sections[0].fields;
        assert!(fields[0].required);
        assert!(matches!(fields[0].kind, FieldKind::Text));
        match &fields[1].kind {
            FieldKind::Likert(scale) => {
                assert_eq!(scale.step, 1.0);
                assert_eq!(scale.anchors.get("10").map(String::as_str), Some("Severe"));
            }
            other => panic!("expected likert, got {}", other.name()),
        }
        match &fields[2].kind {
            FieldKind::Table(spec) => assert_eq!(spec.min_rows, 2),
            other => panic!("expected table, got {}", other.name()),
        }
        assert_eq!(fields[3].kind.name(), "safety_plan");
    }

    #[test]
    fn request_defaults() {
        let request: ExportRequest =
            serde_json::from_str(r#"{ "schema": { "sections": [] } }"#).unwrap();
        assert!(request.show_branding);
        assert!(request.values.is_none());
        assert_eq!(request.title, "");

        let request: ExportRequest = serde_json::from_str(
            r#"{ "schema": { "sections": [] }, "title": "T", "showBranding": false }"#,
        )
        .unwrap();
        assert!(!request.show_branding);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{ "id": "x", "type": "hologram" }"#;
        assert!(serde_json::from_str::<Field>(json).is_err());
    }

    #[test]
    fn decision_tree_defaults_branch_labels() {
        let json = r#"{ "id": "d", "type": "decision_tree", "question": "Safe?" }"#;
        let field: Field = serde_json::from_str(json).unwrap();
        match field.kind {
            FieldKind::DecisionTree(tree) => {
                assert_eq!(tree.yes.label, "Yes");
                assert_eq!(tree.no.label, "No");
            }
            other => panic!("expected decision_tree, got {}", other.name()),
        }
    }

    #[test]
    fn section_heading_fallbacks() {
        let mut section = Section {
            id: "s".into(),
            ..Default::default()
        };
        assert_eq!(section.heading(), "s");
        section.label = Some("Label".into());
        assert_eq!(section.heading(), "Label");
        section.title = Some("Title".into());
        assert_eq!(section.heading(), "Title");
    }

    #[test]
    fn all_ids_walks_nested_structures() {
        let json = r#"{ "sections": [{ "id": "s", "fields": [
            { "id": "r", "type": "record", "groups": [
                { "id": "g", "fields": [{ "id": "inner", "type": "text" }] }
            ] }
        ] }] }"#;
        let schema: WorksheetSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.all_ids(), vec!["s", "r", "g", "inner"]);
    }
}
