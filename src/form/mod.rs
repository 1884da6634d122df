//! # Interactive Form Fields
//!
//! Descriptors for the fillable widgets placed during layout. The PDF writer
//! turns each into an AcroForm field; callers reading a document back use the
//! same names.

pub mod naming;

pub use naming::{FieldNamer, FieldPath};

use crate::layout::Rect;

/// A named, typed, pre-filled widget on a page.
#[derive(Debug, Clone)]
pub struct InteractiveField {
    /// Fully qualified, document-unique name (`section.field[.nested].N`).
    pub name: String,
    pub rect: Rect,
    pub widget: FieldWidget,
    /// Tooltip shown by viewers; carries the schema placeholder.
    pub tooltip: Option<String>,
}

/// The widget type together with its pre-filled state.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWidget {
    Text {
        multiline: bool,
        value: Option<String>,
    },
    Checkbox {
        checked: bool,
    },
    Dropdown {
        options: Vec<String>,
        selected: Option<String>,
    },
}

/// The four widget kinds a viewer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    SingleLineText,
    MultilineText,
    Checkbox,
    Dropdown,
}

impl InteractiveField {
    pub fn kind(&self) -> WidgetKind {
        match &self.widget {
            FieldWidget::Text {
                multiline: false, ..
            } => WidgetKind::SingleLineText,
            FieldWidget::Text {
                multiline: true, ..
            } => WidgetKind::MultilineText,
            FieldWidget::Checkbox { .. } => WidgetKind::Checkbox,
            FieldWidget::Dropdown { .. } => WidgetKind::Dropdown,
        }
    }

    /// Pre-filled text of a text widget, or selected label of a dropdown.
    pub fn value(&self) -> Option<&str> {
        match &self.widget {
            FieldWidget::Text { value, .. } => value.as_deref(),
            FieldWidget::Dropdown { selected, .. } => selected.as_deref(),
            FieldWidget::Checkbox { .. } => None,
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self.widget, FieldWidget::Checkbox { checked: true })
    }

    /// The name without its trailing disambiguator.
    pub fn path(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(path, _)| path)
            .unwrap_or(&self.name)
    }
}
