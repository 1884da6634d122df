//! Field naming.
//!
//! A field's name is its position in the schema hierarchy, dot-separated,
//! followed by a numeric disambiguator: `intake.contacts.row1.phone.17`.
//! The disambiguator comes from a counter owned by one export, so two
//! exports running side by side never share state.
//!
//! Names double as the AcroForm field hierarchy, where every dot opens a
//! level. For that tree to be well formed no terminal name may also be a
//! prefix of another name. Structural segments the renderer adds (`row1`,
//! `rec1`, `entry1`, `item1`, `nodes`, ...) are never purely numeric, and the
//! counter skips any value that a schema id spells out, so a terminal
//! segment can never coincide with an interior one.

use std::collections::HashSet;
use std::fmt;

use crate::error::ExportError;
use crate::model::WorksheetSchema;

/// A dot-separated position in the schema hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn root(segment: &str) -> Self {
        Self {
            segments: vec![sanitize(segment)],
        }
    }

    /// A new path one level deeper.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(sanitize(segment));
        Self { segments }
    }

    /// A new path with `other`'s segments appended.
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Dots would open spurious hierarchy levels; empty segments would produce
/// `a..b`.
fn sanitize(segment: &str) -> String {
    let cleaned = segment.trim().replace('.', "_");
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Issues unique field names for one export.
#[derive(Debug, Default)]
pub struct FieldNamer {
    next: u64,
    reserved: HashSet<u64>,
    issued: HashSet<String>,
}

impl FieldNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A namer that will never emit a disambiguator equal to a numeric id
    /// used anywhere in `schema`.
    pub fn for_schema(schema: &WorksheetSchema) -> Self {
        let reserved = schema
            .all_ids()
            .into_iter()
            .filter_map(|id| id.trim().parse::<u64>().ok())
            .collect();
        Self {
            reserved,
            ..Self::default()
        }
    }

    /// Name the next widget at `path`.
    pub fn issue(&mut self, path: &FieldPath) -> Result<String, ExportError> {
        while self.reserved.contains(&self.next) {
            self.next += 1;
        }
        let name = format!("{}.{}", path, self.next);
        self.next += 1;
        if !self.issued.insert(name.clone()) {
            return Err(ExportError::Render(format!(
                "duplicate field name '{}'",
                name
            )));
        }
        Ok(name)
    }

    /// How many names have been issued.
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_join_with_dots() {
        let path = FieldPath::root("intake").child("contacts").child("row1");
        assert_eq!(path.to_string(), "intake.contacts.row1");
        let prefixed = FieldPath::root("entry2").join(&path);
        assert_eq!(prefixed.to_string(), "entry2.intake.contacts.row1");
    }

    #[test]
    fn dots_and_blanks_are_sanitized() {
        let path = FieldPath::root("a.b").child("  ");
        assert_eq!(path.segments(), &["a_b".to_string(), "_".to_string()]);
    }

    #[test]
    fn counter_is_monotonic_and_names_unique() {
        let mut namer = FieldNamer::new();
        let path = FieldPath::root("s").child("f");
        assert_eq!(namer.issue(&path).unwrap(), "s.f.0");
        assert_eq!(namer.issue(&path).unwrap(), "s.f.1");
        assert_eq!(namer.issued_count(), 2);
    }

    #[test]
    fn reserved_numeric_ids_are_skipped() {
        let schema: WorksheetSchema = serde_json::from_str(
            r#"{ "sections": [{ "id": "1", "fields": [{ "id": "0", "type": "text" }] }] }"#,
        )
        .unwrap();
        let mut namer = FieldNamer::for_schema(&schema);
        let path = FieldPath::root("1").child("0");
        assert_eq!(namer.issue(&path).unwrap(), "1.0.2");
        assert_eq!(namer.issue(&path).unwrap(), "1.0.3");
    }

    #[test]
    fn separate_namers_do_not_share_state() {
        let path = FieldPath::root("s");
        let mut a = FieldNamer::new();
        let mut b = FieldNamer::new();
        a.issue(&path).unwrap();
        assert_eq!(b.issue(&path).unwrap(), "s.0");
    }
}
