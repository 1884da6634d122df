//! Read access to stored answers.
//!
//! Answers arrive as arbitrary JSON. `Answer` is a copyable view that walks
//! into nested objects and arrays without ever failing: a missing key, a
//! wrong type or a null all read as "no value", and the renderer shows an
//! empty widget.

use std::collections::HashSet;

use serde_json::Value;

/// Key of the entry list in a repeatable worksheet's stored value.
pub const ENTRIES_KEY: &str = "_entries";

/// A possibly-absent answer value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Answer<'a>(Option<&'a Value>);

impl<'a> Answer<'a> {
    pub fn new(value: Option<&'a Value>) -> Self {
        Self(value.filter(|v| !v.is_null()))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Object member lookup.
    pub fn get(&self, key: &str) -> Answer<'a> {
        Answer::new(self.0.and_then(|v| v.as_object()).and_then(|o| o.get(key)))
    }

    /// Array element lookup.
    pub fn at(&self, index: usize) -> Answer<'a> {
        Answer::new(self.0.and_then(|v| v.as_array()).and_then(|a| a.get(index)))
    }

    /// The elements of an array value; empty for anything else.
    pub fn items(&self) -> &'a [Value] {
        self.0
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Rows of a table value. Accepts a bare array of row objects or an
    /// object wrapping it as `{ "rows": [...] }`.
    pub fn rows(&self) -> &'a [Value] {
        match self.0 {
            Some(Value::Array(rows)) => rows,
            Some(Value::Object(_)) => self.get("rows").items(),
            _ => &[],
        }
    }

    /// The value as display text. Numbers print without a trailing `.0`,
    /// booleans as `Yes`/`No`; arrays and objects have no text form.
    pub fn text(&self) -> Option<String> {
        match self.0? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => n.as_f64().map(format_number),
            Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
            _ => None,
        }
    }

    /// The value as a number; numeric strings are accepted.
    pub fn number(&self) -> Option<f64> {
        match self.0? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The value as a set of option ids. A lone string counts as a
    /// one-element set.
    pub fn string_set(&self) -> HashSet<&'a str> {
        match self.0 {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => std::iter::once(s.as_str()).collect(),
            _ => HashSet::new(),
        }
    }
}

/// The stored entries of a repeatable worksheet, if `values` is an entry
/// container.
pub fn entries(values: Option<&Value>) -> Option<&[Value]> {
    values?
        .as_object()?
        .get(ENTRIES_KEY)?
        .as_array()
        .map(Vec::as_slice)
}

/// Format a number the way a person would write it: `7`, `2.5`, `-0.25`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let s = format!("{:.6}", n);
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() || trimmed == "-" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }
}
