//! Structured error types for the export engine.
//!
//! Three variants cover the real error sources: JSON parsing, resource
//! embedding, and structural layout failures. Cosmetic problems (an
//! unparsable swatch colour, say) never surface here; they are skipped and
//! logged.

use thiserror::Error;

/// The unified error type returned by all public export functions.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON input failed to parse as a valid export request.
    #[error("Failed to parse export request: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A resource (the branding logo) could not be loaded or embedded.
    #[error("Resource error: {0}")]
    Resource(String),
    /// Layout or PDF generation failed.
    #[error("Render error: {0}")]
    Render(String),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the worksheet schema. Check field types and names.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ExportError::Parse { source: e, hint }
    }
}
