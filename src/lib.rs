//! # Worksheet PDF
//!
//! Turns a declarative worksheet (ordered sections of typed fields) plus any
//! answers captured so far into a paginated PDF with fillable AcroForm
//! widgets. The output is the offline, printable twin of the on-screen form:
//! a viewer can fill it in, and a downstream system can read the answers
//! back by field name.
//!
//! ## Architecture
//!
//! ```text
//! ExportRequest (JSON)
//!       ↓
//!   [model]      — schema, field kinds, answer access
//!       ↓
//!   [render]     — sections and fields drawn through the page cursor
//!       ↓
//!   [assembler]  — front matter, entries, then the chrome pass
//!       ↓
//!   [pdf]        — serialize pages and AcroForm to bytes
//! ```
//!
//! Layout is page-native: renderers ask the [`layout::PageCursor`] for space
//! before drawing, and content flows *into* pages rather than being sliced
//! afterwards. Headers and footers are painted once every page exists, so
//! "Page X of Y" always carries the true total.
//!
//! Field names follow the schema hierarchy (`intake.contacts.row1.phone.17`)
//! and are unique within a document. The disambiguating counter belongs to a
//! single export, so concurrent exports never interfere.

pub mod assembler;
pub mod chrome;
pub mod config;
pub mod error;
pub mod font;
pub mod form;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod style;
pub mod text;

use log::info;

pub use assembler::RenderedDocument;
pub use config::ExportOptions;
pub use error::ExportError;
pub use model::{ExportRequest, WorksheetSchema};

use pdf::PdfWriter;

/// Export a request to PDF bytes with default options.
///
/// This is the primary entry point. An export either returns a complete
/// document or an error; there is no partial output.
pub fn export(request: &ExportRequest) -> Result<Vec<u8>, ExportError> {
    export_with_options(request, &ExportOptions::default())
}

/// Export a request to PDF bytes.
pub fn export_with_options(
    request: &ExportRequest,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let document = render_document(request, options)?;
    let bytes = PdfWriter::new().write(&document.pages, &document.images, &document.info)?;
    info!(
        "exported '{}': {} pages, {} fields, {} bytes",
        request.title,
        document.page_count(),
        document.fields().count(),
        bytes.len()
    );
    Ok(bytes)
}

/// Lay out a request without serializing it. Useful for inspecting pages
/// and fields directly.
pub fn render_document(
    request: &ExportRequest,
    options: &ExportOptions,
) -> Result<RenderedDocument, ExportError> {
    assembler::assemble(request, options)
}

/// Export a request given as JSON.
pub fn export_json(json: &str) -> Result<Vec<u8>, ExportError> {
    let request: ExportRequest = serde_json::from_str(json)?;
    export(&request)
}
