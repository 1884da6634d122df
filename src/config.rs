//! Export configuration.
//!
//! Everything here has a sensible default so that a bare request renders an
//! A4 document with hole-punch margins. The CLI can load an `ExportOptions`
//! JSON file to override any of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::style::Theme;

/// Options that shape an export but are not part of the worksheet itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub page: PageConfig,
    pub theme: Theme,
    pub branding: Branding,
    /// Timestamp printed in the footer. Defaults to the moment of export.
    pub generated_at: Option<DateTime<Utc>>,
}

/// Brand chrome shown when a request asks for branding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    /// Name printed in the footer.
    pub name: String,
    /// Logo source: a data URI, raw base64, or a file path.
    pub logo: Option<String>,
    /// Logo height in points; width follows the aspect ratio.
    pub logo_height: f64,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "Worksheets".to_string(),
            logo: None,
            logo_height: 22.0,
        }
    }
}

/// Physical page geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub size: PageSize,
    /// Page margins in points (1/72 inch).
    pub margin: Edges,
    /// Band reserved below the top margin for the running header.
    pub header_height: f64,
    /// Band reserved above the bottom margin for the running footer.
    pub footer_height: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            // Wider left margin clears standard two-hole punching.
            margin: Edges {
                top: 36.0,
                right: 42.0,
                bottom: 30.0,
                left: 62.0,
            },
            header_height: 40.0,
            footer_height: 28.0,
        }
    }
}

impl PageConfig {
    /// Y of the first drawable content line (top-left origin).
    pub fn content_top(&self) -> f64 {
        self.margin.top + self.header_height
    }

    /// Y below which no content may be placed.
    pub fn content_bottom(&self) -> f64 {
        let (_, h) = self.size.dimensions();
        h - self.margin.bottom - self.footer_height
    }

    pub fn content_left(&self) -> f64 {
        self.margin.left
    }

    pub fn content_width(&self) -> f64 {
        let (w, _) = self.size.dimensions();
        w - self.margin.horizontal()
    }

    /// Usable vertical space on one page.
    pub fn content_height(&self) -> f64 {
        self.content_bottom() - self.content_top()
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}
