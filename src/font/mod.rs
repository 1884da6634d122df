//! # Font Management
//!
//! The exporter draws exclusively with standard PDF fonts, which every viewer
//! ships and which need no embedding: Helvetica upright, bold and oblique for text,
//! and ZapfDingbats for checkbox marks.

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// The standard PDF fonts the exporter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    ZapfDingbats,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Width metrics. Obliques share the upright widths.
    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => metrics::HELVETICA,
            Self::HelveticaBold => metrics::HELVETICA_BOLD,
            // Only ever used for the single check glyph; close enough.
            Self::ZapfDingbats => metrics::HELVETICA_BOLD,
        }
    }

    /// Whether text in this font is encoded with WinAnsiEncoding.
    /// ZapfDingbats uses its built-in symbol encoding.
    pub fn uses_win_ansi(&self) -> bool {
        !matches!(self, Self::ZapfDingbats)
    }
}
