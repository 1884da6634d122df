//! # Style
//!
//! Colours and the typographic theme shared by every renderer. The theme is
//! deliberately small: a worksheet export has one look, tuned through a few
//! sizes and brand colours rather than a cascade.

use serde::{Deserialize, Serialize};

/// An RGB colour with components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional).
    ///
    /// Returns `None` for anything else; callers treat that as "no colour"
    /// and skip whatever they were going to paint.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let (r, g, b) = match hex.len() {
            3 => (
                u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?,
                u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?,
                u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?,
            ),
            6 => (
                u8::from_str_radix(&hex[0..2], 16).ok()?,
                u8::from_str_radix(&hex[2..4], 16).ok()?,
                u8::from_str_radix(&hex[4..6], 16).ok()?,
            ),
            _ => return None,
        };
        Some(Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        })
    }

    /// Blend towards white; `amount` 0.0 keeps the colour, 1.0 gives white.
    pub fn lighten(&self, amount: f64) -> Self {
        let t = amount.clamp(0.0, 1.0);
        Self {
            r: self.r + (1.0 - self.r) * t,
            g: self.g + (1.0 - self.g) * t,
            b: self.b + (1.0 - self.b) * t,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Sizes and colours for every element the exporter draws.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub title_size: f64,
    pub heading_size: f64,
    pub label_size: f64,
    pub body_size: f64,
    pub small_size: f64,
    /// Line height as a multiplier of font size.
    pub line_height: f64,
    /// Height of a single-line text / dropdown widget.
    pub input_height: f64,
    /// Height of one textarea row.
    pub textarea_row_height: f64,
    pub checkbox_size: f64,
    pub table_row_height: f64,
    /// Vertical gap between consecutive fields.
    pub field_gap: f64,
    /// Vertical gap after a section.
    pub section_gap: f64,
    /// Left indent for nested blocks (plan steps, nodes, groups).
    pub indent: f64,

    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub required: Color,
    pub highlight: Color,
    pub panel: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title_size: 18.0,
            heading_size: 13.0,
            label_size: 10.0,
            body_size: 9.5,
            small_size: 8.0,
            line_height: 1.35,
            input_height: 20.0,
            textarea_row_height: 14.0,
            checkbox_size: 10.0,
            table_row_height: 20.0,
            field_gap: 12.0,
            section_gap: 18.0,
            indent: 22.0,
            text: Color::rgb(0.12, 0.13, 0.16),
            muted: Color::rgb(0.42, 0.45, 0.50),
            accent: Color::rgb(0.20, 0.38, 0.62),
            border: Color::rgb(0.70, 0.73, 0.78),
            required: Color::rgb(0.78, 0.16, 0.16),
            highlight: Color::rgb(0.80, 0.22, 0.18),
            panel: Color::rgb(0.95, 0.96, 0.98),
        }
    }
}

impl Theme {
    /// Baseline-to-baseline distance for text at `font_size`.
    pub fn leading(&self, font_size: f64) -> f64 {
        font_size * self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_hex() {
        let c = Color::parse_hex("#ff8000").unwrap();
        assert!((c.r - 1.0).abs() < 1e-9);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn parses_short_hex_without_hash() {
        assert_eq!(Color::parse_hex("fff"), Some(Color::WHITE));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Color::parse_hex("not-a-colour"), None);
        assert_eq!(Color::parse_hex("#12345"), None);
        assert_eq!(Color::parse_hex("#zzzzzz"), None);
        assert_eq!(Color::parse_hex(""), None);
    }

    #[test]
    fn lighten_towards_white() {
        assert_eq!(Color::BLACK.lighten(1.0), Color::WHITE);
        assert_eq!(Color::BLACK.lighten(0.0), Color::BLACK);
    }
}
