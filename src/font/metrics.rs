//! Advance widths for the standard PDF fonts used by the exporter.
//!
//! Widths are in 1/1000 em units, taken from the Adobe AFM files. Only the
//! printable ASCII range is tabulated; the handful of WinAnsi punctuation
//! marks the layout actually emits (dashes, ellipsis, bullet, middle dot)
//! are special-cased, everything else falls back to the average width.

/// Helvetica / Helvetica-Oblique, chars 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold / Helvetica-BoldOblique, chars 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Width table for one standard font.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    default_width: u16,
    /// Ascender in 1/1000 em.
    pub ascender: f64,
    /// Descender in 1/1000 em (negative).
    pub descender: f64,
}

pub(crate) const HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_WIDTHS,
    default_width: 556,
    ascender: 718.0,
    descender: -207.0,
};

pub(crate) const HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD_WIDTHS,
    default_width: 556,
    ascender: 718.0,
    descender: -207.0,
};

impl StandardFontMetrics {
    /// Advance width of a single character in 1/1000 em.
    fn char_units(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (32..=126).contains(&cp) {
            return self.widths[(cp - 32) as usize];
        }
        match ch {
            '\u{2014}' | '\u{2026}' => 1000, // em dash, ellipsis
            '\u{2013}' => 556,               // en dash
            '\u{2022}' => 350,               // bullet
            '\u{00B7}' => 278,               // middle dot
            '\u{00A0}' => 278,               // no-break space
            _ => self.default_width,
        }
    }

    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.char_units(ch) as f64 * font_size / 1000.0
    }

    /// Measure a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    /// Distance from baseline to the top of the tallest glyphs, in points.
    pub fn ascent(&self, font_size: f64) -> f64 {
        self.ascender * font_size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_width_matches_afm() {
        assert!((HELVETICA.char_width(' ', 12.0) - 3.336).abs() < 0.001);
    }

    #[test]
    fn bold_is_wider_for_lowercase() {
        assert!(HELVETICA_BOLD.measure_string("abc", 10.0) > HELVETICA.measure_string("abc", 10.0));
    }

    #[test]
    fn non_ascii_falls_back() {
        assert_eq!(HELVETICA.char_width('\u{00E9}', 1000.0), 556.0);
        assert_eq!(HELVETICA.char_width('\u{2014}', 1000.0), 1000.0);
    }
}
