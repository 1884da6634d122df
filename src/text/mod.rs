//! # Text Measurement
//!
//! Pure line-breaking and truncation over standard font metrics. Every
//! renderer goes through these so that measured heights and drawn lines
//! always agree.

use crate::font::StandardFontMetrics;

/// Horizontal ellipsis, present in WinAnsiEncoding.
pub const ELLIPSIS: char = '\u{2026}';

/// Break `text` into lines no wider than `max_width`.
///
/// Greedy: words are appended to the current line while the measured width
/// stays within `max_width`; the overflowing word starts the next line. A
/// single word wider than `max_width` gets a line of its own and is never
/// split. Empty input yields one empty line, and input that already fits is
/// returned unchanged as a single line.
pub fn wrap_text(
    text: &str,
    metrics: &StandardFontMetrics,
    font_size: f64,
    max_width: f64,
) -> Vec<String> {
    if !text.contains('\n') && metrics.measure_string(text, font_size) <= max_width {
        return vec![text.to_string()];
    }

    let space = metrics.char_width(' ', font_size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let word_width = metrics.measure_string(word, font_size);
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap each newline-separated paragraph independently. Blank paragraphs are
/// kept as empty lines.
pub fn wrap_paragraphs(
    text: &str,
    metrics: &StandardFontMetrics,
    font_size: f64,
    max_width: f64,
) -> Vec<String> {
    let mut lines: Vec<String> = text
        .lines()
        .flat_map(|para| wrap_text(para, metrics, font_size, max_width))
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Shorten `text` until it fits within `max_width`, marking the cut with an
/// ellipsis. Text that already fits comes back unchanged. Otherwise trailing
/// characters are dropped one at a time until text plus ellipsis fits; when
/// nothing is left the result is the ellipsis alone, fitting or not.
pub fn truncate_text(
    text: &str,
    metrics: &StandardFontMetrics,
    font_size: f64,
    max_width: f64,
) -> String {
    if metrics.measure_string(text, font_size) <= max_width {
        return text.to_string();
    }

    let mut kept: String = text.to_string();
    loop {
        kept.pop();
        let candidate = format!("{}{}", kept, ELLIPSIS);
        if kept.is_empty() || metrics.measure_string(&candidate, font_size) <= max_width {
            return candidate;
        }
    }
}
