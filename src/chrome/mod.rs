//! # Page Chrome
//!
//! The running header and footer. Painted in a second pass over finished
//! pages, because "Page X of Y" needs the final page count. Chrome lives in
//! the margins reserved by [`PageConfig`]; it never touches the content
//! flow.

use chrono::{DateTime, Utc};

use crate::config::PageConfig;
use crate::font::StandardFont;
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, TextLine};
use crate::style::{Color, Theme};
use crate::text::truncate_text;

/// An embedded logo and its drawn size.
#[derive(Debug, Clone, Copy)]
pub struct LogoPlacement {
    pub image_index: usize,
    pub width: f64,
    pub height: f64,
}

/// Everything the chrome pass needs besides the pages.
#[derive(Debug, Clone)]
pub struct Chrome<'a> {
    pub title: &'a str,
    /// Brand name for the footer; `None` when branding is off.
    pub brand: Option<&'a str>,
    pub logo: Option<LogoPlacement>,
    pub generated_at: DateTime<Utc>,
    pub config: &'a PageConfig,
    pub theme: &'a Theme,
}

const ACCENT_BAR_HEIGHT: f64 = 2.0;
const LOGO_GAP: f64 = 10.0;

impl Chrome<'_> {
    /// Footer left text.
    pub fn footer_text(&self) -> String {
        let stamp = self.generated_at.format("%Y-%m-%d %H:%M UTC");
        match self.brand {
            Some(brand) => format!("{} \u{00B7} Generated {}", brand, stamp),
            None => format!("Generated {}", stamp),
        }
    }

    /// Paint header and footer on every page.
    pub fn paint(&self, pages: &mut [LayoutPage]) {
        let total = pages.len();
        for (i, page) in pages.iter_mut().enumerate() {
            page.chrome.clear();
            self.paint_header(page);
            self.paint_footer(page, i + 1, total);
        }
    }

    fn paint_header(&self, page: &mut LayoutPage) {
        let config = self.config;
        let theme = self.theme;
        let left = config.content_left();
        let width = config.content_width();
        let top = config.margin.top;
        let bar_y = top + config.header_height - 12.0;

        let mut title_width = width;
        if let Some(logo) = self.logo {
            let logo_height = logo.height.min(bar_y - top - 2.0).max(0.0);
            let logo_width = if logo.height > 0.0 {
                logo.width * logo_height / logo.height
            } else {
                0.0
            };
            page.chrome.push(LayoutElement {
                x: left + width - logo_width,
                y: top,
                width: logo_width,
                height: logo_height,
                draw: DrawCommand::Image {
                    image_index: logo.image_index,
                },
            });
            title_width -= logo_width + LOGO_GAP;
        }

        let size = theme.label_size + 1.0;
        let font = StandardFont::HelveticaBold;
        let title = truncate_text(self.title, &font.metrics(), size, title_width.max(0.0));
        if !title.is_empty() {
            page.chrome.push(text_element(left, bar_y - 6.0, &title, font, size, theme.text));
        }

        page.chrome.push(LayoutElement {
            x: left,
            y: bar_y,
            width,
            height: ACCENT_BAR_HEIGHT,
            draw: DrawCommand::Rect {
                fill: Some(theme.accent),
                stroke: None,
                stroke_width: 0.0,
                radius: 0.0,
            },
        });
    }

    fn paint_footer(&self, page: &mut LayoutPage, number: usize, total: usize) {
        let config = self.config;
        let theme = self.theme;
        let left = config.content_left();
        let width = config.content_width();
        let rule_y = config.content_bottom() + 8.0;
        let baseline = rule_y + 13.0;
        let size = theme.small_size;
        let font = StandardFont::Helvetica;
        let metrics = font.metrics();

        page.chrome.push(LayoutElement {
            x: left,
            y: rule_y,
            width,
            height: 0.0,
            draw: DrawCommand::Line {
                color: theme.border,
                line_width: 0.5,
            },
        });

        let page_label = format!("Page {} of {}", number, total);
        let page_width = metrics.measure_string(&page_label, size);
        page.chrome.push(text_element(
            left + width - page_width,
            baseline,
            &page_label,
            font,
            size,
            theme.muted,
        ));

        let footer = truncate_text(
            &self.footer_text(),
            &metrics,
            size,
            (width - page_width - 12.0).max(0.0),
        );
        if !footer.is_empty() {
            page.chrome.push(text_element(left, baseline, &footer, font, size, theme.muted));
        }
    }
}

/// A one-line text element with its baseline at `baseline`.
fn text_element(
    x: f64,
    baseline: f64,
    text: &str,
    font: StandardFont,
    size: f64,
    color: Color,
) -> LayoutElement {
    let metrics = font.metrics();
    let ascent = metrics.ascent(size);
    LayoutElement {
        x,
        y: baseline - ascent,
        width: metrics.measure_string(text, size),
        height: size,
        draw: DrawCommand::Text {
            lines: vec![TextLine {
                x,
                y: baseline,
                text: text.to_string(),
                font,
                font_size: size,
            }],
            color,
        },
    }
}
