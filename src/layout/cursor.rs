//! The page cursor: current draw position plus automatic page breaks.

use log::debug;

use super::{LayoutElement, LayoutPage};
use crate::config::PageConfig;
use crate::form::InteractiveField;

/// Slack for floating point comparisons against the content boundary.
const EPSILON: f64 = 0.01;

/// Tracks where we are on the current page during layout.
///
/// The cursor owns every page created so far. Renderers call
/// [`ensure_space`](Self::ensure_space) before drawing anything of known
/// height, draw at [`y`](Self::y), then [`advance`](Self::advance).
#[derive(Debug)]
pub struct PageCursor {
    config: PageConfig,
    pages: Vec<LayoutPage>,
    y: f64,
}

impl PageCursor {
    /// Start a document with one empty page.
    pub fn new(config: &PageConfig) -> Self {
        let mut cursor = Self {
            config: config.clone(),
            pages: Vec::new(),
            y: config.content_top(),
        };
        cursor.new_page();
        cursor
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Current draw position (top-left origin).
    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page_index(&self) -> usize {
        self.pages.len() - 1
    }

    /// Vertical space left above the bottom content boundary.
    pub fn remaining_height(&self) -> f64 {
        (self.config.content_bottom() - self.y).max(0.0)
    }

    /// Whether nothing has been placed on the current page yet.
    pub fn at_page_top(&self) -> bool {
        self.y <= self.config.content_top() + EPSILON
    }

    /// Make sure `height` points fit on the current page, breaking to a new
    /// page if they don't. Returns `true` when a break happened.
    ///
    /// A request taller than a whole page is honoured as-is on a fresh page;
    /// the element will overflow the bottom boundary rather than loop.
    pub fn ensure_space(&mut self, height: f64) -> bool {
        if self.y + height <= self.config.content_bottom() + EPSILON {
            return false;
        }
        if self.at_page_top() {
            debug!(
                "element of {:.1}pt exceeds the {:.1}pt page body; drawing as-is",
                height,
                self.config.content_height()
            );
            return false;
        }
        debug!(
            "{:.1}pt needed with {:.1}pt left on page {}",
            height,
            self.remaining_height(),
            self.pages.len()
        );
        self.new_page();
        true
    }

    /// Move the draw position down after drawing.
    pub fn advance(&mut self, height: f64) {
        self.y += height;
    }

    /// Append a page and reset the draw position to its content top.
    pub fn new_page(&mut self) {
        let (width, height) = self.config.size.dimensions();
        self.pages.push(LayoutPage::new(width, height));
        self.y = self.config.content_top();
        if self.pages.len() > 1 {
            debug!("page break: now on page {}", self.pages.len());
        }
    }

    /// Add a content element to the current page.
    pub fn push(&mut self, element: LayoutElement) {
        self.current_page_mut().elements.push(element);
    }

    /// Add a fillable widget to the current page.
    pub fn push_field(&mut self, field: InteractiveField) {
        self.current_page_mut().fields.push(field);
    }

    fn current_page_mut(&mut self) -> &mut LayoutPage {
        let index = self.current_page_index();
        &mut self.pages[index]
    }

    /// Finish layout and hand over the pages.
    pub fn into_pages(self) -> Vec<LayoutPage> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DrawCommand;
    use crate::style::Color;

    fn line_at(y: f64) -> LayoutElement {
        LayoutElement {
            x: 0.0,
            y,
            width: 10.0,
            height: 0.0,
            draw: DrawCommand::Line {
                color: Color::BLACK,
                line_width: 1.0,
            },
        }
    }

    #[test]
    fn starts_on_one_page_at_content_top() {
        let config = PageConfig::default();
        let cursor = PageCursor::new(&config);
        assert_eq!(cursor.page_count(), 1);
        assert_eq!(cursor.y(), config.content_top());
        assert!(cursor.at_page_top());
    }

    #[test]
    fn ensure_space_is_noop_when_it_fits() {
        let mut cursor = PageCursor::new(&PageConfig::default());
        cursor.advance(100.0);
        assert!(!cursor.ensure_space(50.0));
        assert_eq!(cursor.page_count(), 1);
    }

    #[test]
    fn ensure_space_breaks_when_it_does_not_fit() {
        let config = PageConfig::default();
        let mut cursor = PageCursor::new(&config);
        cursor.advance(config.content_height() - 10.0);
        assert!(cursor.ensure_space(20.0));
        assert_eq!(cursor.page_count(), 2);
        assert_eq!(cursor.y(), config.content_top());
    }

    #[test]
    fn exact_fit_does_not_break() {
        let config = PageConfig::default();
        let mut cursor = PageCursor::new(&config);
        cursor.advance(config.content_height() - 20.0);
        assert!(!cursor.ensure_space(20.0));
    }

    #[test]
    fn oversized_request_on_fresh_page_does_not_loop() {
        let config = PageConfig::default();
        let mut cursor = PageCursor::new(&config);
        assert!(!cursor.ensure_space(config.content_height() * 3.0));
        assert_eq!(cursor.page_count(), 1);
    }

    #[test]
    fn elements_land_on_current_page() {
        let config = PageConfig::default();
        let mut cursor = PageCursor::new(&config);
        cursor.push(line_at(cursor.y()));
        cursor.new_page();
        cursor.push(line_at(cursor.y()));
        cursor.push(line_at(cursor.y()));
        let pages = cursor.into_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].elements.len(), 1);
        assert_eq!(pages[1].elements.len(), 2);
    }
}
