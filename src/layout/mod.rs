//! # Page-Aware Layout
//!
//! Content is drawn *into* pages, never onto an infinite canvas that gets
//! sliced afterwards. Before placing anything of known height a renderer asks
//! the cursor for space; if the current page cannot hold it, the cursor opens
//! a fresh page and the element lands at the top of that one.
//!
//! Coordinates here use a top-left origin in points. The PDF serializer flips
//! them into PDF's bottom-left space.
//!
//! A page carries two element layers. `elements` is the content flow, which
//! always stays between the content top and bottom. `chrome` holds the
//! running header and footer, painted in a second pass once the final page
//! count is known.

pub mod cursor;

pub use cursor::PageCursor;

use crate::font::StandardFont;
use crate::form::InteractiveField;
use crate::style::Color;

/// An axis-aligned box, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    /// Content flow elements.
    pub elements: Vec<LayoutElement>,
    /// Running header/footer elements.
    pub chrome: Vec<LayoutElement>,
    /// Fillable widgets placed on this page.
    pub fields: Vec<InteractiveField>,
}

impl LayoutPage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
            chrome: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// All text drawn on the page, content then chrome, one entry per line.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.elements
            .iter()
            .chain(self.chrome.iter())
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { lines, .. } => Some(lines.iter()),
                _ => None,
            })
            .flatten()
            .map(|line| line.text.as_str())
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

impl LayoutElement {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// What to actually draw for an element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// A filled and/or stroked rectangle; `radius` rounds the corners (a
    /// square with radius = half its side is a circle).
    Rect {
        fill: Option<Color>,
        stroke: Option<Color>,
        stroke_width: f64,
        radius: f64,
    },
    /// A straight line from (x, y) to (x + width, y + height).
    Line { color: Color, line_width: f64 },
    /// One or more lines of text.
    Text { lines: Vec<TextLine>, color: Color },
    /// An embedded image, by index into the document's image list.
    Image { image_index: usize },
}

/// A single run of text. `y` is the baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font: StandardFont,
    pub font_size: f64,
}
