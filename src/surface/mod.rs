//! # Drawing Surface
//!
//! The abstract target the emitter draws onto. A [`DocumentSink`] owns the
//! document-level state (title, fonts, bookmarks, page sequence) and hands
//! out a [`Canvas`] for the current page.
//!
//! All coordinates and lengths are in the document's display unit, with the
//! origin at the top-left corner of the page and y growing downwards.
//!
//! The canvas keeps a cursor and a paint state (current font, rotation).
//! `save`/`restore` push and pop the paint state only; the cursor is never
//! part of it.

pub mod recording;

pub use recording::{DrawCommand, RecordedPage, RecordingSurface};

use serde::Serialize;

use crate::error::Result;
use crate::style::{Brush, FontStyle, TextBrush};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
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

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One page's drawing operations.
pub trait Canvas {
    /// Push the current paint state.
    fn save(&mut self);

    /// Pop the paint state pushed by the matching [`Canvas::save`].
    /// Fails when nothing was saved.
    fn restore(&mut self) -> Result<()>;

    /// Select a font. `size` is in the display unit.
    fn set_font(&mut self, family: &str, style: FontStyle, size: f64) -> Result<()>;

    /// The current font size, in the display unit.
    fn font_size(&self) -> f64;

    /// Width of `text` in the current font.
    fn text_width(&self, text: &str) -> f64;

    /// Height of one line in the current font.
    fn line_height(&self) -> f64;

    fn x(&self) -> f64;
    fn y(&self) -> f64;
    fn set_x(&mut self, x: f64);
    fn set_y(&mut self, y: f64);

    fn set_xy(&mut self, x: f64, y: f64) {
        self.set_x(x);
        self.set_y(y);
    }

    /// The page minus its margins.
    fn drawing_rect(&self) -> Rect;

    /// The whole page.
    fn page_rect(&self) -> Rect;

    /// Typeset `text` inside `area` using the brush's colour, alignment and
    /// stroke settings and the current font.
    fn draw_text(&mut self, area: Rect, text: &str, brush: &TextBrush) -> Result<()>;

    fn draw_rect(&mut self, rect: Rect, brush: &Brush) -> Result<()>;

    fn draw_circle(&mut self, center: Point, radius: f64, brush: &Brush) -> Result<()>;

    fn draw_line(&mut self, from: Point, to: Point, brush: &Brush) -> Result<()>;

    /// Rotate subsequent drawing by `degrees` counter-clockwise around `origin`
    /// until the paint state is restored.
    fn rotate(&mut self, degrees: f64, origin: Point) -> Result<()>;
}

/// A paginated output document.
pub trait DocumentSink {
    fn set_title(&mut self, title: &str);

    /// Register a font under `name`/`style` before it is selected.
    fn add_font(&mut self, name: &str, style: FontStyle, data: Vec<u8>) -> Result<()>;

    /// Start a new page and place the cursor at the top-left of its
    /// drawing area.
    fn begin_page(&mut self) -> Result<()>;

    /// Attach an outline entry pointing at the current page.
    fn add_bookmark(&mut self, title: &str) -> Result<()>;

    fn end_page(&mut self) -> Result<()>;

    /// The canvas of the current page.
    fn canvas(&mut self) -> &mut dyn Canvas;

    /// Complete the document. No page may be open.
    fn finish(&mut self) -> Result<()>;
}
