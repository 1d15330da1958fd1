//! An in-memory surface that records every drawing call.
//!
//! Each page keeps an ordered display list that can be inspected in tests
//! or serialized to JSON (this is what the CLI writes). Text metrics come
//! from [`FontContext`], so measured widths match what a real writer using
//! the same fonts would produce.

use log::debug;
use serde::Serialize;

use super::{Canvas, DocumentSink, Point, Rect};
use crate::error::{Error, Result, ValidationError};
use crate::font::FontContext;
use crate::model::{Orientation, PageSize};
use crate::style::{
    Brush, Color, ConversionTable, DimensionUnit, FontStyle, HorizontalAlign, TextAlign, TextBrush,
    UnitContext, UnitFlags, VerticalAlign,
};

/// Margin on every side of the page, in millimeters.
pub const PAGE_MARGIN_MM: f64 = 10.0;

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Save,
    Restore,
    #[serde(rename_all = "camelCase")]
    SetFont {
        family: String,
        style: FontStyle,
        size: f64,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        area: Rect,
        /// Top-left corner of the text line after alignment inside `area`.
        origin: Point,
        text: String,
        family: String,
        style: FontStyle,
        size: f64,
        align: String,
        color: Color,
        brush: Brush,
    },
    Rectangle {
        rect: Rect,
        /// `F`, `D` or `FD`.
        paint: &'static str,
        brush: Brush,
    },
    Line {
        from: Point,
        to: Point,
        brush: Brush,
    },
    Circle {
        center: Point,
        radius: f64,
        paint: &'static str,
        brush: Brush,
    },
    Rotate {
        degrees: f64,
        origin: Point,
    },
    Bookmark {
        title: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordedPage {
    pub commands: Vec<DrawCommand>,
}

impl RecordedPage {
    /// Text of every text command, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn bookmarks(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Bookmark { title } => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// The part of the paint state saved and restored.
#[derive(Debug, Clone, PartialEq)]
struct Pen {
    family: String,
    style: FontStyle,
    size: f64,
}

/// A [`DocumentSink`] and [`Canvas`] backed by display lists.
pub struct RecordingSurface {
    unit: DimensionUnit,
    page: Rect,
    margin: f64,
    fonts: FontContext,
    font_names: Vec<String>,
    title: String,
    pages: Vec<RecordedPage>,
    open: bool,
    finished: bool,
    cursor: Point,
    pen: Pen,
    stack: Vec<Pen>,
}

impl RecordingSurface {
    pub fn new(size: PageSize, orientation: Orientation, unit: DimensionUnit) -> Result<Self> {
        let points = unit
            .points_per_unit()
            .ok_or(ValidationError::PercentDisplayUnit)?;
        let (w, h) = size.dimensions();
        let (w, h) = match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };
        let margin = ConversionTable::standard().convert(
            PAGE_MARGIN_MM,
            UnitFlags::LENGTH,
            DimensionUnit::Millimeter,
            unit,
            UnitContext::default(),
        )?;
        Ok(Self {
            unit,
            page: Rect::new(0.0, 0.0, w / points, h / points),
            margin,
            fonts: FontContext::new(),
            font_names: Vec::new(),
            title: String::new(),
            pages: Vec::new(),
            open: false,
            finished: false,
            cursor: Point::new(margin, margin),
            pen: Pen {
                family: "courier".to_string(),
                style: FontStyle::REGULAR,
                size: 12.0 / points,
            },
            stack: Vec::new(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Serialize the document's display lists.
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct DisplayList<'a> {
            title: &'a str,
            unit: DimensionUnit,
            width: f64,
            height: f64,
            fonts: &'a [String],
            pages: &'a [RecordedPage],
        }
        let list = DisplayList {
            title: &self.title,
            unit: self.unit,
            width: self.page.width,
            height: self.page.height,
            fonts: &self.font_names,
            pages: &self.pages,
        };
        Ok(serde_json::to_string_pretty(&list)?)
    }

    /// Where a line of `text` in the current font starts inside `area`.
    fn text_origin(&self, area: Rect, text: &str, align: &TextAlign) -> Point {
        let width = self.text_width(text);
        let height = self.line_height();
        let x = match align.horizontal() {
            HorizontalAlign::Left => area.x,
            HorizontalAlign::Center => area.x + (area.width - width) / 2.0,
            HorizontalAlign::Right => area.right() - width,
        };
        let y = match align.vertical() {
            VerticalAlign::Top => area.y,
            VerticalAlign::Middle => area.y + (area.height - height) / 2.0,
            VerticalAlign::Bottom | VerticalAlign::Baseline => area.bottom() - height,
        };
        Point::new(x, y)
    }

    fn record(&mut self, command: DrawCommand) -> Result<()> {
        if !self.open {
            return Err(Error::Render("no page is open".to_string()));
        }
        if let Some(page) = self.pages.last_mut() {
            page.commands.push(command);
        }
        Ok(())
    }
}

impl Canvas for RecordingSurface {
    fn save(&mut self) {
        self.stack.push(self.pen.clone());
        if self.open {
            if let Some(page) = self.pages.last_mut() {
                page.commands.push(DrawCommand::Save);
            }
        }
    }

    fn restore(&mut self) -> Result<()> {
        let pen = self
            .stack
            .pop()
            .ok_or_else(|| Error::Render("restore without a matching save".to_string()))?;
        self.pen = pen;
        if self.open {
            self.record(DrawCommand::Restore)?;
        }
        Ok(())
    }

    fn set_font(&mut self, family: &str, style: FontStyle, size: f64) -> Result<()> {
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::Render(format!("invalid font size {}", size)));
        }
        self.pen = Pen {
            family: family.to_string(),
            style,
            size,
        };
        self.record(DrawCommand::SetFont {
            family: family.to_string(),
            style,
            size,
        })
    }

    fn font_size(&self) -> f64 {
        self.pen.size
    }

    fn text_width(&self, text: &str) -> f64 {
        self.fonts
            .measure_string(text, &self.pen.family, self.pen.style, self.pen.size)
    }

    fn line_height(&self) -> f64 {
        self.pen.size
    }

    fn x(&self) -> f64 {
        self.cursor.x
    }

    fn y(&self) -> f64 {
        self.cursor.y
    }

    fn set_x(&mut self, x: f64) {
        self.cursor.x = x;
    }

    fn set_y(&mut self, y: f64) {
        self.cursor.y = y;
    }

    fn drawing_rect(&self) -> Rect {
        Rect::new(
            self.margin,
            self.margin,
            self.page.width - 2.0 * self.margin,
            self.page.height - 2.0 * self.margin,
        )
    }

    fn page_rect(&self) -> Rect {
        self.page
    }

    fn draw_text(&mut self, area: Rect, text: &str, brush: &TextBrush) -> Result<()> {
        let command = DrawCommand::Text {
            area,
            origin: self.text_origin(area, text, &brush.align),
            text: text.to_string(),
            family: self.pen.family.clone(),
            style: self.pen.style,
            size: self.pen.size,
            align: brush.align.to_string(),
            color: brush.brush.stroke_color,
            brush: brush.brush.clone(),
        };
        self.record(command)
    }

    fn draw_rect(&mut self, rect: Rect, brush: &Brush) -> Result<()> {
        self.record(DrawCommand::Rectangle {
            rect,
            paint: brush.draw_style(),
            brush: brush.clone(),
        })
    }

    fn draw_circle(&mut self, center: Point, radius: f64, brush: &Brush) -> Result<()> {
        self.record(DrawCommand::Circle {
            center,
            radius,
            paint: brush.draw_style(),
            brush: brush.clone(),
        })
    }

    fn draw_line(&mut self, from: Point, to: Point, brush: &Brush) -> Result<()> {
        self.record(DrawCommand::Line {
            from,
            to,
            brush: brush.clone(),
        })
    }

    fn rotate(&mut self, degrees: f64, origin: Point) -> Result<()> {
        self.record(DrawCommand::Rotate { degrees, origin })
    }
}

impl DocumentSink for RecordingSurface {
    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn add_font(&mut self, name: &str, style: FontStyle, data: Vec<u8>) -> Result<()> {
        if self.fonts.registry().contains(name, style) {
            debug!("replacing font `{}` ({})", name, style);
        }
        self.fonts.registry_mut().register(name, style, data);
        if !self.font_names.iter().any(|n| n == name) {
            self.font_names.push(name.to_string());
        }
        Ok(())
    }

    fn begin_page(&mut self) -> Result<()> {
        if self.finished {
            return Err(Error::Render("document is already finished".to_string()));
        }
        if self.open {
            return Err(Error::Render("previous page was not ended".to_string()));
        }
        self.pages.push(RecordedPage::default());
        self.open = true;
        self.cursor = Point::new(self.margin, self.margin);
        Ok(())
    }

    fn add_bookmark(&mut self, title: &str) -> Result<()> {
        self.record(DrawCommand::Bookmark {
            title: title.to_string(),
        })
    }

    fn end_page(&mut self) -> Result<()> {
        if !self.open {
            return Err(Error::Render("no page is open".to_string()));
        }
        if !self.stack.is_empty() {
            return Err(Error::Render(format!(
                "page ended with {} unrestored paint states",
                self.stack.len()
            )));
        }
        self.open = false;
        Ok(())
    }

    fn canvas(&mut self) -> &mut dyn Canvas {
        self
    }

    fn finish(&mut self) -> Result<()> {
        if self.open {
            return Err(Error::Render("cannot finish with an open page".to_string()));
        }
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> RecordingSurface {
        RecordingSurface::new(PageSize::A4, Orientation::Portrait, DimensionUnit::Millimeter).unwrap()
    }

    #[test]
    fn page_geometry_in_display_unit() {
        let s = a4();
        let page = s.page_rect();
        assert!((page.width - 210.0).abs() < 0.01);
        assert!((page.height - 297.0).abs() < 0.01);
        let dc = s.drawing_rect();
        assert!((dc.x - 10.0).abs() < 1e-9);
        assert!((dc.width - 190.0).abs() < 0.01);

        let s = RecordingSurface::new(PageSize::Letter, Orientation::Landscape, DimensionUnit::Inch)
            .unwrap();
        assert!((s.page_rect().width - 11.0).abs() < 1e-9);
        assert!((s.page_rect().height - 8.5).abs() < 1e-9);

        assert!(RecordingSurface::new(PageSize::A4, Orientation::Portrait, DimensionUnit::Percent)
            .is_err());
    }

    #[test]
    fn save_restore_is_lifo_and_excludes_cursor() {
        let mut s = a4();
        s.begin_page().unwrap();
        s.save();
        s.set_font("helvetica", FontStyle::BOLD, 5.0).unwrap();
        s.set_xy(50.0, 60.0);
        s.save();
        s.set_font("times", FontStyle::REGULAR, 3.0).unwrap();
        s.restore().unwrap();
        assert_eq!(s.font_size(), 5.0);
        s.restore().unwrap();
        assert!((s.font_size() - 12.0 * 25.4 / 72.0).abs() < 1e-9);
        assert_eq!((s.x(), s.y()), (50.0, 60.0));

        let err = s.restore().unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn page_sequence_is_enforced() {
        let mut s = a4();
        assert!(s.draw_line(Point::default(), Point::new(1.0, 1.0), &Brush::line()).is_err());
        s.begin_page().unwrap();
        assert!(s.begin_page().is_err());
        s.save();
        assert!(s.end_page().is_err());
        s.restore().unwrap();
        s.end_page().unwrap();
        s.finish().unwrap();
        assert!(s.begin_page().is_err());
    }

    #[test]
    fn records_commands_per_page() {
        let mut s = a4();
        s.set_title("Doc");
        s.begin_page().unwrap();
        s.add_bookmark("Page 0001").unwrap();
        let brush = TextBrush::defaults(DimensionUnit::Millimeter);
        s.draw_text(Rect::new(10.0, 10.0, 20.0, 5.0), "hello", &brush).unwrap();
        s.end_page().unwrap();
        s.finish().unwrap();

        assert_eq!(s.pages().len(), 1);
        assert_eq!(s.pages()[0].texts(), ["hello"]);
        assert_eq!(s.pages()[0].bookmarks(), ["Page 0001"]);

        let json: serde_json::Value = serde_json::from_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(json["title"], "Doc");
        assert_eq!(json["unit"], "mm");
        assert_eq!(json["pages"][0]["commands"][1]["op"], "text");
        assert_eq!(json["pages"][0]["commands"][1]["align"], "LM");
    }

    #[test]
    fn text_origin_follows_alignment() {
        let mut s = a4();
        s.begin_page().unwrap();
        s.set_font("courier", FontStyle::REGULAR, 10.0).unwrap();
        let area = Rect::new(10.0, 10.0, 40.0, 20.0);
        let mut brush = TextBrush::defaults(DimensionUnit::Millimeter);
        for (code, origin) in [
            ("LT", Point::new(10.0, 10.0)),
            ("CM", Point::new(15.0, 15.0)),
            ("RB", Point::new(20.0, 20.0)),
        ] {
            brush.align = TextAlign::parse(code).unwrap();
            s.draw_text(area, "abcde", &brush).unwrap();
            match s.pages()[0].commands.last() {
                Some(DrawCommand::Text { origin: got, .. }) => assert_eq!(*got, origin, "{}", code),
                other => panic!("expected text, got {:?}", other),
            }
        }
    }

    #[test]
    fn shapes_record_their_paint_operator() {
        let mut s = a4();
        s.begin_page().unwrap();
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        s.draw_rect(rect, &Brush::line()).unwrap();
        s.draw_rect(rect, &Brush::filled(Color::BLACK)).unwrap();
        let both = Brush {
            fill: true,
            ..Brush::line()
        };
        s.draw_circle(Point::new(1.0, 1.0), 1.0, &both).unwrap();
        let paints: Vec<&str> = s.pages()[0]
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rectangle { paint, .. } | DrawCommand::Circle { paint, .. } => Some(*paint),
                _ => None,
            })
            .collect();
        assert_eq!(paints, ["D", "F", "FD"]);
    }

    #[test]
    fn text_width_uses_current_font() {
        let mut s = a4();
        s.begin_page().unwrap();
        s.set_font("courier", FontStyle::REGULAR, 10.0).unwrap();
        assert!((s.text_width("abcd") - 24.0).abs() < 1e-9);
        assert_eq!(s.line_height(), 10.0);
    }
}
