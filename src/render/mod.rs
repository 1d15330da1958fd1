//! # Layout / Draw Emitter
//!
//! Walks a [`ResolvedDocument`] and issues drawing calls against a
//! [`DocumentSink`]. Layout is fixed-box and single pass: every cell is
//! placed at the surface cursor (or its own position when absolute), sized
//! from its explicit width/height or from its text, and the cursor then
//! advances according to the cell's display mode.
//!
//! Per page:
//!
//! ```text
//! begin page
//!   header cells       (vertically centred in the top margin)
//!   bookmark
//!   page background    (over the drawing area)
//!   page cells
//!   page border
//!   footer cells       (vertically centred in the bottom margin)
//!   watermark
//! end page
//! ```

use log::debug;

use crate::cascade::{ResolvedCell, ResolvedDocument, ResolvedPage, ResolvedSection, ResolvedWatermark};
use crate::error::{Result, ResultExt};
use crate::style::{
    Borders, Brush, CellDisplay, ConversionTable, DimensionUnit, FontStyle, Side, TextAlign,
    TextBrush, UnitContext, UnitFlags,
};
use crate::surface::{Canvas, DocumentSink, Point, Rect};

/// Bookmark title used when neither the page nor the document sets one.
pub const DEFAULT_BOOKMARK_TEMPLATE: &str = "Page ${page}";

/// Angle of the watermark text, counter-clockwise.
pub const WATERMARK_ANGLE: f64 = 45.0;

/// Replace `${page}` (1-based) and `${total}`, both zero-padded to 4 digits.
pub fn substitute(text: &str, page_index: usize, total: usize) -> String {
    if !text.contains("${") {
        return text.to_string();
    }
    text.replace("${page}", &format!("{:04}", page_index + 1))
        .replace("${total}", &format!("{:04}", total))
}

/// Where a cell is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Header,
    Page,
    Footer,
}

impl Placement {
    fn name(&self) -> &'static str {
        match self {
            Placement::Header => "header",
            Placement::Page => "page",
            Placement::Footer => "footer",
        }
    }
}

/// Run `draw` between a save and a restore of the canvas paint state.
fn painted<T, F>(canvas: &mut dyn Canvas, draw: F) -> Result<T>
where
    F: FnOnce(&mut dyn Canvas) -> Result<T>,
{
    canvas.save();
    let out = draw(&mut *canvas);
    canvas.restore()?;
    out
}

/// Stroke each present side of `borders` along the edges of `area`.
fn draw_borders(canvas: &mut dyn Canvas, borders: &Borders, area: Rect) -> Result<()> {
    let (left, top, right, bottom) = (area.x, area.y, area.right(), area.bottom());
    for (side, brush) in borders.iter() {
        let (from, to) = match side {
            Side::Left => (Point::new(left, top), Point::new(left, bottom)),
            Side::Top => (Point::new(left, top), Point::new(right, top)),
            Side::Right => (Point::new(right, top), Point::new(right, bottom)),
            Side::Bottom => (Point::new(left, bottom), Point::new(right, bottom)),
        };
        canvas.draw_line(from, to, brush)?;
    }
    Ok(())
}

/// Draws resolved documents.
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    conversions: &'a ConversionTable,
    unit: DimensionUnit,
}

impl<'a> Emitter<'a> {
    pub fn new(conversions: &'a ConversionTable, unit: DimensionUnit) -> Self {
        Self { conversions, unit }
    }

    /// Set the title and draw every page. Fonts must already be registered.
    pub fn emit<S>(&self, doc: &ResolvedDocument, sink: &mut S) -> Result<()>
    where
        S: DocumentSink + ?Sized,
    {
        sink.set_title(&doc.title);
        let total = doc.page_count();
        for page in &doc.pages {
            sink.begin_page()?;
            self.page(doc, page, total, sink)
                .with_context(|| format!("page {}", page.index))?;
            sink.end_page()?;
            debug!("emitted page {} of {}", page.index + 1, total);
        }
        Ok(())
    }

    fn page<S>(&self, doc: &ResolvedDocument, page: &ResolvedPage, total: usize, sink: &mut S) -> Result<()>
    where
        S: DocumentSink + ?Sized,
    {
        self.section(sink.canvas(), &doc.header, Placement::Header, page.index, total)
            .context("header")?;

        if doc.bookmarks {
            sink.add_bookmark(&bookmark_title(doc, page, total))?;
        }

        let canvas = sink.canvas();
        let dc = canvas.drawing_rect();
        if let Some(background) = &page.paint.background {
            canvas.draw_rect(dc, background)?;
        }

        canvas.set_xy(dc.x, dc.y);
        for (i, cell) in page.cells.iter().enumerate() {
            let text = substitute(&cell.text, page.index, total);
            self.cell(canvas, cell, &text, Placement::Page)
                .with_context(|| format!("cell {}", i))?;
        }

        let dc = canvas.drawing_rect();
        draw_borders(canvas, &page.paint.border, dc)?;

        self.section(canvas, &doc.footer, Placement::Footer, page.index, total)
            .context("footer")?;

        if let Some(watermark) = &doc.watermark {
            self.watermark(canvas, watermark).context("watermark")?;
        }
        Ok(())
    }

    fn section(
        &self,
        canvas: &mut dyn Canvas,
        section: &ResolvedSection,
        placement: Placement,
        page_index: usize,
        total: usize,
    ) -> Result<()> {
        let dc = canvas.drawing_rect();
        canvas.set_xy(dc.x, dc.y);
        for (i, cell) in section.cells.iter().enumerate() {
            let text = substitute(&cell.text, page_index, total);
            self.cell(canvas, cell, &text, placement)
                .with_context(|| format!("{} cell {}", placement.name(), i))?;
        }
        Ok(())
    }

    /// Font size of `brush` in the display unit. Percentages are taken of
    /// the canvas' current font size.
    fn font_size(&self, canvas: &dyn Canvas, brush: &TextBrush) -> Result<f64> {
        brush.font_size.resolve(
            self.conversions,
            UnitFlags::FONT_SIZE,
            self.unit,
            UnitContext::font_size(canvas.font_size()),
        )
    }

    /// Draw one cell and advance the cursor. Returns the cell's box.
    fn cell(
        &self,
        canvas: &mut dyn Canvas,
        cell: &ResolvedCell,
        text: &str,
        placement: Placement,
    ) -> Result<Rect> {
        let geometry = &cell.geometry;
        let absolute = placement == Placement::Page && geometry.absolute;

        let area = painted(canvas, |canvas| {
            let size = self.font_size(canvas, &cell.paint.text)?;
            let text_brush = &cell.paint.text;
            canvas.set_font(&text_brush.font_family, text_brush.font_style, size)?;

            let dc = canvas.drawing_rect();
            let width = match &geometry.width {
                Some(w) => w.resolve(
                    self.conversions,
                    UnitFlags::HORIZONTAL,
                    self.unit,
                    UnitContext::width(dc.width),
                )?,
                None => canvas.text_width(text),
            };
            let height = match &geometry.height {
                Some(h) => h.resolve(
                    self.conversions,
                    UnitFlags::VERTICAL,
                    self.unit,
                    UnitContext::height(dc.height),
                )?,
                None => canvas.line_height(),
            };

            let (mut x, mut y) = (canvas.x(), canvas.y());
            match placement {
                Placement::Header => y = dc.y / 2.0 - height / 2.0,
                Placement::Footer => {
                    let page = canvas.page_rect();
                    y = (dc.bottom() + page.bottom()) / 2.0 - height / 2.0;
                }
                Placement::Page if absolute => {
                    let page = canvas.page_rect();
                    if let Some(left) = &geometry.left {
                        x = left.resolve(
                            self.conversions,
                            UnitFlags::HORIZONTAL,
                            self.unit,
                            UnitContext::width(page.width),
                        )?;
                    }
                    if let Some(top) = &geometry.top {
                        y = top.resolve(
                            self.conversions,
                            UnitFlags::VERTICAL,
                            self.unit,
                            UnitContext::height(page.height),
                        )?;
                    }
                }
                Placement::Page => {}
            }

            let area = Rect::new(x, y, width, height);
            if let Some(background) = &cell.paint.background {
                canvas.draw_rect(area, background)?;
            }
            canvas.draw_text(area, text, text_brush)?;
            draw_borders(canvas, &cell.paint.border, area)?;
            Ok(area)
        })?;

        if !absolute {
            advance(canvas, cell.paint.text.display, area);
        }
        Ok(area)
    }

    /// Letter-spaced, bold, rotated around the centre of the drawing area
    /// and framed in the watermark colour.
    fn watermark(&self, canvas: &mut dyn Canvas, watermark: &ResolvedWatermark) -> Result<()> {
        let spaced = watermark
            .text
            .chars()
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ");

        painted(canvas, |canvas| {
            let mut brush = watermark.brush.clone();
            brush.font_style = brush.font_style.merge(FontStyle::BOLD);
            brush.align = TextAlign::parse("CM")?;

            let size = self.font_size(canvas, &brush)?;
            canvas.set_font(&brush.font_family, brush.font_style, size)?;

            let center = canvas.drawing_rect().center();
            canvas.rotate(WATERMARK_ANGLE, center)?;

            let (w, h) = (canvas.text_width(&spaced), canvas.line_height());
            let area = Rect::new(center.x - w / 2.0, center.y - h / 2.0, w, h);
            canvas.draw_text(area, &spaced, &brush)?;

            let frame = Brush {
                stroke_color: brush.brush.stroke_color,
                ..Brush::line()
            };
            canvas.draw_rect(area, &frame)
        })
    }
}

fn bookmark_title(doc: &ResolvedDocument, page: &ResolvedPage, total: usize) -> String {
    let template = if !page.bookmark_title.is_empty() {
        page.bookmark_title.as_str()
    } else if !doc.page_bookmark_template.is_empty() {
        doc.page_bookmark_template.as_str()
    } else {
        DEFAULT_BOOKMARK_TEMPLATE
    };
    substitute(template, page.index, total)
}

/// Move the cursor past `area`.
fn advance(canvas: &mut dyn Canvas, display: CellDisplay, area: Rect) {
    match display {
        CellDisplay::Column => canvas.set_xy(area.right(), area.y),
        CellDisplay::Row => {
            let left = canvas.drawing_rect().x;
            canvas.set_xy(left, area.bottom());
        }
        CellDisplay::Stack => canvas.set_xy(area.x, area.bottom()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{HandlerTable, Resolver};
    use crate::model::{Attribute, Cell, Document, Page};
    use crate::surface::{DrawCommand, RecordingSurface};

    fn attr(name: &str, value: &str) -> Attribute {
        Attribute::new(name, value)
    }

    fn cell(text: &str, attrs: &[(&str, &str)]) -> Cell {
        let mut cell = Cell::new(text);
        cell.element.attributes = attrs.iter().map(|(n, v)| attr(n, v)).collect();
        cell
    }

    fn doc_with(cells: Vec<Cell>) -> Document {
        let mut doc = Document::default();
        doc.pages.push(Page {
            cells,
            ..Default::default()
        });
        doc
    }

    fn render(doc: &Document) -> Result<RecordingSurface> {
        let conversions = ConversionTable::standard();
        let handlers = HandlerTable::standard();
        let resolved = Resolver::new(&conversions, &handlers).resolve(doc)?;
        let mut surface = RecordingSurface::new(doc.size, doc.orientation, doc.units)?;
        Emitter::new(&conversions, doc.units).emit(&resolved, &mut surface)?;
        surface.finish()?;
        Ok(surface)
    }

    fn text_areas(surface: &RecordingSurface, page: usize) -> Vec<(String, Rect)> {
        surface.pages()[page]
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, area, .. } => Some((text.clone(), *area)),
                _ => None,
            })
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn substitute_pads_to_four_digits() {
        assert_eq!(substitute("Page ${page} of ${total}", 0, 12), "Page 0001 of 0012");
        assert_eq!(substitute("plain", 3, 4), "plain");
    }

    #[test]
    fn width_falls_back_to_measured_text_at_cascaded_font() {
        let doc = doc_with(vec![cell(
            "Hello",
            &[("font-family", "helvetica"), ("font-size", "5mm")],
        )]);
        let surface = render(&doc).unwrap();
        let (_, area) = &text_areas(&surface, 0)[0];
        // H e l l o = 722 + 556 + 222 + 222 + 556
        assert!(close(area.width, 2278.0 * 5.0 / 1000.0), "{}", area.width);
        assert!(close(area.height, 5.0));
    }

    #[test]
    fn explicit_dimensions_resolve_against_the_drawing_area() {
        let doc = doc_with(vec![cell("x", &[("width", "50%"), ("height", "2cm")])]);
        let surface = render(&doc).unwrap();
        let (_, area) = &text_areas(&surface, 0)[0];
        let dc_width = 595.28 * 25.4 / 72.0 - 20.0;
        assert!(close(area.width, dc_width / 2.0));
        assert!(close(area.height, 20.0));
        assert!(close(area.x, 10.0) && close(area.y, 10.0));
    }

    #[test]
    fn display_modes_move_the_cursor() {
        let doc = doc_with(vec![
            cell("a", &[("width", "20mm"), ("height", "5mm")]),
            cell("b", &[("width", "30mm"), ("height", "5mm"), ("display", "stack")]),
            cell("c", &[("width", "10mm"), ("height", "6mm"), ("display", "row")]),
            cell("d", &[("width", "10mm"), ("height", "5mm")]),
        ]);
        let surface = render(&doc).unwrap();
        let areas = text_areas(&surface, 0);
        let at = |i: usize| (areas[i].1.x, areas[i].1.y);

        assert_eq!(at(0), (10.0, 10.0));
        // column: to the right of a
        assert_eq!(at(1), (30.0, 10.0));
        // stack: straight below b
        assert_eq!(at(2), (30.0, 15.0));
        // row: next line at the left edge
        assert_eq!(at(3), (10.0, 21.0));
    }

    #[test]
    fn absolute_cells_use_their_own_position_and_keep_the_cursor() {
        let doc = doc_with(vec![
            cell("pinned", &[("absolute", "true"), ("left", "50mm"), ("top", "10%"), ("width", "5mm")]),
            cell("flow", &[("width", "5mm")]),
        ]);
        let surface = render(&doc).unwrap();
        let areas = text_areas(&surface, 0);
        assert!(close(areas[0].1.x, 50.0));
        assert!(close(areas[0].1.y, 841.89 * 25.4 / 72.0 * 0.1));
        assert_eq!((areas[1].1.x, areas[1].1.y), (10.0, 10.0));
    }

    #[test]
    fn percent_font_size_is_relative_to_the_parent() {
        let mut doc = doc_with(vec![cell("x", &[("font-size", "50%")])]);
        doc.pages[0].element.attributes.push(attr("font-size", "8mm"));
        let surface = render(&doc).unwrap();
        let sizes: Vec<f64> = surface.pages()[0]
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { size, .. } => Some(*size),
                _ => None,
            })
            .collect();
        assert!(close(sizes[0], 4.0));
    }

    #[test]
    fn background_text_then_borders() {
        let doc = doc_with(vec![cell(
            "boxed",
            &[
                ("background-color", "eeeeee"),
                ("border-bottom-width", "0.5"),
                ("width", "40mm"),
                ("height", "8mm"),
            ],
        )]);
        let surface = render(&doc).unwrap();
        let ops: Vec<&DrawCommand> = surface.pages()[0]
            .commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    DrawCommand::Rectangle { .. } | DrawCommand::Text { .. } | DrawCommand::Line { .. }
                )
            })
            .collect();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], DrawCommand::Rectangle { brush, .. } if brush.fill));
        assert!(matches!(ops[1], DrawCommand::Text { .. }));
        match ops[2] {
            DrawCommand::Line { from, to, brush } => {
                assert_eq!(brush.stroke_width, 0.5);
                assert!(close(from.y, 18.0) && close(to.y, 18.0));
                assert!(close(to.x - from.x, 40.0));
            }
            other => panic!("expected a line, got {:?}", other),
        }
    }

    #[test]
    fn page_border_follows_the_drawing_area() {
        let mut doc = doc_with(vec![cell("x", &[])]);
        doc.pages[0].element.attributes.push(attr("border-width", "1"));
        let surface = render(&doc).unwrap();
        let lines: Vec<(Point, Point)> = surface.pages()[0]
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].0, Point::new(10.0, 10.0));
    }

    #[test]
    fn header_and_footer_repeat_with_page_numbers() {
        let mut doc = doc_with(vec![cell("one", &[])]);
        doc.pages.push(Page {
            cells: vec![cell("two", &[])],
            ..Default::default()
        });
        doc.header.cells.push(cell("Page ${page} of ${total}", &[("height", "4mm")]));
        doc.footer.cells.push(cell("footer", &[("height", "4mm")]));

        let surface = render(&doc).unwrap();
        assert_eq!(surface.pages().len(), 2);
        assert_eq!(surface.pages()[1].texts(), ["Page 0002 of 0002", "two", "footer"]);

        let areas = text_areas(&surface, 0);
        // centred in the 10mm margins
        assert!(close(areas[0].1.y, 3.0));
        let page_height = 841.89 * 25.4 / 72.0;
        assert!(close(areas[2].1.y, page_height - 5.0 - 2.0));
    }

    #[test]
    fn bookmarks_prefer_page_title_then_template() {
        let mut doc = doc_with(vec![]);
        doc.pages.push(Page::default());
        doc.pages[0].element.bookmark_title = "Summary".into();
        doc.bookmarks = true;

        let surface = render(&doc).unwrap();
        assert_eq!(surface.pages()[0].bookmarks(), ["Summary"]);
        assert_eq!(surface.pages()[1].bookmarks(), ["Page 0002"]);

        doc.page_bookmark_template = "Sheet ${page}/${total}".into();
        let surface = render(&doc).unwrap();
        assert_eq!(surface.pages()[1].bookmarks(), ["Sheet 0002/0002"]);

        doc.bookmarks = false;
        let surface = render(&doc).unwrap();
        assert!(surface.pages()[0].bookmarks().is_empty());
    }

    #[test]
    fn watermark_is_rotated_spaced_and_bold() {
        let mut doc = doc_with(vec![cell("body", &[])]);
        doc.watermark.text = "DRAFT".into();
        doc.watermark.attributes.push(attr("font-color", "#80ff0000"));

        let surface = render(&doc).unwrap();
        let cmds = &surface.pages()[0].commands;
        let rotate = cmds
            .iter()
            .position(|c| matches!(c, DrawCommand::Rotate { degrees, .. } if *degrees == 45.0))
            .expect("rotate");
        match &cmds[rotate + 1] {
            DrawCommand::Text { text, style, color, align, .. } => {
                assert_eq!(text, "D R A F T");
                assert!(style.is_bold());
                assert_eq!(color.rgb, 0xFF0000);
                assert_eq!(align, "CM");
            }
            other => panic!("expected watermark text, got {:?}", other),
        }
        assert!(matches!(&cmds[rotate + 2], DrawCommand::Rectangle { brush, .. } if brush.stroke_color.rgb == 0xFF0000));
        assert_eq!(cmds.last(), Some(&DrawCommand::Restore));
    }

    #[test]
    fn paint_state_is_balanced_per_page() {
        let doc = doc_with(vec![cell("a", &[("font-size", "9mm")]), cell("b", &[])]);
        let surface = render(&doc).unwrap();
        let cmds = &surface.pages()[0].commands;
        let saves = cmds.iter().filter(|c| **c == DrawCommand::Save).count();
        let restores = cmds.iter().filter(|c| **c == DrawCommand::Restore).count();
        assert_eq!(saves, 2);
        assert_eq!(saves, restores);

        // the first cell's font does not leak into the second
        let sizes: Vec<f64> = cmds
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetFont { size, .. } => Some(*size),
                _ => None,
            })
            .collect();
        assert!(close(sizes[0], 9.0));
        assert!(close(sizes[1], 12.0 * 25.4 / 72.0));
    }
}
