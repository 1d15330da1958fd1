//! Fluent construction of documents.
//!
//! ```no_run
//! use reportgen::builder::{AttributeContainer, DocumentBuilder};
//! use reportgen::model::{Orientation, PageSize};
//! use reportgen::style::DimensionUnit;
//!
//! let template = DocumentBuilder::new(Orientation::Portrait, PageSize::A4, DimensionUnit::Millimeter)
//!     .title("Monthly statement")
//!     .style("total", [("font-style", "bold"), ("border-top-width", "0.3")])
//!     .page(|page| {
//!         page.cell(|cell| cell.text("Total").attribute("width", "50%"))
//!             .cell(|cell| cell.text("1,024.00").style_list(["total"]))
//!     })
//!     .build()?;
//! # Ok::<(), reportgen::Error>(())
//! ```
//!
//! Setting an attribute that already exists on the same element replaces
//! its value (names compare case-insensitively). Adding to a style that
//! already exists appends to it.

use std::path::Path;

use crate::error::Result;
use crate::model::{
    Attribute, Cell, Document, FontEntry, FontSource, Orientation, Page, PageSize, Section,
    Watermark,
};
use crate::style::{DimensionUnit, FontStyle};
use crate::template::Template;

/// Shared attribute and style-list setters.
pub trait AttributeContainer: Sized {
    fn attribute_list(&mut self) -> &mut Vec<Attribute>;
    fn style_names(&mut self) -> &mut Vec<String>;

    /// Set one inline attribute.
    fn attribute(mut self, name: &str, value: &str) -> Self {
        Attribute::upsert(self.attribute_list(), name, value);
        self
    }

    /// Set several inline attributes, in order.
    fn attributes<I, K, V>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in attrs {
            Attribute::upsert(self.attribute_list(), name.as_ref(), value.as_ref());
        }
        self
    }

    /// Append style names to the element's style list.
    fn style_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.style_names().extend(names.into_iter().map(Into::into));
        self
    }
}

macro_rules! element_container {
    ($ty:ty, $($field:ident).+) => {
        impl AttributeContainer for $ty {
            fn attribute_list(&mut self) -> &mut Vec<Attribute> {
                &mut self.$($field).+.attributes
            }

            fn style_names(&mut self) -> &mut Vec<String> {
                &mut self.$($field).+.style_list
            }
        }
    };
}

/// Builds a cell of a page, header or footer.
#[derive(Debug, Default)]
pub struct CellBuilder {
    cell: Cell,
}

impl CellBuilder {
    pub fn text(mut self, text: &str) -> Self {
        self.cell.text = text.to_string();
        self
    }
}

element_container!(CellBuilder, cell.element);

fn build_cell<F>(f: F) -> Cell
where
    F: FnOnce(CellBuilder) -> CellBuilder,
{
    f(CellBuilder::default()).cell
}

#[derive(Debug, Default)]
pub struct PageBuilder {
    page: Page,
}

impl PageBuilder {
    pub fn cell<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CellBuilder) -> CellBuilder,
    {
        self.page.cells.push(build_cell(f));
        self
    }

    pub fn bookmark_title(mut self, title: &str) -> Self {
        self.page.element.bookmark_title = title.to_string();
        self
    }
}

element_container!(PageBuilder, page.element);

/// Builds the header or the footer.
#[derive(Debug, Default)]
pub struct SectionBuilder {
    section: Section,
}

impl SectionBuilder {
    pub fn cell<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CellBuilder) -> CellBuilder,
    {
        self.section.cells.push(build_cell(f));
        self
    }
}

element_container!(SectionBuilder, section.element);

#[derive(Debug, Default)]
pub struct WatermarkBuilder {
    watermark: Watermark,
}

impl AttributeContainer for WatermarkBuilder {
    fn attribute_list(&mut self) -> &mut Vec<Attribute> {
        &mut self.watermark.attributes
    }

    fn style_names(&mut self) -> &mut Vec<String> {
        &mut self.watermark.style_list
    }
}

/// Builds a [`Document`] and turns it into a [`Template`].
#[derive(Debug)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    pub fn new(orientation: Orientation, size: PageSize, units: DimensionUnit) -> Self {
        Self {
            document: Document::new(orientation, size, units),
        }
    }

    /// Shorthand for the `title` attribute.
    pub fn title(self, title: &str) -> Self {
        self.attribute("title", title)
    }

    /// Create a named style, or append attributes to an existing one.
    pub fn style<I, K, V>(mut self, name: &str, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let attrs = attrs
            .into_iter()
            .map(|(k, v)| Attribute::new(k.as_ref(), v.as_ref()));
        self.document.styles.add_style(name, attrs);
        self
    }

    pub fn show_bookmarks(mut self, show: bool) -> Self {
        self.document.bookmarks = show;
        self
    }

    /// Template for page bookmarks; `${page}` and `${total}` are substituted.
    pub fn page_bookmark_template(mut self, template: &str) -> Self {
        self.document.page_bookmark_template = template.to_string();
        self
    }

    /// Register a font read from `path` at render time.
    pub fn font_from_file(mut self, family: &str, style: FontStyle, path: impl AsRef<Path>) -> Self {
        self.document.fonts.push(FontEntry {
            data: FontSource::File(path.as_ref().to_path_buf()),
            name: family.to_string(),
            style,
        });
        self
    }

    /// Register a font embedded in the document.
    pub fn font_from_bytes(mut self, family: &str, style: FontStyle, data: &[u8]) -> Self {
        let hex: String = data.iter().map(|b| format!("{:02x}", b)).collect();
        self.document.fonts.push(FontEntry {
            data: FontSource::Embedded(hex),
            name: family.to_string(),
            style,
        });
        self
    }

    pub fn page<F>(mut self, f: F) -> Self
    where
        F: FnOnce(PageBuilder) -> PageBuilder,
    {
        self.document.pages.push(f(PageBuilder::default()).page);
        self
    }

    /// Edit the header. Repeated calls keep editing the same header.
    pub fn header<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SectionBuilder) -> SectionBuilder,
    {
        let section = std::mem::take(&mut self.document.header);
        self.document.header = f(SectionBuilder { section }).section;
        self
    }

    /// Edit the footer. Repeated calls keep editing the same footer.
    pub fn footer<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SectionBuilder) -> SectionBuilder,
    {
        let section = std::mem::take(&mut self.document.footer);
        self.document.footer = f(SectionBuilder { section }).section;
        self
    }

    pub fn watermark<F>(mut self, text: &str, f: F) -> Self
    where
        F: FnOnce(WatermarkBuilder) -> WatermarkBuilder,
    {
        let mut watermark = std::mem::take(&mut self.document.watermark);
        watermark.text = text.to_string();
        self.document.watermark = f(WatermarkBuilder { watermark }).watermark;
        self
    }

    /// The document built so far.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Validate and resolve the document.
    pub fn build(self) -> Result<Template> {
        Template::new(self.document)
    }
}

impl AttributeContainer for DocumentBuilder {
    fn attribute_list(&mut self) -> &mut Vec<Attribute> {
        &mut self.document.element.attributes
    }

    fn style_names(&mut self) -> &mut Vec<String> {
        &mut self.document.element.style_list
    }
}

impl From<DocumentBuilder> for Document {
    fn from(builder: DocumentBuilder) -> Self {
        builder.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(Orientation::Portrait, PageSize::A4, DimensionUnit::Millimeter)
    }

    #[test]
    fn attributes_replace_case_insensitively() {
        let doc: Document = builder()
            .attribute("font-color", "#000000")
            .attribute("FONT-COLOR", "#ff0000")
            .title("One")
            .title("Two")
            .into();
        assert_eq!(doc.element.attributes.len(), 2);
        assert_eq!(doc.element.attribute("FONT-COLOR"), Some("#ff0000"));
        assert_eq!(doc.element.attribute("title"), Some("Two"));
    }

    #[test]
    fn styles_append() {
        let doc: Document = builder()
            .style("a", [("font-size", "3mm")])
            .style("a", [("font-color", "#00ff00")])
            .into();
        assert_eq!(doc.styles.get("a").unwrap().attributes.len(), 2);
    }

    #[test]
    fn build_requires_a_page() {
        let err = builder().build().unwrap_err();
        assert_eq!(err.as_validation(), Some(&ValidationError::NoPages));
    }

    #[test]
    fn builds_the_whole_tree() {
        let template = builder()
            .title("Report")
            .show_bookmarks(true)
            .page_bookmark_template("Part ${page}")
            .style("head", [("font-style", "bold")])
            .header(|h| h.cell(|c| c.text("Header").style_list(["head"])))
            .footer(|f| f.attribute("font-size", "3mm").cell(|c| c.text("${page}/${total}")))
            .watermark("COPY", |w| w.attribute("font-color", "#20000000"))
            .page(|p| {
                p.bookmark_title("Intro")
                    .cell(|c| c.text("a").attributes([("width", "20mm"), ("display", "row")]))
                    .cell(|c| c.text("b"))
            })
            .page(|p| p)
            .build()
            .unwrap();

        let doc = template.document();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].element.bookmark_title, "Intro");
        assert_eq!(doc.header.cells[0].element.style_list, ["head"]);
        assert_eq!(doc.watermark.text, "COPY");

        let resolved = template.resolved();
        assert_eq!(resolved.title, "Report");
        assert!(resolved.header.cells[0].paint.text.font_style.is_bold());
        assert!((resolved.footer.cells[0].paint.text.font_size.value - 3.0).abs() < 1e-9);
        assert!(resolved.watermark.is_some());
    }

    #[test]
    fn header_edits_accumulate() {
        let doc: Document = builder()
            .header(|h| h.cell(|c| c.text("left")))
            .header(|h| h.cell(|c| c.text("right")))
            .into();
        assert_eq!(doc.header.cells.len(), 2);
    }

    #[test]
    fn embedded_fonts_are_hex_encoded() {
        let doc: Document = builder()
            .font_from_bytes("Brand", FontStyle::BOLD, &[0x00, 0xAB, 0xFF])
            .into();
        assert_eq!(doc.fonts[0].data, FontSource::Embedded("00abff".into()));
        assert_eq!(doc.fonts[0].data.load().unwrap(), vec![0x00, 0xAB, 0xFF]);
    }
}
