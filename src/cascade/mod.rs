//! # Cascade Resolver
//!
//! Turns a [`Document`] into a [`ResolvedDocument`]: every element's final
//! paint state, computed top-down in document order.
//!
//! Per element:
//!
//! ```text
//! parent PaintState ──inherit──▶ snapshot
//!                                   │
//! style_list attrs ++ inline attrs ─┼─ handler ─▶ Delta ─┐
//!                                   ▼                    │
//!                              reduce(snapshot, deltas) ◀┘
//!                                   │
//!                                   ▼
//!                              ElementState
//! ```
//!
//! Walk order is document, watermark, header (+ cells), footer (+ cells),
//! then pages in order (+ cells). The first error aborts the walk and is
//! returned with a breadcrumb naming the element and attribute.

pub mod handlers;
pub mod state;

pub use handlers::{Handler, HandlerTable};
pub use state::{CellGeometry, Delta, ElementState, Reducer};

use log::{debug, trace};
use serde::Serialize;

use crate::error::{Error, ResultExt, ValidationError};
use crate::model::{Attribute, Cell, Document, Element, ElementKind, Orientation, PageSize};
use crate::style::{ConversionTable, DimensionUnit, PaintState, TextBrush};

/// A cell with its final paint and geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCell {
    pub text: String,
    pub paint: PaintState,
    #[serde(skip)]
    pub geometry: CellGeometry,
}

/// A resolved header or footer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSection {
    pub paint: PaintState,
    pub cells: Vec<ResolvedCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPage {
    /// Position in the document, 0-based.
    pub index: usize,
    pub paint: PaintState,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bookmark_title: String,
    pub cells: Vec<ResolvedCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedWatermark {
    pub text: String,
    pub brush: TextBrush,
}

/// The immutable output of a resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDocument {
    pub title: String,
    pub unit: DimensionUnit,
    #[serde(skip)]
    pub size: PageSize,
    #[serde(skip)]
    pub orientation: Orientation,
    pub paint: PaintState,
    /// `None` when the watermark has no text.
    pub watermark: Option<ResolvedWatermark>,
    pub header: ResolvedSection,
    pub footer: ResolvedSection,
    pub pages: Vec<ResolvedPage>,
    pub bookmarks: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub page_bookmark_template: String,
}

impl ResolvedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Resolves documents against a fixed pair of tables.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    conversions: &'a ConversionTable,
    handlers: &'a HandlerTable,
}

impl<'a> Resolver<'a> {
    pub fn new(conversions: &'a ConversionTable, handlers: &'a HandlerTable) -> Self {
        Self {
            conversions,
            handlers,
        }
    }

    /// Validate `doc` and compute every element's paint state.
    pub fn resolve(&self, doc: &Document) -> Result<ResolvedDocument, Error> {
        doc.validate()?;

        let reducer = Reducer {
            conversions: self.conversions,
            unit: doc.units,
        };
        let cx = Walk {
            doc,
            handlers: self.handlers,
            reducer,
        };

        let root = cx
            .element(
                ElementState::with_paint(ElementKind::Document, PaintState::defaults(doc.units)),
                &doc.element.style_list,
                &doc.element.attributes,
            )
            .context("document")?;
        let title = root.title.clone().unwrap_or_default();
        debug!("resolved document `{}`", title);

        // the watermark starts from the document's final text style
        let wm = cx
            .element(
                ElementState::with_paint(
                    ElementKind::Watermark,
                    PaintState {
                        text: root.paint.text.clone(),
                        ..PaintState::defaults(doc.units)
                    },
                ),
                &doc.watermark.style_list,
                &doc.watermark.attributes,
            )
            .context("document watermark")?;
        let watermark = (!doc.watermark.text.is_empty()).then(|| ResolvedWatermark {
            text: doc.watermark.text.clone(),
            brush: wm.paint.text,
        });

        let header = cx
            .section(ElementKind::Header, &doc.header.element, &doc.header.cells, &root.paint)
            .context("header")?;
        let footer = cx
            .section(ElementKind::Footer, &doc.footer.element, &doc.footer.cells, &root.paint)
            .context("footer")?;

        let mut pages = Vec::with_capacity(doc.pages.len());
        for (index, page) in doc.pages.iter().enumerate() {
            let resolved = cx
                .page(index, &page.element, &page.cells, &root.paint)
                .with_context(|| format!("page {}", index))?;
            pages.push(resolved);
        }

        Ok(ResolvedDocument {
            title,
            unit: doc.units,
            size: doc.size,
            orientation: doc.orientation,
            paint: root.paint,
            watermark,
            header,
            footer,
            pages,
            bookmarks: doc.bookmarks,
            page_bookmark_template: doc.page_bookmark_template.clone(),
        })
    }
}

/// State shared by one resolution pass.
struct Walk<'a> {
    doc: &'a Document,
    handlers: &'a HandlerTable,
    reducer: Reducer<'a>,
}

impl Walk<'_> {
    /// Merge style-list and inline attributes, parse them, and reduce.
    fn element(
        &self,
        inherited: ElementState,
        style_list: &[String],
        inline: &[Attribute],
    ) -> Result<ElementState, Error> {
        let kind = inherited.kind;
        let merged = self.doc.styles.resolve_style_list(style_list)?;

        let mut deltas = Vec::with_capacity(merged.len() + inline.len());
        for attr in merged.into_iter().chain(inline) {
            let matched = self.handlers.lookup(kind, &attr.name);
            if matched.is_empty() {
                return Err(ValidationError::UnsupportedAttribute(attr.name.clone()).into());
            }
            for handler in matched.iter() {
                let delta = handler(&attr.value)
                    .with_context(|| format!("attribute `{}`", attr.name))?;
                trace!("{}: {} = {:?}", kind, attr.name, delta);
                deltas.push((attr.name.as_str(), delta));
            }
        }

        deltas
            .into_iter()
            .try_fold(inherited, |state, (name, delta)| {
                state
                    .apply(delta, &self.reducer)
                    .with_context(|| format!("attribute `{}`", name))
            })
    }

    fn cell(&self, cell: &Cell, parent: &PaintState) -> Result<ResolvedCell, Error> {
        let state = self.element(
            ElementState::inherit(ElementKind::Cell, parent),
            &cell.element.style_list,
            &cell.element.attributes,
        )?;
        Ok(ResolvedCell {
            text: cell.text.clone(),
            paint: state.paint,
            geometry: state.geometry,
        })
    }

    fn section(
        &self,
        kind: ElementKind,
        element: &Element,
        cells: &[Cell],
        parent: &PaintState,
    ) -> Result<ResolvedSection, Error> {
        let state = self.element(
            ElementState::inherit(kind, parent),
            &element.style_list,
            &element.attributes,
        )?;
        let cells = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                self.cell(cell, &state.paint)
                    .with_context(|| format!("{} cell {}", kind, i))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("resolved {} with {} cells", kind, cells.len());
        Ok(ResolvedSection {
            paint: state.paint,
            cells,
        })
    }

    fn page(
        &self,
        index: usize,
        element: &Element,
        cells: &[Cell],
        parent: &PaintState,
    ) -> Result<ResolvedPage, Error> {
        let state = self.element(
            ElementState::inherit(ElementKind::Page, parent),
            &element.style_list,
            &element.attributes,
        )?;
        let cells = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                self.cell(cell, &state.paint)
                    .with_context(|| format!("cell {}", i))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("resolved page {} with {} cells", index, cells.len());
        Ok(ResolvedPage {
            index,
            paint: state.paint,
            bookmark_title: element.bookmark_title.clone(),
            cells,
        })
    }
}
