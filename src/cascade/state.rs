//! Typed attribute deltas and the reduction that folds them into a state.
//!
//! A handler never touches a paint state directly. It parses one attribute
//! value into a [`Delta`]; the resolver then folds the ordered deltas of an
//! element over the snapshot it inherited from its parent. Folding is pure:
//! the same snapshot and deltas always produce the same [`ElementState`].

use crate::error::{Error, ValidationError};
use crate::model::ElementKind;
use crate::style::{
    CapStyle, CellDisplay, Color, ConversionTable, Dimension, DimensionUnit, FontStyle, JoinStyle,
    PaintState, Side, TextAlign, UnitContext, UnitFlags,
};

/// One parsed attribute, ready to be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Background(Color),
    /// `None` targets all four sides.
    BorderColor(Option<Side>, Color),
    BorderWidth(Option<Side>, f64),
    FontStyle(FontStyle),
    FontSize(Dimension),
    FontColor(Color),
    FontFamily(String),
    LineJoin(JoinStyle),
    LineCap(CapStyle),
    Title(String),
    TextAlign(TextAlign),
    Width(Dimension),
    Height(Dimension),
    Absolute(bool),
    Display(CellDisplay),
    Left(Dimension),
    Top(Dimension),
}

impl Delta {
    /// The attribute a delta stands for, for diagnostics.
    pub fn attribute(&self) -> &'static str {
        match self {
            Delta::Background(_) => "background-color",
            Delta::BorderColor(..) => "border-color",
            Delta::BorderWidth(..) => "border-width",
            Delta::FontStyle(_) => "font-style",
            Delta::FontSize(_) => "font-size",
            Delta::FontColor(_) => "font-color",
            Delta::FontFamily(_) => "font-family",
            Delta::LineJoin(_) => "line-join-style",
            Delta::LineCap(_) => "line-cap-style",
            Delta::Title(_) => "title",
            Delta::TextAlign(_) => "text-align",
            Delta::Width(_) => "width",
            Delta::Height(_) => "height",
            Delta::Absolute(_) => "absolute",
            Delta::Display(_) => "display",
            Delta::Left(_) => "left",
            Delta::Top(_) => "top",
        }
    }

    /// Which element kinds accept this delta. `None` means all of them.
    fn restricted_to(&self) -> Option<ElementKind> {
        match self {
            Delta::Title(_) => Some(ElementKind::Document),
            Delta::TextAlign(_)
            | Delta::Width(_)
            | Delta::Height(_)
            | Delta::Absolute(_)
            | Delta::Display(_)
            | Delta::Left(_)
            | Delta::Top(_) => Some(ElementKind::Cell),
            _ => None,
        }
    }
}

/// Box geometry of a cell. Never inherited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellGeometry {
    /// Absent: the measured text width.
    pub width: Option<Dimension>,
    /// Absent: the line height.
    pub height: Option<Dimension>,
    pub absolute: bool,
    pub left: Option<Dimension>,
    pub top: Option<Dimension>,
}

/// Shared, read-only inputs of a reduction.
#[derive(Debug, Clone, Copy)]
pub struct Reducer<'a> {
    pub conversions: &'a ConversionTable,
    /// The document's display unit.
    pub unit: DimensionUnit,
}

impl Reducer<'_> {
    /// Express `size` in the display unit. Percentages are taken of
    /// `inherited`, which must already be in the display unit.
    pub fn font_size(&self, size: &Dimension, inherited: &Dimension) -> Result<Dimension, Error> {
        let base = inherited.resolve(
            self.conversions,
            UnitFlags::FONT_SIZE,
            self.unit,
            UnitContext::default(),
        )?;
        size.to_unit(
            self.conversions,
            UnitFlags::FONT_SIZE,
            self.unit,
            UnitContext::font_size(base),
        )
    }
}

/// The product of a reduction: one element's resolved state.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementState {
    pub kind: ElementKind,
    pub paint: PaintState,
    pub geometry: CellGeometry,
    /// Set through `document.title`.
    pub title: Option<String>,
}

impl ElementState {
    /// The inherited snapshot for a child of `parent`.
    pub fn inherit(kind: ElementKind, parent: &PaintState) -> Self {
        Self::with_paint(kind, PaintState::inherit(parent))
    }

    /// A snapshot that starts from `paint` as-is.
    pub fn with_paint(kind: ElementKind, paint: PaintState) -> Self {
        Self {
            kind,
            paint,
            geometry: CellGeometry::default(),
            title: None,
        }
    }

    /// Fold `deltas` into this snapshot, in order.
    pub fn reduce<I>(self, deltas: I, reducer: &Reducer<'_>) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Delta>,
    {
        deltas
            .into_iter()
            .try_fold(self, |state, delta| state.apply(delta, reducer))
    }

    /// Apply a single delta.
    pub fn apply(mut self, delta: Delta, reducer: &Reducer<'_>) -> Result<Self, Error> {
        if let Some(kind) = delta.restricted_to() {
            if kind != self.kind {
                return Err(ValidationError::NotApplicable {
                    attribute: delta.attribute().to_string(),
                    target: self.kind.prefix(),
                }
                .into());
            }
        }

        let paint = &mut self.paint;
        match delta {
            Delta::Background(color) => {
                paint
                    .background
                    .get_or_insert_with(|| crate::style::Brush::filled(color))
                    .fill_color = color;
            }
            Delta::BorderColor(side, color) => {
                for side in sides(side) {
                    paint.border.init(side, &paint.line).stroke_color = color;
                }
            }
            Delta::BorderWidth(side, width) => {
                for side in sides(side) {
                    paint.border.init(side, &paint.line).stroke_width = width;
                }
            }
            Delta::FontStyle(style) => {
                paint.text.font_style = paint.text.font_style.merge(style);
            }
            Delta::FontSize(size) => {
                paint.text.font_size = reducer.font_size(&size, &paint.text.font_size)?;
            }
            Delta::FontColor(color) => paint.text.brush.stroke_color = color,
            Delta::FontFamily(family) => paint.text.font_family = family,
            Delta::LineJoin(join) => {
                paint.text.brush.join_style = join;
                paint.line.join_style = join;
                for brush in paint.border.iter_mut() {
                    brush.join_style = join;
                }
            }
            Delta::LineCap(cap) => {
                paint.text.brush.cap_style = cap;
                paint.line.cap_style = cap;
                for brush in paint.border.iter_mut() {
                    brush.cap_style = cap;
                }
            }
            Delta::Title(title) => self.title = Some(title),
            Delta::TextAlign(align) => paint.text.align = align,
            Delta::Display(display) => paint.text.display = display,
            Delta::Width(d) => self.geometry.width = Some(d),
            Delta::Height(d) => self.geometry.height = Some(d),
            Delta::Absolute(flag) => self.geometry.absolute = flag,
            Delta::Left(d) => self.geometry.left = Some(d),
            Delta::Top(d) => self.geometry.top = Some(d),
        }
        Ok(self)
    }
}

fn sides(side: Option<Side>) -> Vec<Side> {
    match side {
        Some(side) => vec![side],
        None => Side::ALL.to_vec(),
    }
}
