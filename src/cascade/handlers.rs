//! The attribute handler table.
//!
//! Handlers are plain functions from a raw attribute value to a [`Delta`].
//! Generic handlers are keyed by bare name and apply to every element kind
//! except the watermark. Specific handlers are keyed by element kind and
//! name, and run after the generic one when both exist.

use std::collections::HashMap;

use super::state::Delta;
use crate::error::ParseError;
use crate::model::ElementKind;
use crate::style::{
    CapStyle, CellDisplay, Color, Dimension, FontStyle, JoinStyle, Side, TextAlign,
};

/// Parses one attribute value.
pub type Handler = fn(&str) -> Result<Delta, ParseError>;

/// The handlers that matched one attribute.
#[derive(Clone, Copy)]
pub struct Matched {
    pub generic: Option<Handler>,
    pub specific: Option<Handler>,
}

impl Matched {
    pub fn is_empty(&self) -> bool {
        self.generic.is_none() && self.specific.is_none()
    }

    /// Generic first, then specific.
    pub fn iter(&self) -> impl Iterator<Item = Handler> {
        self.generic.into_iter().chain(self.specific)
    }
}

/// Immutable `(kind, name) -> handler` lookup.
#[derive(Clone, Default)]
pub struct HandlerTable {
    generic: HashMap<&'static str, Handler>,
    specific: HashMap<(ElementKind, &'static str), Handler>,
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut generic: Vec<_> = self.generic.keys().collect();
        generic.sort();
        let mut specific: Vec<String> = self
            .specific
            .keys()
            .map(|(kind, name)| format!("{}.{}", kind, name))
            .collect();
        specific.sort();
        f.debug_struct("HandlerTable")
            .field("generic", &generic)
            .field("specific", &specific)
            .finish()
    }
}

impl HandlerTable {
    /// An empty table. Every attribute is unsupported until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full set of supported attributes.
    pub fn standard() -> Self {
        let mut table = Self::new();

        table.generic("background-color", |v| Ok(Delta::Background(color(v)?)));
        table.generic("border-color", |v| Ok(Delta::BorderColor(None, color(v)?)));
        table.generic("border-width", |v| Ok(Delta::BorderWidth(None, width(v)?)));
        table.generic("border-left-width", |v| {
            Ok(Delta::BorderWidth(Some(Side::Left), width(v)?))
        });
        table.generic("border-top-width", |v| {
            Ok(Delta::BorderWidth(Some(Side::Top), width(v)?))
        });
        table.generic("border-right-width", |v| {
            Ok(Delta::BorderWidth(Some(Side::Right), width(v)?))
        });
        table.generic("border-bottom-width", |v| {
            Ok(Delta::BorderWidth(Some(Side::Bottom), width(v)?))
        });
        table.generic("border-left-color", |v| {
            Ok(Delta::BorderColor(Some(Side::Left), color(v)?))
        });
        table.generic("border-top-color", |v| {
            Ok(Delta::BorderColor(Some(Side::Top), color(v)?))
        });
        table.generic("border-right-color", |v| {
            Ok(Delta::BorderColor(Some(Side::Right), color(v)?))
        });
        table.generic("border-bottom-color", |v| {
            Ok(Delta::BorderColor(Some(Side::Bottom), color(v)?))
        });
        table.generic("font-style", |v| Ok(Delta::FontStyle(FontStyle::parse(v)?)));
        table.generic("font-size", |v| Ok(Delta::FontSize(Dimension::parse(v)?)));
        table.generic("font-color", |v| Ok(Delta::FontColor(color(v)?)));
        table.generic("font-family", |v| Ok(Delta::FontFamily(font_family(v)?)));
        table.generic("line-join-style", |v| Ok(Delta::LineJoin(JoinStyle::parse(v)?)));
        table.generic("line-cap-style", |v| Ok(Delta::LineCap(CapStyle::parse(v)?)));

        table.specific(ElementKind::Document, "title", |v| Ok(Delta::Title(v.to_string())));

        table.specific(ElementKind::Watermark, "font-color", |v| {
            Ok(Delta::FontColor(color(v)?))
        });
        table.specific(ElementKind::Watermark, "font-size", |v| {
            Ok(Delta::FontSize(Dimension::parse(v)?))
        });

        table.specific(ElementKind::Cell, "text-align", |v| {
            Ok(Delta::TextAlign(TextAlign::parse(v)?))
        });
        table.specific(ElementKind::Cell, "width", |v| Ok(Delta::Width(Dimension::parse(v)?)));
        table.specific(ElementKind::Cell, "height", |v| {
            Ok(Delta::Height(Dimension::parse(v)?))
        });
        table.specific(ElementKind::Cell, "absolute", |v| Ok(Delta::Absolute(boolean(v)?)));
        table.specific(ElementKind::Cell, "display", |v| {
            Ok(Delta::Display(CellDisplay::parse(v)?))
        });
        table.specific(ElementKind::Cell, "left", |v| Ok(Delta::Left(Dimension::parse(v)?)));
        table.specific(ElementKind::Cell, "top", |v| Ok(Delta::Top(Dimension::parse(v)?)));

        table
    }

    /// Register a handler that applies to every element kind but the watermark.
    pub fn generic(&mut self, name: &'static str, handler: Handler) -> &mut Self {
        self.generic.insert(name, handler);
        self
    }

    /// Register a handler for one element kind, addressed as `<kind>.<name>`.
    pub fn specific(&mut self, kind: ElementKind, name: &'static str, handler: Handler) -> &mut Self {
        self.specific.insert((kind, name), handler);
        self
    }

    /// Find the handlers for `name` on an element of `kind`.
    pub fn lookup(&self, kind: ElementKind, name: &str) -> Matched {
        let generic = match kind {
            ElementKind::Watermark => None,
            _ => self.generic.get(name).copied(),
        };
        Matched {
            generic,
            specific: self.specific.get(&(kind, name)).copied(),
        }
    }

    /// Every qualified name this table answers to, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .generic
            .keys()
            .map(|n| n.to_string())
            .chain(
                self.specific
                    .keys()
                    .map(|(kind, name)| format!("{}.{}", kind, name)),
            )
            .collect();
        names.sort();
        names
    }
}

fn color(value: &str) -> Result<Color, ParseError> {
    Color::parse(value)
}

/// Border widths are bare numbers in the display unit.
fn width(value: &str) -> Result<f64, ParseError> {
    let w: f64 = value
        .trim()
        .parse()
        .map_err(|_| ParseError::new("border width", value, "expected a number"))?;
    if !w.is_finite() || w < 0.0 {
        return Err(ParseError::new("border width", value, "must be a finite, non-negative number"));
    }
    Ok(w)
}

fn font_family(value: &str) -> Result<String, ParseError> {
    let family = value.trim();
    if family.is_empty() {
        return Err(ParseError::new("font family", value, "empty font family"));
    }
    Ok(family.to_string())
}

fn boolean(value: &str) -> Result<bool, ParseError> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ParseError::new("boolean", value, "expected true or false")),
    }
}
