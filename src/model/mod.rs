//! # Document Model
//!
//! The input representation: a document owns a header, a footer, an ordered
//! list of pages, and pages own cells. Every node shares the same
//! [`Element`] shape: inline attributes, an ordered style list and an
//! optional bookmark title.
//!
//! Nothing here is resolved. Paint state is produced by the cascade
//! resolver as a separate, immutable snapshot (see [`crate::cascade`]).

pub mod styles;

pub use styles::{Style, StyleRegistry};

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, ValidationError};
use crate::style::{DimensionUnit, FontStyle};

/// Largest font file accepted through a `file://` source.
pub const MAX_FONT_FILE_SIZE: u64 = 500 * 1024;

/// A single `name: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Replace the value of an attribute with the same (case-insensitive)
    /// name, or append a new one.
    pub fn upsert(list: &mut Vec<Attribute>, name: &str, value: &str) {
        match list.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            Some(attr) => attr.value = value.to_string(),
            None => list.push(Attribute::new(name, value)),
        }
    }
}

/// The closed set of node kinds. Also names the attribute namespace used
/// for kind-specific handlers (`cell.width`, `document.title`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Document,
    Watermark,
    Header,
    Footer,
    Page,
    Cell,
}

impl ElementKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ElementKind::Document => "document",
            ElementKind::Watermark => "document.watermark",
            ElementKind::Header => "header",
            ElementKind::Footer => "footer",
            ElementKind::Page => "page",
            ElementKind::Cell => "cell",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// State shared by every node of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub style_list: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bookmark_title: String,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        Attribute::upsert(&mut self.attributes, name, value);
    }
}

/// A cell: the only element that draws text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(flatten)]
    pub element: Element,
    /// Text to render. Empty text draws a blank box.
    #[serde(default)]
    pub text: String,
}

impl Cell {
    pub fn new(text: &str) -> Self {
        Self {
            element: Element::default(),
            text: text.to_string(),
        }
    }
}

/// Header or footer: a row of cells repeated on every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(flatten)]
    pub element: Element,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(flatten)]
    pub element: Element,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

/// Text stamped diagonally across every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style_list: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Legal,
    Letter,
    Tabloid,
}

impl PageSize {
    /// Returns (width, height) in points, portrait.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "P")]
    Portrait,
    #[serde(rename = "L")]
    Landscape,
}

/// Where a font's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// Hex-encoded font file.
    Embedded(String),
    /// A `file://` directive.
    File(PathBuf),
}

impl FontSource {
    /// Check that embedded data is valid hex, or that a file source exists
    /// and is within the size limit.
    pub fn check(&self) -> Result<(), Error> {
        match self {
            FontSource::Embedded(hex) => {
                decode_hex(hex)?;
            }
            FontSource::File(path) => {
                let meta = std::fs::metadata(path).map_err(|e| {
                    Error::Font(format!("failed to stat font file `{}`: {}", path.display(), e))
                })?;
                if meta.len() > MAX_FONT_FILE_SIZE {
                    return Err(ValidationError::FontTooLarge {
                        path: file_name(path),
                        limit: MAX_FONT_FILE_SIZE,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Read or decode the font bytes.
    pub fn load(&self) -> Result<Vec<u8>, Error> {
        match self {
            FontSource::Embedded(hex) => decode_hex(hex),
            FontSource::File(path) => {
                self.check()?;
                std::fs::read(path).map_err(|e| {
                    Error::Font(format!("read font file `{}`: {}", file_name(path), e))
                })
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, Error> {
    let digits: Vec<u8> = hex
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .enumerate()
        .map(|(i, c)| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| Error::Font(format!("invalid hex digit `{}` at offset {}", c, i)))
        })
        .collect::<Result<_, _>>()?;
    if digits.len() % 2 != 0 {
        return Err(Error::Font("hex font data has an odd number of digits".to_string()));
    }
    Ok(digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect())
}

impl Serialize for FontSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FontSource::Embedded(data) => serializer.serialize_str(data),
            FontSource::File(path) => serializer.serialize_str(&format!("file://{}", path.display())),
        }
    }
}

impl<'de> Deserialize<'de> for FontSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if let Some(path) = s.strip_prefix("file://") {
            let cleaned: PathBuf = Path::new(path).components().collect();
            return Ok(FontSource::File(cleaned));
        }
        if s.is_empty() {
            return Err(serde::de::Error::custom("missing font data"));
        }
        Ok(FontSource::Embedded(s))
    }
}

/// A font to register with the drawing surface before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontEntry {
    pub data: FontSource,
    pub name: String,
    #[serde(default)]
    pub style: FontStyle,
}

/// The root of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub element: Element,
    #[serde(default)]
    pub styles: StyleRegistry,
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
    /// Paper size (A4, Letter, ...).
    #[serde(default)]
    pub size: PageSize,
    /// Display unit. Every dimension is eventually converted to it.
    #[serde(default)]
    pub units: DimensionUnit,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub header: Section,
    #[serde(default)]
    pub footer: Section,
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Whether to add a bookmark per page.
    #[serde(default)]
    pub bookmarks: bool,
    /// Bookmark title template shared by pages without their own title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub page_bookmark_template: String,
    #[serde(default)]
    pub watermark: Watermark,
}

impl Document {
    pub fn new(orientation: Orientation, size: PageSize, units: DimensionUnit) -> Self {
        Self {
            orientation,
            size,
            units,
            ..Default::default()
        }
    }

    /// Structural checks that don't need the cascade.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pages.is_empty() {
            return Err(ValidationError::NoPages);
        }
        if self.units == DimensionUnit::Percent {
            return Err(ValidationError::PercentDisplayUnit);
        }
        Ok(())
    }
}
