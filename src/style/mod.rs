//! # Style System
//!
//! The typed values attributes resolve into. Authors write strings
//! (`"bold|italic"`, `"#80337733"`, `"50%"`); the cascade parses them into the
//! types in this module and folds them into a [`PaintState`] per element.
//!
//! Only what a fixed-box report needs is modelled: brushes for lines and
//! fills, a text brush, four independent border sides and a background.

pub mod color;
pub mod dimension;

pub use color::Color;
pub use dimension::{ConversionTable, Dimension, DimensionUnit, UnitContext, UnitFlags};

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// Default stroke width for text outlines, lines and borders, in display units.
pub const DEFAULT_STROKE_WIDTH: f64 = 0.2;

/// A set of font style flags.
///
/// `regular` is a flag of its own: when present it wins over every other
/// flag, which is how a child resets an inherited `bold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontStyle(u8);

impl FontStyle {
    pub const REGULAR: FontStyle = FontStyle(1);
    pub const BOLD: FontStyle = FontStyle(1 << 1);
    pub const ITALIC: FontStyle = FontStyle(1 << 2);
    pub const UNDERLINE: FontStyle = FontStyle(1 << 3);
    pub const STRIKETHROUGH: FontStyle = FontStyle(1 << 4);

    const NAMES: [(FontStyle, &'static str); 5] = [
        (FontStyle::REGULAR, "regular"),
        (FontStyle::BOLD, "bold"),
        (FontStyle::ITALIC, "italic"),
        (FontStyle::UNDERLINE, "underline"),
        (FontStyle::STRIKETHROUGH, "strikethrough"),
    ];

    /// Parse `|`-joined style names, e.g. `"bold|underline"`.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut style = FontStyle(0);
        for token in input.split('|') {
            let token = token.trim().to_ascii_lowercase();
            let (flag, _) = Self::NAMES
                .iter()
                .find(|(_, name)| *name == token)
                .ok_or_else(|| ParseError::new("font style", input, format!("unsupported font style `{}`", token)))?;
            style.0 |= flag.0;
        }
        Ok(style)
    }

    pub fn contains(&self, other: FontStyle) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_regular(&self) -> bool {
        self.0 == 0 || self.contains(FontStyle::REGULAR)
    }

    pub fn is_bold(&self) -> bool {
        !self.is_regular() && self.contains(FontStyle::BOLD)
    }

    pub fn is_italic(&self) -> bool {
        !self.is_regular() && self.contains(FontStyle::ITALIC)
    }

    /// Fold a newly declared style into an inherited one.
    pub fn merge(self, declared: FontStyle) -> FontStyle {
        if declared.contains(FontStyle::REGULAR) {
            declared
        } else {
            FontStyle((self.0 & !FontStyle::REGULAR.0) | declared.0)
        }
    }
}

impl std::ops::BitOr for FontStyle {
    type Output = FontStyle;

    fn bitor(self, rhs: FontStyle) -> FontStyle {
        FontStyle(self.0 | rhs.0)
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("regular");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

impl Serialize for FontStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FontStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FontStyle::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Line end decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapStyle {
    #[default]
    Cap,
    Butt,
    Square,
}

impl CapStyle {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "cap" => Ok(CapStyle::Cap),
            "butt" => Ok(CapStyle::Butt),
            "square" => Ok(CapStyle::Square),
            _ => Err(ParseError::new("cap style", input, "expected cap, butt or square")),
        }
    }
}

/// Corner treatment where two line segments meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStyle {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl JoinStyle {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "miter" => Ok(JoinStyle::Miter),
            "round" => Ok(JoinStyle::Round),
            "bevel" => Ok(JoinStyle::Bevel),
            _ => Err(ParseError::new("join style", input, "expected miter, round or bevel")),
        }
    }
}

/// How the cursor moves after a cell has been drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellDisplay {
    /// Continue to the right of the cell.
    #[default]
    Column,
    /// Start the next line at the left edge of the drawing area.
    Row,
    /// Continue directly below the cell.
    Stack,
}

impl CellDisplay {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "column" => Ok(CellDisplay::Column),
            "row" => Ok(CellDisplay::Row),
            "stack" => Ok(CellDisplay::Stack),
            _ => Err(ParseError::new("display", input, "expected column, row or stack")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
    Baseline,
}

/// Text alignment code built from the letters `L C R` (horizontal) and
/// `T M B A` (vertical).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextAlign(String);

impl TextAlign {
    const FLAGS: &'static str = "LCRBATM";

    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let code = input.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(ParseError::new("text alignment", input, "empty alignment"));
        }
        if let Some(bad) = code.chars().find(|c| !Self::FLAGS.contains(*c)) {
            return Err(ParseError::new(
                "text alignment",
                input,
                format!("invalid flag `{}`, expected any of `{}`", bad, Self::FLAGS),
            ));
        }
        Ok(TextAlign(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn horizontal(&self) -> HorizontalAlign {
        self.0
            .chars()
            .find_map(|c| match c {
                'L' => Some(HorizontalAlign::Left),
                'C' => Some(HorizontalAlign::Center),
                'R' => Some(HorizontalAlign::Right),
                _ => None,
            })
            .unwrap_or(HorizontalAlign::Left)
    }

    pub fn vertical(&self) -> VerticalAlign {
        self.0
            .chars()
            .find_map(|c| match c {
                'T' => Some(VerticalAlign::Top),
                'M' => Some(VerticalAlign::Middle),
                'B' => Some(VerticalAlign::Bottom),
                'A' => Some(VerticalAlign::Baseline),
                _ => None,
            })
            .unwrap_or(VerticalAlign::Middle)
    }
}

impl Default for TextAlign {
    fn default() -> Self {
        TextAlign("LM".to_string())
    }
}

impl fmt::Display for TextAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fill/stroke paint descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Brush {
    pub fill: bool,
    pub stroke: bool,
    pub cap_style: CapStyle,
    pub join_style: JoinStyle,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
}

impl Brush {
    /// An opaque black stroke of the default width.
    pub fn line() -> Self {
        Self {
            fill: false,
            stroke: true,
            cap_style: CapStyle::Cap,
            join_style: JoinStyle::Miter,
            fill_color: Color::TRANSPARENT,
            stroke_color: Color::BLACK,
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }

    /// A fill-only brush.
    pub fn filled(color: Color) -> Self {
        Self {
            fill: true,
            stroke: false,
            fill_color: color,
            ..Brush::line()
        }
    }

    /// `F`, `D`, `FD` or empty, in PDF painting-operator terms.
    pub fn draw_style(&self) -> &'static str {
        match (self.fill, self.stroke) {
            (true, true) => "FD",
            (true, false) => "F",
            (false, true) => "D",
            (false, false) => "",
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Brush::line()
    }
}

/// Everything needed to typeset a cell's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBrush {
    pub brush: Brush,
    pub font_family: String,
    pub font_size: Dimension,
    pub font_style: FontStyle,
    pub align: TextAlign,
    pub display: CellDisplay,
}

impl TextBrush {
    /// Courier, 12pt expressed in `unit`, opaque black, left/middle.
    pub fn defaults(unit: DimensionUnit) -> Self {
        let points = unit.points_per_unit().unwrap_or(72.0 / 25.4);
        Self {
            brush: Brush::line(),
            font_family: "courier".to_string(),
            font_size: Dimension::new(12.0 / points, unit),
            font_style: FontStyle::REGULAR,
            align: TextAlign::default(),
            display: CellDisplay::Column,
        }
    }
}

/// One of the four sides of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Top,
    Right,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Top, Side::Right, Side::Bottom];
}

/// Four independent, optional border sides. A `None` side is not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Borders {
    pub left: Option<Brush>,
    pub top: Option<Brush>,
    pub right: Option<Brush>,
    pub bottom: Option<Brush>,
}

impl Borders {
    pub fn side(&self, side: Side) -> Option<&Brush> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Top => self.top.as_ref(),
            Side::Right => self.right.as_ref(),
            Side::Bottom => self.bottom.as_ref(),
        }
    }

    fn slot(&mut self, side: Side) -> &mut Option<Brush> {
        match side {
            Side::Left => &mut self.left,
            Side::Top => &mut self.top,
            Side::Right => &mut self.right,
            Side::Bottom => &mut self.bottom,
        }
    }

    /// Lazily create one side from `template`, returning it for editing.
    pub fn init(&mut self, side: Side, template: &Brush) -> &mut Brush {
        self.slot(side).get_or_insert_with(|| Brush {
            fill: false,
            stroke: true,
            stroke_color: Color::BLACK,
            stroke_width: DEFAULT_STROKE_WIDTH,
            ..template.clone()
        })
    }

    pub fn is_empty(&self) -> bool {
        Side::ALL.iter().all(|s| self.side(*s).is_none())
    }

    /// Present sides, in left/top/right/bottom order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &Brush)> {
        Side::ALL
            .into_iter()
            .filter_map(move |s| self.side(s).map(|b| (s, b)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Brush> {
        [&mut self.left, &mut self.top, &mut self.right, &mut self.bottom]
            .into_iter()
            .flatten()
    }
}

/// The resolved paint of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaintState {
    pub text: TextBrush,
    /// Brush used for lines drawn by the element; seeds new border sides.
    pub line: Brush,
    pub background: Option<Brush>,
    pub border: Borders,
}

impl PaintState {
    /// The root state every document starts from.
    pub fn defaults(unit: DimensionUnit) -> Self {
        Self {
            text: TextBrush::defaults(unit),
            line: Brush::line(),
            background: None,
            border: Borders::default(),
        }
    }

    /// The inherited snapshot a child starts from: text style and
    /// background carry over, borders never do.
    pub fn inherit(parent: &PaintState) -> Self {
        Self {
            text: parent.text.clone(),
            line: Brush::line(),
            background: parent.background.clone(),
            border: Borders::default(),
        }
    }
}
