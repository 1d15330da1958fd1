//! Unit-tagged lengths and the conversion table that turns them into the
//! document's display unit.
//!
//! A [`Dimension`] is what an author writes (`"12.5mm"`, `"50%"`). It only
//! becomes an absolute number once a destination unit and, for percentages,
//! a context width/height/font size are known. That happens at draw time.

use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, ParseError, ValidationError};

/// Units a dimension can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DimensionUnit {
    #[default]
    Millimeter,
    Centimeter,
    Inch,
    /// Relative to a context value. Never valid as a destination unit.
    Percent,
}

impl DimensionUnit {
    pub const ALL: [DimensionUnit; 4] = [
        DimensionUnit::Millimeter,
        DimensionUnit::Centimeter,
        DimensionUnit::Inch,
        DimensionUnit::Percent,
    ];

    /// The suffix used in dimension strings.
    pub fn notation(&self) -> &'static str {
        match self {
            DimensionUnit::Millimeter => "mm",
            DimensionUnit::Centimeter => "cm",
            DimensionUnit::Inch => "in",
            DimensionUnit::Percent => "%",
        }
    }

    pub fn from_notation(s: &str) -> Result<Self, ParseError> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|u| u.notation() == lower)
            .ok_or_else(|| ParseError::new("unit", s, "expected one of mm, cm, in, %"))
    }

    /// How many points (1/72 inch) one unit spans. `None` for percent.
    pub fn points_per_unit(&self) -> Option<f64> {
        match self {
            DimensionUnit::Millimeter => Some(72.0 / 25.4),
            DimensionUnit::Centimeter => Some(72.0 / 2.54),
            DimensionUnit::Inch => Some(72.0),
            DimensionUnit::Percent => None,
        }
    }
}

impl fmt::Display for DimensionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notation())
    }
}

impl Serialize for DimensionUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.notation())
    }
}

impl<'de> Deserialize<'de> for DimensionUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DimensionUnit::from_notation(&s).map_err(serde::de::Error::custom)
    }
}

/// Selects which context value a percentage is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitFlags(u8);

impl UnitFlags {
    pub const LENGTH: UnitFlags = UnitFlags(1);
    pub const FONT_SIZE: UnitFlags = UnitFlags(1 << 1);
    pub const WIDTH: UnitFlags = UnitFlags(1 << 2);
    pub const HEIGHT: UnitFlags = UnitFlags(1 << 3);

    /// A horizontal length.
    pub const HORIZONTAL: UnitFlags = UnitFlags(Self::LENGTH.0 | Self::WIDTH.0);
    /// A vertical length.
    pub const VERTICAL: UnitFlags = UnitFlags(Self::LENGTH.0 | Self::HEIGHT.0);

    pub fn contains(&self, other: UnitFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for UnitFlags {
    type Output = UnitFlags;

    fn bitor(self, rhs: UnitFlags) -> UnitFlags {
        UnitFlags(self.0 | rhs.0)
    }
}

/// Context values percentages resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitContext {
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
}

impl UnitContext {
    pub fn width(width: f64) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    pub fn height(height: f64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    pub fn font_size(font_size: f64) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }
}

/// A value tagged with a unit.
///
/// For [`DimensionUnit::Percent`], `value` holds the fraction (`"50%"` is
/// `0.5`) and `original_value` the number as written. For absolute units both
/// are the same.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub original_value: f64,
    pub unit: DimensionUnit,
}

impl Dimension {
    /// Build a dimension from a number as it would be written.
    pub fn new(value: f64, unit: DimensionUnit) -> Self {
        let stored = if unit == DimensionUnit::Percent {
            value / 100.0
        } else {
            value
        };
        Self {
            value: stored,
            original_value: value,
            unit,
        }
    }

    /// Parse `"<number><unit>"`, case-insensitive.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let lower = input.trim().to_ascii_lowercase();
        let unit = DimensionUnit::ALL
            .into_iter()
            .filter(|u| lower.ends_with(u.notation()))
            .max_by_key(|u| u.notation().len())
            .ok_or_else(|| ParseError::new("dimension", input, "missing unit (mm, cm, in, %)"))?;

        let number = lower[..lower.len() - unit.notation().len()].trim();
        let value: f64 = number
            .parse()
            .map_err(|_| ParseError::new("dimension", input, "invalid number"))?;
        if !value.is_finite() {
            return Err(ParseError::new("dimension", input, "value must be finite"));
        }
        Ok(Dimension::new(value, unit))
    }

    pub fn is_relative(&self) -> bool {
        self.unit == DimensionUnit::Percent
    }

    /// Convert to an absolute number in `dst` units.
    pub fn resolve(
        &self,
        table: &ConversionTable,
        flags: UnitFlags,
        dst: DimensionUnit,
        ctx: UnitContext,
    ) -> Result<f64, Error> {
        table.convert(self.value, flags, self.unit, dst, ctx)
    }

    /// Like [`Dimension::resolve`], but keeps the result tagged with `dst`.
    pub fn to_unit(
        &self,
        table: &ConversionTable,
        flags: UnitFlags,
        dst: DimensionUnit,
        ctx: UnitContext,
    ) -> Result<Dimension, Error> {
        Ok(Dimension::new(self.resolve(table, flags, dst, ctx)?, dst))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = format!("{:.2}", self.original_value);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{}{}", trimmed, self.unit)
    }
}

impl std::str::FromStr for Dimension {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::parse(s)
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Dimension::parse(&s).map_err(serde::de::Error::custom)
    }
}

type Converter = fn(f64, UnitFlags, &UnitContext) -> f64;

fn percentage(value: f64, flags: UnitFlags, ctx: &UnitContext) -> f64 {
    if flags.contains(UnitFlags::FONT_SIZE) {
        value * ctx.font_size
    } else if flags.contains(UnitFlags::HORIZONTAL) {
        value * ctx.width
    } else if flags.contains(UnitFlags::VERTICAL) {
        value * ctx.height
    } else {
        value
    }
}

/// Immutable lookup of `(source, destination)` converters.
///
/// Built once and shared by reference between the resolver and the emitter.
/// Percent never appears as a destination.
#[derive(Debug, Clone)]
pub struct ConversionTable {
    converters: HashMap<(DimensionUnit, DimensionUnit), Converter>,
}

impl ConversionTable {
    pub fn standard() -> Self {
        use DimensionUnit::*;

        let mut converters: HashMap<(DimensionUnit, DimensionUnit), Converter> = HashMap::new();
        converters.insert((Millimeter, Millimeter), |v, _, _| v);
        converters.insert((Millimeter, Centimeter), |v, _, _| v * 0.1);
        converters.insert((Millimeter, Inch), |v, _, _| v / 25.4);
        converters.insert((Centimeter, Millimeter), |v, _, _| v * 10.0);
        converters.insert((Centimeter, Centimeter), |v, _, _| v);
        converters.insert((Centimeter, Inch), |v, _, _| v / 2.54);
        converters.insert((Inch, Millimeter), |v, _, _| v * 25.4);
        converters.insert((Inch, Centimeter), |v, _, _| v * 2.54);
        converters.insert((Inch, Inch), |v, _, _| v);
        for dst in [Millimeter, Centimeter, Inch] {
            converters.insert((Percent, dst), percentage);
        }
        Self { converters }
    }

    pub fn convert(
        &self,
        value: f64,
        flags: UnitFlags,
        src: DimensionUnit,
        dst: DimensionUnit,
        ctx: UnitContext,
    ) -> Result<f64, Error> {
        match self.converters.get(&(src, dst)) {
            Some(convert) => Ok(convert(value, flags, &ctx)),
            None if dst == DimensionUnit::Percent => Err(ValidationError::PercentDisplayUnit.into()),
            None => Err(Error::Render(format!("no conversion from {} to {}", src, dst))),
        }
    }
}

impl Default for ConversionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_units_case_insensitively() {
        let d = Dimension::parse("12.5MM").unwrap();
        assert_eq!(d.unit, DimensionUnit::Millimeter);
        assert_eq!(d.value, 12.5);

        let d = Dimension::parse("2In").unwrap();
        assert_eq!(d.unit, DimensionUnit::Inch);
        assert_eq!(d.value, 2.0);

        let d = Dimension::parse("3cm").unwrap();
        assert_eq!(d.unit, DimensionUnit::Centimeter);
    }

    #[test]
    fn percent_is_stored_as_fraction_once() {
        let d = Dimension::parse("50%").unwrap();
        assert_eq!(d.unit, DimensionUnit::Percent);
        assert!(close(d.value, 0.5));
        assert_eq!(d.original_value, 50.0);

        // absolute units keep their value
        let d = Dimension::parse("50mm").unwrap();
        assert_eq!(d.value, 50.0);
    }

    #[test]
    fn rejects_missing_unit_or_number() {
        assert!(Dimension::parse("12").is_err());
        assert!(Dimension::parse("mm").is_err());
        assert!(Dimension::parse("abcmm").is_err());
        assert!(Dimension::parse("12pt").is_err());
    }

    #[test]
    fn display_round_trips_with_trimmed_zeros() {
        for s in ["12.5mm", "50%", "12mm", "0.25in", "3cm"] {
            assert_eq!(Dimension::parse(s).unwrap().to_string(), s);
        }
        assert_eq!(Dimension::parse("12.00mm").unwrap().to_string(), "12mm");
    }

    #[test]
    fn absolute_conversions() {
        let table = ConversionTable::standard();
        let ctx = UnitContext::default();
        let flags = UnitFlags::HORIZONTAL;
        use DimensionUnit::*;
        assert!(close(table.convert(25.4, flags, Millimeter, Inch, ctx).unwrap(), 1.0));
        assert!(close(table.convert(1.0, flags, Inch, Millimeter, ctx).unwrap(), 25.4));
        assert!(close(table.convert(2.0, flags, Inch, Millimeter, ctx).unwrap(), 50.8));
        assert!(close(table.convert(3.0, flags, Centimeter, Millimeter, ctx).unwrap(), 30.0));
        assert!(close(table.convert(15.0, flags, Millimeter, Centimeter, ctx).unwrap(), 1.5));
        assert!(close(table.convert(2.54, flags, Centimeter, Inch, ctx).unwrap(), 1.0));
        assert!(close(table.convert(1.0, flags, Inch, Centimeter, ctx).unwrap(), 2.54));
    }

    #[test]
    fn percent_uses_the_requested_context() {
        let table = ConversionTable::standard();
        let d = Dimension::parse("50%").unwrap();
        let ctx = UnitContext {
            width: 190.0,
            height: 277.0,
            font_size: 4.0,
        };
        let mm = DimensionUnit::Millimeter;
        assert!(close(d.resolve(&table, UnitFlags::HORIZONTAL, mm, ctx).unwrap(), 95.0));
        assert!(close(d.resolve(&table, UnitFlags::VERTICAL, mm, ctx).unwrap(), 138.5));
        assert!(close(d.resolve(&table, UnitFlags::FONT_SIZE, mm, ctx).unwrap(), 2.0));
    }

    #[test]
    fn percent_is_never_a_destination() {
        let table = ConversionTable::standard();
        let err = table
            .convert(1.0, UnitFlags::LENGTH, DimensionUnit::Millimeter, DimensionUnit::Percent, UnitContext::default())
            .unwrap_err();
        assert_eq!(err.as_validation(), Some(&ValidationError::PercentDisplayUnit));
    }

    #[test]
    fn unit_serde_uses_notation() {
        let json = serde_json::to_string(&DimensionUnit::Centimeter).unwrap();
        assert_eq!(json, "\"cm\"");
        let unit: DimensionUnit = serde_json::from_str("\"in\"").unwrap();
        assert_eq!(unit, DimensionUnit::Inch);
        assert!(serde_json::from_str::<DimensionUnit>("\"pt\"").is_err());
    }
}
