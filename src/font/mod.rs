//! # Font Management
//!
//! Text measurement for the drawing surface. The three standard families
//! (courier, helvetica, times) use built-in advance widths; custom fonts
//! registered from the document are parsed with ttf-parser.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use std::collections::HashMap;

use log::warn;

use crate::style::FontStyle;

static COURIER: FontData = FontData::Standard(StandardFont::Courier);
static HELVETICA: FontData = FontData::Standard(StandardFont::Helvetica);
static TIMES: FontData = FontData::Standard(StandardFont::Times);

/// A font registry that maps family + bold + italic to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    /// Lowercased family name.
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, style: FontStyle) -> Self {
        Self {
            family: family.trim().to_ascii_lowercase(),
            bold: style.is_bold(),
            italic: style.is_italic(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard families. Nothing to embed.
    Standard(StandardFont),
    /// A TrueType/OpenType font supplied by the document.
    Custom {
        data: Vec<u8>,
        /// Parsed metrics from ttf-parser, if the data could be parsed.
        metrics: Option<CustomFontMetrics>,
    },
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
}

impl CustomFontMetrics {
    /// Advance width of a character, in the unit of `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Latin-1 plus the general punctuation block covers report text
        let ranges = [(32u32, 0x24F), (0x2000, 0x206F), (0x20A0, 0x20CF)];
        for (start, end) in ranges {
            for code in start..=end {
                let Some(ch) = char::from_u32(code) else {
                    continue;
                };
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
        })
    }
}

/// The built-in font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Courier,
    Helvetica,
    Times,
}

impl StandardFont {
    pub fn from_family(family: &str) -> Option<Self> {
        match family.trim().to_ascii_lowercase().as_str() {
            "courier" => Some(StandardFont::Courier),
            "helvetica" | "arial" => Some(StandardFont::Helvetica),
            "times" | "times-roman" => Some(StandardFont::Times),
            _ => None,
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            StandardFont::Courier => &metrics::COURIER,
            StandardFont::Helvetica => &metrics::HELVETICA,
            StandardFont::Times => &metrics::TIMES,
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        for (family, font) in [
            ("courier", StandardFont::Courier),
            ("helvetica", StandardFont::Helvetica),
            ("times", StandardFont::Times),
        ] {
            for (bold, italic) in [(false, false), (true, false), (false, true), (true, true)] {
                fonts.insert(
                    FontKey {
                        family: family.to_string(),
                        bold,
                        italic,
                    },
                    FontData::Standard(font),
                );
            }
        }
        Self { fonts }
    }

    /// Look up a font: exact match, then the regular face of the family,
    /// then a standard family by name, then courier.
    pub fn resolve(&self, family: &str, style: FontStyle) -> &FontData {
        let key = FontKey::new(family, style);
        if let Some(font) = self.fonts.get(&key) {
            return font;
        }
        let regular = FontKey::new(family, FontStyle::REGULAR);
        if let Some(font) = self.fonts.get(&regular) {
            return font;
        }
        match StandardFont::from_family(family) {
            Some(StandardFont::Helvetica) => &HELVETICA,
            Some(StandardFont::Times) => &TIMES,
            _ => &COURIER,
        }
    }

    /// Register a custom font.
    pub fn register(&mut self, family: &str, style: FontStyle, data: Vec<u8>) {
        let metrics = CustomFontMetrics::from_font_data(&data);
        if metrics.is_none() {
            warn!(
                "font `{}` ({}) could not be parsed; measuring with courier metrics",
                family, style
            );
        }
        self.fonts
            .insert(FontKey::new(family, style), FontData::Custom { data, metrics });
    }

    pub fn contains(&self, family: &str, style: FontStyle) -> bool {
        self.fonts.contains_key(&FontKey::new(family, style))
    }
}

/// Text measurement over a [`FontRegistry`].
#[derive(Default)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance width of a single character, in the unit of `font_size`.
    pub fn char_width(&self, ch: char, family: &str, style: FontStyle, font_size: f64) -> f64 {
        match self.registry.resolve(family, style) {
            FontData::Standard(font) => font.metrics().char_width(ch, font_size),
            FontData::Custom {
                metrics: Some(m), ..
            } => m.char_width(ch, font_size),
            FontData::Custom { metrics: None, .. } => {
                StandardFont::Courier.metrics().char_width(ch, font_size)
            }
        }
    }

    /// Width of a string, in the unit of `font_size`.
    pub fn measure_string(&self, text: &str, family: &str, style: FontStyle, font_size: f64) -> f64 {
        match self.registry.resolve(family, style) {
            FontData::Standard(font) => font.metrics().measure_string(text, font_size),
            FontData::Custom {
                metrics: Some(m), ..
            } => text.chars().map(|ch| m.char_width(ch, font_size)).sum(),
            FontData::Custom { metrics: None, .. } => StandardFont::Courier
                .metrics()
                .measure_string(text, font_size),
        }
    }

    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', "Helvetica", FontStyle::REGULAR, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn courier_is_monospaced() {
        let ctx = FontContext::new();
        let w = ctx.measure_string("Hello", "courier", FontStyle::REGULAR, 10.0);
        assert!((w - 30.0).abs() < 1e-9);
        let bold = FontStyle::parse("bold").unwrap();
        assert!((ctx.measure_string("Hello", "courier", bold, 10.0) - w).abs() < 1e-9);
    }

    #[test]
    fn unknown_family_falls_back_to_courier() {
        let ctx = FontContext::new();
        let w1 = ctx.char_width('A', "courier", FontStyle::REGULAR, 12.0);
        let w2 = ctx.char_width('A', "NoSuchFont", FontStyle::REGULAR, 12.0);
        assert!((w1 - w2).abs() < 1e-9);
    }

    #[test]
    fn proportional_families_differ() {
        let ctx = FontContext::new();
        let i = ctx.char_width('i', "helvetica", FontStyle::REGULAR, 12.0);
        let m = ctx.char_width('m', "helvetica", FontStyle::REGULAR, 12.0);
        assert!(m > i);
        let times = ctx.measure_string("Report", "times", FontStyle::REGULAR, 12.0);
        let helv = ctx.measure_string("Report", "helvetica", FontStyle::REGULAR, 12.0);
        assert!(times < helv);
    }

    #[test]
    fn unparsable_custom_font_measures_as_courier() {
        let mut ctx = FontContext::new();
        let style = FontStyle::REGULAR;
        ctx.registry_mut().register("Brand", style, vec![0, 1, 2, 3]);
        assert!(ctx.registry().contains("brand", style));
        let w = ctx.measure_string("ab", "Brand", style, 10.0);
        assert!((w - 12.0).abs() < 1e-9);
    }
}
