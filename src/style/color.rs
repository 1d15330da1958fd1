//! Hex color codes.

use std::fmt;

use crate::error::ParseError;

/// A 24-bit RGB color with a separate alpha channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Packed `0xAARRGGBB`.
    pub argb: u32,
    /// Packed `0xRRGGBB`.
    pub rgb: u32,
    /// Opacity, 0.0 - 1.0.
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        argb: 0xFF00_0000,
        rgb: 0,
        alpha: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        argb: 0,
        rgb: 0,
        alpha: 0.0,
    };

    pub fn new(rgb: u32, alpha: f64) -> Self {
        let rgb = rgb & 0x00FF_FFFF;
        let alpha = alpha.clamp(0.0, 1.0);
        let a = (alpha * 255.0).round() as u32;
        Self {
            argb: (a << 24) | rgb,
            rgb,
            alpha,
        }
    }

    /// Parse a 24-bit (`RRGGBB`) or 32-bit (`AARRGGBB`) hex code, with or
    /// without a leading `#`. 24-bit codes are fully opaque.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let hex = input.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) || hex.is_empty() {
            return Err(ParseError::new(
                "color",
                input,
                "expected 24 or 32 bit hex",
            ));
        }
        let n = u32::from_str_radix(hex, 16)
            .map_err(|e| ParseError::new("color", input, e.to_string()))?;
        match hex.len() {
            6 => Ok(Color::new(n, 1.0)),
            8 => {
                let alpha = ((n >> 24) & 0xFF) as f64 / 255.0;
                Ok(Color {
                    argb: n,
                    rgb: n & 0x00FF_FFFF,
                    alpha,
                })
            }
            _ => Err(ParseError::new(
                "color",
                input,
                "expected 24 or 32 bit hex",
            )),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.argb)
    }
}

impl std::str::FromStr for Color {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_digits_are_opaque() {
        for (input, rgb) in [("ff0000", 0xFF0000), ("#00ff7f", 0x00FF7F), ("123456", 0x123456)] {
            let c = Color::parse(input).unwrap();
            assert_eq!(c.alpha, 1.0);
            assert_eq!(c.rgb, rgb);
            assert_eq!(c.argb, 0xFF00_0000 | rgb);
        }
    }

    #[test]
    fn eight_digits_carry_alpha_in_high_byte() {
        let c = Color::parse("#80337733").unwrap();
        assert!((c.alpha - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(c.rgb, 0x337733);
        assert_eq!(c.argb, 0x8033_7733);

        let c = Color::parse("00ffffff").unwrap();
        assert_eq!(c.alpha, 0.0);
        assert_eq!(c.rgb, 0xFFFFFF);
    }

    #[test]
    fn rejects_non_hex_and_bad_lengths() {
        assert!(Color::parse("zzzzzz").is_err());
        assert!(Color::parse("#fff").is_err());
        assert!(Color::parse("1234567").is_err());
        assert!(Color::parse("").is_err());
        let err = Color::parse("zzzzzz").unwrap_err();
        assert_eq!(err.input, "zzzzzz");
        assert_eq!(err.kind, "color");
    }

    #[test]
    fn display_is_argb_hex() {
        assert_eq!(Color::parse("0a0b0c").unwrap().to_string(), "#FF0A0B0C");
        assert_eq!(Color::parse("ff0000").unwrap().rgb, 0xFF0000);
    }
}
