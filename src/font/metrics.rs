//! Advance widths of the standard families, in 1/1000 em.
//!
//! Printable ASCII is tabulated from the Adobe font metrics. Anything else
//! uses the family's default advance. Bold and italic faces share the
//! regular table.

/// Width table for one standard family.
#[derive(Debug)]
pub struct StandardFontMetrics {
    /// Widths of `' '..='~'`.
    pub widths: [u16; 95],
    pub default_width: u16,
}

impl StandardFontMetrics {
    /// Advance width of a character, in the unit of `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = match ch {
            ' '..='~' => self.widths[ch as usize - 32],
            _ => self.default_width,
        };
        w as f64 * font_size / 1000.0
    }

    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    widths: [600; 95],
    default_width: 600,
};

#[rustfmt::skip]
pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: [
        // space ! " # $ % & ' ( ) * + , - . /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // : ; < = > ? @
        278, 278, 584, 584, 584, 556, 1015,
        // A-Z
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [ \ ] ^ _ `
        278, 278, 278, 469, 556, 333,
        // a-z
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // { | } ~
        334, 260, 334, 584,
    ],
    default_width: 556,
};

#[rustfmt::skip]
pub static TIMES: StandardFontMetrics = StandardFontMetrics {
    widths: [
        // space ! " # $ % & ' ( ) * + , - . /
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        // 0-9
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        // : ; < = > ? @
        278, 278, 564, 564, 564, 444, 921,
        // A-Z
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        // [ \ ] ^ _ `
        333, 278, 333, 469, 500, 333,
        // a-z
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        // { | } ~
        480, 200, 480, 541,
    ],
    default_width: 500,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_lookup() {
        assert_eq!(HELVETICA.widths['A' as usize - 32], 667);
        assert_eq!(TIMES.widths['a' as usize - 32], 444);
        assert_eq!(HELVETICA.widths['~' as usize - 32], 584);
        assert!((COURIER.char_width('é', 10.0) - 6.0).abs() < 1e-9);
    }
}
