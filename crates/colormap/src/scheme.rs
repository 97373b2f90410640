//! Threshold tables mapping index values to colors.

use ndlayer_core::IndexKind;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const GREEN: Self = Self::new(0, 128, 0);
    pub const YELLOW: Self = Self::new(255, 255, 0);
    pub const BROWN: Self = Self::new(139, 69, 19);

    /// Opaque RGBA
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Strict comparison against a bound. NaN never matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Above(f64),
    Below(f64),
}

impl Threshold {
    #[inline]
    pub fn matches(&self, v: f64) -> bool {
        match *self {
            Self::Above(bound) => v > bound,
            Self::Below(bound) => v < bound,
        }
    }
}

/// One row of a class table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassRule {
    pub threshold: Threshold,
    pub color: Rgb,
}

impl ClassRule {
    pub const fn above(bound: f64, color: Rgb) -> Self {
        Self {
            threshold: Threshold::Above(bound),
            color,
        }
    }

    pub const fn below(bound: f64, color: Rgb) -> Self {
        Self {
            threshold: Threshold::Below(bound),
            color,
        }
    }
}

/// Ordered rules, first match wins; `fallback` colors everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassTable {
    pub rules: &'static [ClassRule],
    pub fallback: Rgb,
}

const VEGETATION_RULES: &[ClassRule] = &[
    ClassRule::above(0.3, Rgb::GREEN),
    ClassRule::above(0.0, Rgb::YELLOW),
];

// The second and third rows overlap the first; every value in (-0.2, 0)
// is already white by the time the blue row is reached, so only v >= 0
// renders blue. Kept as published.
const WATER_RULES: &[ClassRule] = &[
    ClassRule::below(-0.2, Rgb::WHITE),
    ClassRule::below(0.0, Rgb::WHITE),
    ClassRule::above(-0.2, Rgb::BLUE),
];

impl ClassTable {
    pub const VEGETATION: Self = Self {
        rules: VEGETATION_RULES,
        fallback: Rgb::BROWN,
    };

    pub const WATER: Self = Self {
        rules: WATER_RULES,
        fallback: Rgb::WHITE,
    };

    pub fn for_kind(kind: IndexKind) -> &'static Self {
        match kind {
            IndexKind::Vegetation => &Self::VEGETATION,
            IndexKind::Water => &Self::WATER,
        }
    }

    /// Color for a single index value
    #[inline]
    pub fn color(&self, v: f64) -> Rgb {
        self.rules
            .iter()
            .find(|rule| rule.threshold.matches(v))
            .map_or(self.fallback, |rule| rule.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vegetation_table() {
        let t = ClassTable::for_kind(IndexKind::Vegetation);
        assert_eq!(t.color(0.5), Rgb::GREEN);
        assert_eq!(t.color(0.3), Rgb::YELLOW);
        assert_eq!(t.color(0.1), Rgb::YELLOW);
        assert_eq!(t.color(0.0), Rgb::BROWN);
        assert_eq!(t.color(-0.7), Rgb::BROWN);
    }

    #[test]
    fn water_table_quirk() {
        let t = ClassTable::for_kind(IndexKind::Water);
        assert_eq!(t.color(-0.5), Rgb::WHITE);
        assert_eq!(t.color(-0.1), Rgb::WHITE);
        assert_eq!(t.color(0.0), Rgb::BLUE);
        assert_eq!(t.color(0.8), Rgb::BLUE);
    }

    #[test]
    fn nan_takes_fallback() {
        assert_eq!(ClassTable::VEGETATION.color(f64::NAN), Rgb::BROWN);
        assert_eq!(ClassTable::WATER.color(f64::NAN), Rgb::WHITE);
    }
}
