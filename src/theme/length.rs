/// Pixel size of `1rem`/`1em` when resolving breakpoints.
pub const ROOT_FONT_SIZE_PX: f64 = 16.0;

const PT_TO_PX: f64 = 96.0 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Rem,
    Em,
    Pt,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn px(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
        }
    }

    pub fn to_px(self) -> f64 {
        match self.unit {
            LengthUnit::Px => self.value,
            LengthUnit::Rem | LengthUnit::Em => self.value * ROOT_FONT_SIZE_PX,
            LengthUnit::Pt => self.value * PT_TO_PX,
        }
    }
}

/// Parses `640px`, `48rem`, `2.5em`, `12pt` or a bare `0`. Units are case-insensitive.
pub fn parse_length(raw: &str) -> Option<Length> {
    crate::css::parse_length(raw)
}

/// Formats a pixel magnitude without a trailing `.0` for whole numbers.
pub fn format_px(px: f64) -> String {
    if px.fract() == 0.0 {
        format!("{}px", px as i64)
    } else {
        format!("{px}px")
    }
}
