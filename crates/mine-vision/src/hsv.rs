//! Hue/saturation/value color model on the 8-bit scale used by most capture
//! tooling: hue in `0..=180` (degrees halved), saturation and value in `0..=255`.

use image::Rgba;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert an RGBA pixel to HSV. Alpha is ignored.
pub fn rgb_to_hsv(px: &Rgba<u8>) -> Hsv {
    let (r, g, b) = (px[0] as f64, px[1] as f64, px[2] as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    Hsv {
        h: (h / 2.0).round().min(180.0) as u8,
        s: s.round() as u8,
        v: max as u8,
    }
}

/// Inclusive HSV box, `lower <= px <= upper` on every channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, c: Hsv) -> bool {
        (self.lower[0]..=self.upper[0]).contains(&c.h)
            && (self.lower[1]..=self.upper[1]).contains(&c.s)
            && (self.lower[2]..=self.upper[2]).contains(&c.v)
    }
}

/// Hue selection for a color. Reds straddle the hue boundary and need two
/// boxes whose masks are unioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HueBand {
    Single(HsvRange),
    Wrapped(HsvRange, HsvRange),
}

impl HueBand {
    pub fn contains(&self, c: Hsv) -> bool {
        match self {
            HueBand::Single(r) => r.contains(c),
            HueBand::Wrapped(a, b) => a.contains(c) || b.contains(c),
        }
    }
}

/// Color band plus the smallest blob area (exclusive) accepted for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSpec {
    pub band: HueBand,
    pub min_area: u32,
}

/// Tan/yellow background of the playing field.
pub const PLAY_AREA_TAN: HueBand =
    HueBand::Single(HsvRange::new([15, 50, 100], [40, 200, 255]));

pub const RED_MARKER: ColorSpec = ColorSpec {
    band: HueBand::Wrapped(
        HsvRange::new([0, 120, 120], [10, 255, 255]),
        HsvRange::new([170, 120, 120], [180, 255, 255]),
    ),
    min_area: 150,
};

pub const GREEN_MARKER: ColorSpec = ColorSpec {
    band: HueBand::Single(HsvRange::new([35, 60, 60], [85, 255, 255])),
    min_area: 100,
};
