use image::RgbaImage;
use mine_capture::{crop_box, BoundingBox, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blobs::{find_blobs, largest};
use crate::hsv::{ColorSpec, HsvRange, HueBand};
use crate::mask::{close, threshold};

const BUTTON_KERNEL: u32 = 7;

/// Dialog controls, identified by color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonColor {
    /// ATTACK in the mine dialog.
    Red,
    /// DEPART in the troop dialog.
    Green,
    /// RETURN on a held mine.
    Yellow,
    /// SEARCH in the bottom bar.
    Blue,
}

impl ButtonColor {
    pub const ALL: [ButtonColor; 4] = [
        ButtonColor::Red,
        ButtonColor::Green,
        ButtonColor::Yellow,
        ButtonColor::Blue,
    ];

    pub fn spec(self) -> &'static ColorSpec {
        match self {
            ButtonColor::Red => &RED_BUTTON,
            ButtonColor::Green => &GREEN_BUTTON,
            ButtonColor::Yellow => &YELLOW_BUTTON,
            ButtonColor::Blue => &BLUE_BUTTON,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ButtonColor::Red => "ATTACK",
            ButtonColor::Green => "DEPART",
            ButtonColor::Yellow => "RETURN",
            ButtonColor::Blue => "SEARCH",
        }
    }
}

const RED_BUTTON: ColorSpec = ColorSpec {
    band: HueBand::Wrapped(
        HsvRange::new([0, 100, 100], [10, 255, 255]),
        HsvRange::new([170, 100, 100], [180, 255, 255]),
    ),
    min_area: 1000,
};

const GREEN_BUTTON: ColorSpec = ColorSpec {
    band: HueBand::Single(HsvRange::new([40, 80, 80], [80, 255, 255])),
    min_area: 1000,
};

const YELLOW_BUTTON: ColorSpec = ColorSpec {
    band: HueBand::Single(HsvRange::new([20, 100, 100], [35, 255, 255])),
    min_area: 1000,
};

// The search control renders noticeably larger than the dialog buttons.
const BLUE_BUTTON: ColorSpec = ColorSpec {
    band: HueBand::Single(HsvRange::new([95, 120, 150], [115, 255, 255])),
    min_area: 3000,
};

/// One look for a button: the largest blob of the button's color, optionally
/// restricted to `window`, accepted if its area exceeds the color's minimum.
///
/// Returns its centroid in full-frame coordinates.
pub fn find_button(frame: &RgbaImage, color: ButtonColor, window: Option<&BoundingBox>) -> Option<Point> {
    let spec = color.spec();

    let (region, origin) = match window {
        Some(w) => {
            let (crop, used) = crop_box(frame, w);
            (crop, Point::new(used.x as i32, used.y as i32))
        }
        None => (frame.clone(), Point::new(0, 0)),
    };

    let mask = close(&threshold(&region, &spec.band), BUTTON_KERNEL);
    let blobs = find_blobs(&mask);
    let best = largest(&blobs)?;

    if best.filled_area > spec.min_area {
        let at = best.centroid.offset(origin.x, origin.y);
        debug!("{} button at ({}, {}), {} px", color.name(), at.x, at.y, best.filled_area);
        Some(at)
    } else {
        debug!(
            "{} button candidate too small: {} px (need > {})",
            color.name(),
            best.filled_area,
            spec.min_area
        );
        None
    }
}
