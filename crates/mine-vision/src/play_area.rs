use image::RgbaImage;
use mine_capture::BoundingBox;
use tracing::debug;

use crate::blobs::{find_blobs, largest};
use crate::hsv::PLAY_AREA_TAN;
use crate::mask::threshold;

/// Locate the playing field: the bounding box of the largest connected
/// tan/yellow region in the frame, measured by filled area so dialogs drawn
/// over the field do not shrink it.
///
/// Returns `None` if no tan pixel is present at all.
pub fn locate_play_area(frame: &RgbaImage) -> Option<BoundingBox> {
    let mask = threshold(frame, &PLAY_AREA_TAN);
    let blobs = find_blobs(&mask);

    let best = largest(&blobs)?;
    if best.filled_area == 0 {
        return None;
    }

    debug!(
        "Play area: x={} y={} w={} h={} ({} tan region(s), largest {} px)",
        best.bounds.x,
        best.bounds.y,
        best.bounds.width,
        best.bounds.height,
        blobs.len(),
        best.filled_area
    );
    Some(best.bounds)
}

/// Interior of the play area where markers are searched.
///
/// The outer edges carry scenery (plants, trees) whose colors collide with the
/// marker bands, so 10% is trimmed from each side, 15% from the top and 20%
/// from the bottom.
pub fn derive_work_area(play_area: &BoundingBox) -> BoundingBox {
    let margin_x = (play_area.width as f64 * 0.10) as u32;
    let margin_top = (play_area.height as f64 * 0.15) as u32;
    let margin_bottom = (play_area.height as f64 * 0.20) as u32;

    BoundingBox {
        x: play_area.x + margin_x,
        y: play_area.y + margin_top,
        width: play_area.width.saturating_sub(2 * margin_x),
        height: play_area
            .height
            .saturating_sub(margin_top + margin_bottom),
    }
}

/// Centered window where marker dialogs render: 60% of the width, 50% of the
/// height.
pub fn dialog_window(play_area: &BoundingBox) -> BoundingBox {
    play_area.fraction(0.20, 0.25, 0.60, 0.50)
}

/// Bottom strip (lower 30%) holding the search control.
pub fn search_bar_window(play_area: &BoundingBox) -> BoundingBox {
    BoundingBox {
        x: play_area.x,
        y: play_area.y + (play_area.height as f64 * 0.7) as u32,
        width: play_area.width,
        height: (play_area.height as f64 * 0.3) as u32,
    }
}
