use anyhow::Result;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

mod desktop;

pub use desktop::{DesktopPointer, MonitorCapture, SystemClock};

/// A pixel position in full-frame screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Operator abort: the pointer was parked in a screen corner.
///
/// Returned by a [`Pointer`] instead of clicking. Callers can tell it apart
/// from ordinary capability errors with `anyhow::Error::downcast_ref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailSafe {
    pub at: Point,
}

impl fmt::Display for FailSafe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fail-safe triggered: pointer moved to a screen corner at ({}, {})",
            self.at.x, self.at.y
        )
    }
}

impl std::error::Error for FailSafe {}

/// Axis-aligned pixel rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Sub-rectangle described by fractions of this box's size.
    ///
    /// Each fraction is truncated to whole pixels independently, the same way
    /// margins are computed for the work area.
    pub fn fraction(&self, left: f64, top: f64, width: f64, height: f64) -> BoundingBox {
        BoundingBox {
            x: self.x + (self.width as f64 * left) as u32,
            y: self.y + (self.height as f64 * top) as u32,
            width: (self.width as f64 * width) as u32,
            height: (self.height as f64 * height) as u32,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x as i32
            && p.y >= self.y as i32
            && p.x < (self.x + self.width) as i32
            && p.y < (self.y + self.height) as i32
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Crop a box from a captured frame, clamped to the frame bounds.
///
/// Returns the crop together with the box actually used, so callers can map
/// crop-local coordinates back into the frame.
pub fn crop_box(frame: &RgbaImage, region: &BoundingBox) -> (RgbaImage, BoundingBox) {
    let (w, h) = (frame.width(), frame.height());

    let x = region.x.min(w);
    let y = region.y.min(h);
    let rw = region.width.min(w - x);
    let rh = region.height.min(h - y);

    let clamped = BoundingBox::new(x, y, rw, rh);
    let crop = image::imageops::crop_imm(frame, x, y, rw, rh).to_image();
    (crop, clamped)
}

/// Supplies full-screen raster captures on demand. No caching between calls.
pub trait FrameSource {
    fn capture_frame(&mut self) -> Result<RgbaImage>;
}

/// Simulated pointing device.
pub trait Pointer {
    /// Left-click at screen coordinates.
    fn click(&mut self, at: Point) -> Result<()>;
}

/// Time source for settle delays and polling deadlines.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}
