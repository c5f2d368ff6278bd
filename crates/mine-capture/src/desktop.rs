use anyhow::{bail, Context, Result};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use image::RgbaImage;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use xcap::Monitor;

use crate::{Clock, FailSafe, FrameSource, Point, Pointer};

/// Pixels from a screen corner that count as the fail-safe position.
const FAIL_SAFE_MARGIN: i32 = 2;

/// Captures the primary monitor.
pub struct MonitorCapture {
    monitor: Monitor,
}

impl MonitorCapture {
    pub fn primary() -> Result<Self> {
        let monitors = Monitor::all().context("Failed to enumerate monitors")?;

        let mut fallback = None;
        for monitor in monitors {
            match monitor.is_primary() {
                Ok(true) => {
                    info!("Capturing primary monitor: {}", monitor.name().unwrap_or_default());
                    return Ok(Self { monitor });
                }
                Ok(false) => {
                    if fallback.is_none() {
                        fallback = Some(monitor);
                    }
                }
                Err(e) => warn!("Failed to query monitor: {}", e),
            }
        }

        match fallback {
            Some(monitor) => {
                warn!(
                    "No primary monitor reported, using {}",
                    monitor.name().unwrap_or_default()
                );
                Ok(Self { monitor })
            }
            None => bail!("No monitor available for capture"),
        }
    }
}

impl FrameSource for MonitorCapture {
    fn capture_frame(&mut self) -> Result<RgbaImage> {
        let img = self
            .monitor
            .capture_image()
            .context("Failed to capture monitor image")?;
        Ok(img)
    }
}

/// OS pointer driven through enigo.
///
/// Parking the cursor in any screen corner aborts the next click, giving the
/// operator a way to stop the run by hand.
pub struct DesktopPointer {
    enigo: Enigo,
}

impl DesktopPointer {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default()).context("Failed to open input device")?;
        Ok(Self { enigo })
    }

    fn check_fail_safe(&self) -> Result<()> {
        let (x, y) = self.enigo.location().context("Failed to read pointer location")?;
        let (w, h) = self
            .enigo
            .main_display()
            .context("Failed to read display size")?;
        if in_corner(Point::new(x, y), w, h) {
            return Err(FailSafe { at: Point::new(x, y) }.into());
        }
        Ok(())
    }
}

impl Pointer for DesktopPointer {
    fn click(&mut self, at: Point) -> Result<()> {
        self.check_fail_safe()?;
        debug!("Click at ({}, {})", at.x, at.y);
        self.enigo.move_mouse(at.x, at.y, Coordinate::Abs)?;
        self.enigo.button(Button::Left, Direction::Click)?;
        Ok(())
    }
}

fn in_corner(p: Point, width: i32, height: i32) -> bool {
    let near_left = p.x <= FAIL_SAFE_MARGIN;
    let near_right = p.x >= width - 1 - FAIL_SAFE_MARGIN;
    let near_top = p.y <= FAIL_SAFE_MARGIN;
    let near_bottom = p.y >= height - 1 - FAIL_SAFE_MARGIN;
    (near_left || near_right) && (near_top || near_bottom)
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
