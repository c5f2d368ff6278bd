//! Binary masks (0 / 255 in a `GrayImage`) and square-kernel morphology.

use image::{GrayImage, Luma, RgbaImage};

use crate::hsv::{rgb_to_hsv, HueBand};

pub const ON: u8 = 255;

/// Mark every pixel whose HSV value falls inside `band`.
pub fn threshold(image: &RgbaImage, band: &HueBand) -> GrayImage {
    let (w, h) = image.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        if band.contains(rgb_to_hsv(image.get_pixel(x, y))) {
            Luma([ON])
        } else {
            Luma([0])
        }
    })
}

/// Dilate then erode. Bridges gaps narrower than the kernel.
pub fn close(mask: &GrayImage, kernel: u32) -> GrayImage {
    erode(&dilate(mask, kernel), kernel)
}

/// Erode then dilate. Removes specks smaller than the kernel.
pub fn open(mask: &GrayImage, kernel: u32) -> GrayImage {
    dilate(&erode(mask, kernel), kernel)
}

pub fn dilate(mask: &GrayImage, kernel: u32) -> GrayImage {
    square_filter(mask, kernel, Extreme::Max)
}

/// Pixels outside the image do not participate, so blobs touching the border
/// are not eaten away from that side.
pub fn erode(mask: &GrayImage, kernel: u32) -> GrayImage {
    square_filter(mask, kernel, Extreme::Min)
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

impl Extreme {
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extreme::Min => a.min(b),
            Extreme::Max => a.max(b),
        }
    }
}

// A square kernel is separable: a horizontal pass followed by a vertical pass
// gives the same result as the full 2D window.
fn square_filter(mask: &GrayImage, kernel: u32, op: Extreme) -> GrayImage {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 || kernel <= 1 {
        return mask.clone();
    }
    let r = (kernel / 2) as i64;

    let horizontal = GrayImage::from_fn(w, h, |x, y| {
        let lo = (x as i64 - r).max(0) as u32;
        let hi = (x as i64 + r).min(w as i64 - 1) as u32;
        let mut acc = mask.get_pixel(lo, y)[0];
        for xx in lo + 1..=hi {
            acc = op.pick(acc, mask.get_pixel(xx, y)[0]);
        }
        Luma([acc])
    });

    GrayImage::from_fn(w, h, |x, y| {
        let lo = (y as i64 - r).max(0) as u32;
        let hi = (y as i64 + r).min(h as i64 - 1) as u32;
        let mut acc = horizontal.get_pixel(x, lo)[0];
        for yy in lo + 1..=hi {
            acc = op.pick(acc, horizontal.get_pixel(x, yy)[0]);
        }
        Luma([acc])
    })
}

pub fn count_on(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p[0] == ON).count() as u64
}
