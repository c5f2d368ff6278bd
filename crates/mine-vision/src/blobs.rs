use image::GrayImage;
use mine_capture::{BoundingBox, Point};

use crate::mask::ON;

/// An 8-connected region of set mask pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Pixel count.
    pub area: u32,
    /// Pixels inside the outer boundary, holes included. An overlay covering
    /// the middle of a region does not shrink it.
    pub filled_area: u32,
    pub bounds: BoundingBox,
    /// Mean pixel position, mask-local, truncated to whole pixels.
    pub centroid: Point,
}

/// Label all 8-connected regions of `mask`.
///
/// Blobs come back in raster order of their first pixel (top row first, then
/// left to right), which keeps downstream tie-breaking reproducible.
pub fn find_blobs(mask: &GrayImage) -> Vec<Blob> {
    let (w, h) = mask.dimensions();
    // 0 is unlabeled, blob i carries label i + 1.
    let mut labels = vec![0u32; (w as usize) * (h as usize)];
    let mut blobs: Vec<Blob> = Vec::new();
    let mut stack: Vec<(u32, u32)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if labels[idx] != 0 || mask.get_pixel(x, y)[0] != ON {
                continue;
            }

            let id = blobs.len() as u32 + 1;
            labels[idx] = id;
            stack.push((x, y));

            let mut area = 0u32;
            let (mut sum_x, mut sum_y) = (0u64, 0u64);
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);

            while let Some((cx, cy)) = stack.pop() {
                area += 1;
                sum_x += cx as u64;
                sum_y += cy as u64;
                min_x = min_x.min(cx);
                max_x = max_x.max(cx);
                min_y = min_y.min(cy);
                max_y = max_y.max(cy);

                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = cx as i64 + dx;
                        let ny = cy as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        let (nx, ny) = (nx as u32, ny as u32);
                        let nidx = (ny * w + nx) as usize;
                        if labels[nidx] == 0 && mask.get_pixel(nx, ny)[0] == ON {
                            labels[nidx] = id;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            let bounds = BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);
            blobs.push(Blob {
                area,
                filled_area: filled_area(&labels, w, &bounds, id),
                bounds,
                centroid: Point::new(
                    (sum_x / area as u64) as i32,
                    (sum_y / area as u64) as i32,
                ),
            });
        }
    }

    blobs
}

/// Count the pixels of `bounds` not reachable from its border without
/// crossing blob `id`. Background moves 4-connected, so a gap the blob closes
/// diagonally still counts as enclosed.
fn filled_area(labels: &[u32], width: u32, bounds: &BoundingBox, id: u32) -> u32 {
    let (bw, bh) = (bounds.width, bounds.height);
    let is_blob = |x: u32, y: u32| labels[((bounds.y + y) * width + bounds.x + x) as usize] == id;

    let mut outside = vec![false; (bw as usize) * (bh as usize)];
    let mut stack: Vec<(u32, u32)> = Vec::new();
    for x in 0..bw {
        stack.push((x, 0));
        stack.push((x, bh - 1));
    }
    for y in 0..bh {
        stack.push((0, y));
        stack.push((bw - 1, y));
    }

    let mut reached = 0u32;
    while let Some((x, y)) = stack.pop() {
        let idx = (y * bw + x) as usize;
        if outside[idx] || is_blob(x, y) {
            continue;
        }
        outside[idx] = true;
        reached += 1;

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < bw {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < bh {
            stack.push((x, y + 1));
        }
    }

    bw * bh - reached
}

/// The blob with the largest filled area. Earlier blobs win ties.
pub fn largest(blobs: &[Blob]) -> Option<&Blob> {
    blobs
        .iter()
        .fold(None, |best: Option<&Blob>, b| match best {
            Some(cur) if cur.filled_area >= b.filled_area => Some(cur),
            _ => Some(b),
        })
}
