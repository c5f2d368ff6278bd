use image::RgbaImage;
use mine_capture::{crop_box, BoundingBox, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blobs::find_blobs;
use crate::hsv::{ColorSpec, GREEN_MARKER, RED_MARKER};
use crate::mask::{close, open, threshold};
use crate::play_area::{derive_work_area, locate_play_area};

/// At most this many markers are reported per detection.
pub const MAX_MARKERS: usize = 4;

/// Blob centroids closer than this (inclusive) belong to the same marker.
pub const CLUSTER_RADIUS: f64 = 45.0;

const MARKER_KERNEL: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerColor {
    /// Mine that can be attacked.
    Red,
    /// Mine held by our troops.
    Green,
}

impl MarkerColor {
    pub fn spec(self) -> &'static ColorSpec {
        match self {
            MarkerColor::Red => &RED_MARKER,
            MarkerColor::Green => &GREEN_MARKER,
        }
    }

    pub fn label_prefix(self) -> &'static str {
        match self {
            MarkerColor::Red => "red_mine",
            MarkerColor::Green => "green_mine",
        }
    }
}

/// A detected marker. The label is positional (`red_mine1` is the top-most,
/// then left-most red marker), so it only identifies a marker within one
/// batch of the same layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub label: String,
    pub position: Point,
    pub color: MarkerColor,
}

/// A group of nearby blob centroids that make up one visual marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub centroid: Point,
    pub size: usize,
}

/// Everything detected in one frame.
#[derive(Debug, Clone)]
pub struct Survey {
    pub play_area: BoundingBox,
    pub work_area: BoundingBox,
    pub red: Vec<Marker>,
    pub green: Vec<Marker>,
}

/// Locate the play area and detect red and green markers in its work area.
///
/// Returns `None` when the play area cannot be found.
pub fn survey(frame: &RgbaImage) -> Option<Survey> {
    let play_area = locate_play_area(frame)?;
    let work_area = derive_work_area(&play_area);

    let red = detect_markers(frame, &work_area, MarkerColor::Red);
    let green = detect_markers(frame, &work_area, MarkerColor::Green);

    Some(Survey {
        play_area,
        work_area,
        red,
        green,
    })
}

/// Detect and label markers of one color inside `region`.
pub fn detect_markers(frame: &RgbaImage, region: &BoundingBox, color: MarkerColor) -> Vec<Marker> {
    detect_marker_points(frame, region, color.spec())
        .into_iter()
        .enumerate()
        .map(|(i, position)| Marker {
            label: format!("{}{}", color.label_prefix(), i + 1),
            position,
            color,
        })
        .collect()
}

/// Marker centers in full-frame coordinates, sorted by (y, x).
///
/// Blobs at or below the color's area threshold are dropped; the survivors are
/// clustered so a marker split by an overlapping sprite still counts once.
/// When more than [`MAX_MARKERS`] clusters remain, the ones with the most
/// member blobs are kept.
pub fn detect_marker_points(frame: &RgbaImage, region: &BoundingBox, spec: &ColorSpec) -> Vec<Point> {
    let (crop, used) = crop_box(frame, region);

    let mask = threshold(&crop, &spec.band);
    let mask = close(&mask, MARKER_KERNEL);
    let mask = open(&mask, MARKER_KERNEL);

    let centroids: Vec<Point> = find_blobs(&mask)
        .into_iter()
        .filter(|b| b.filled_area > spec.min_area)
        .map(|b| b.centroid)
        .collect();

    if centroids.is_empty() {
        return Vec::new();
    }

    let mut clusters = cluster(&centroids, CLUSTER_RADIUS);
    debug!(
        "{} blob(s) above {} px grouped into {} cluster(s)",
        centroids.len(),
        spec.min_area,
        clusters.len()
    );

    if clusters.len() > MAX_MARKERS {
        clusters.sort_by(|a, b| b.size.cmp(&a.size));
        clusters.truncate(MAX_MARKERS);
    }

    let mut points: Vec<Point> = clusters
        .into_iter()
        .map(|c| c.centroid.offset(used.x as i32, used.y as i32))
        .collect();
    points.sort_by_key(|p| (p.y, p.x));
    points
}

/// Density clustering with a minimum cluster size of one: every point is a
/// core point, so clusters are the connected groups of the "within `radius`"
/// relation and isolated points form singletons.
///
/// Clusters are returned in order of their first member in `points`.
pub fn cluster(points: &[Point], radius: f64) -> Vec<Cluster> {
    let mut assigned = vec![false; points.len()];
    let mut clusters = Vec::new();

    for seed in 0..points.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;

        let mut members = vec![seed];
        let mut frontier = vec![seed];
        while let Some(i) = frontier.pop() {
            for j in 0..points.len() {
                if !assigned[j] && points[i].distance(points[j]) <= radius {
                    assigned[j] = true;
                    members.push(j);
                    frontier.push(j);
                }
            }
        }

        let n = members.len() as f64;
        let mean_x = members.iter().map(|&i| points[i].x as f64).sum::<f64>() / n;
        let mean_y = members.iter().map(|&i| points[i].y as f64).sum::<f64>() / n;
        clusters.push(Cluster {
            centroid: Point::new(mean_x as i32, mean_y as i32),
            size: members.len(),
        });
    }

    clusters
}
