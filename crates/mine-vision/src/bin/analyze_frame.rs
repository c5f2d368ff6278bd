//! CLI tool to run a saved screenshot through detection.
//! Usage: cargo run -p mine-vision --features cli --bin analyze_frame -- <screenshot.png> [output_dir]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::{GrayImage, RgbaImage};
use mine_capture::crop_box;
use mine_vision::hsv::PLAY_AREA_TAN;
use mine_vision::mask::{close, open, threshold};
use mine_vision::{dialog_window, find_button, search_bar_window, survey, ButtonColor, MarkerColor};

/// Screenshot to read and directory for the debug masks.
fn paths() -> Result<(PathBuf, PathBuf)> {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "analyze_frame".to_string());
    let Some(input) = args.next() else {
        bail!("Usage: {} <screenshot.png> [output_dir]", program);
    };
    let output = args.next().unwrap_or_else(|| "./debug_output".to_string());
    Ok((input.into(), output.into()))
}

fn load(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?;
    Ok(img.to_rgba8())
}

fn save_mask(mask: &GrayImage, dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    mask.save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let (input_path, output_dir) = paths()?;
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let img = load(&input_path)?;
    println!("Loaded {} ({}x{})", input_path.display(), img.width(), img.height());

    save_mask(&threshold(&img, &PLAY_AREA_TAN), &output_dir, "play_area_mask.png")?;

    println!("\n=== Play Area ===");
    let Some(s) = survey(&img) else {
        println!("Play area: NOT FOUND");
        return Ok(());
    };
    let p = s.play_area;
    let w = s.work_area;
    println!("Play area: x={} y={} w={} h={}", p.x, p.y, p.width, p.height);
    println!("Work area: x={} y={} w={} h={}", w.x, w.y, w.width, w.height);

    let (work_crop, _) = crop_box(&img, &w);
    work_crop
        .save(output_dir.join("work_area.png"))
        .context("Failed to write work area crop")?;
    for color in [MarkerColor::Red, MarkerColor::Green] {
        let mask = open(&close(&threshold(&work_crop, &color.spec().band), 5), 5);
        save_mask(&mask, &output_dir, &format!("{}_mask.png", color.label_prefix()))?;
    }

    println!("\n=== Markers ===");
    for m in s.red.iter().chain(s.green.iter()) {
        println!("  {}: ({}, {})", m.label, m.position.x, m.position.y);
    }
    if s.red.is_empty() && s.green.is_empty() {
        println!("  none");
    }

    println!("\n=== Buttons ===");
    let dialog = dialog_window(&p);
    let search_bar = search_bar_window(&p);
    for color in ButtonColor::ALL {
        let window = if color == ButtonColor::Blue { &search_bar } else { &dialog };
        match find_button(&img, color, Some(window)) {
            Some(at) => println!("  {}: ({}, {})", color.name(), at.x, at.y),
            None => println!("  {}: NOT FOUND", color.name()),
        }
    }

    println!("\nDebug images saved to: {}", output_dir.display());
    Ok(())
}
