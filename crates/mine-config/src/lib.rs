use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Timing and distance knobs for the control layer.
///
/// Outcomes are verified by re-reading the screen after a settle delay, which
/// races the game's own animations. When verification is flaky on a slower
/// machine, the `*_settle_ms` values are the ones to raise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Pause after every click.
    pub click_settle_ms: u64,
    /// Pause after opening a marker dialog or pressing a dialog button.
    pub dialog_settle_ms: u64,
    /// How long to wait for a button to appear.
    pub button_timeout_ms: u64,
    /// Interval between button polls.
    pub poll_interval_ms: u64,
    /// Wait after DEPART before checking whether the mine turned green.
    pub depart_settle_ms: u64,
    /// Wait after SEARCH before looking for new markers.
    pub search_settle_ms: u64,
    /// Pause between loop cycles and between troop returns.
    pub cycle_pause_ms: u64,
    /// Markers are drawn above the clickable structure; click this many
    /// pixels below the marker center.
    pub click_offset_y: i32,
    /// A green marker within this distance of an attacked mine confirms the
    /// attack.
    pub verify_radius: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            click_settle_ms: 150,
            dialog_settle_ms: 200,
            button_timeout_ms: 2500,
            poll_interval_ms: 100,
            depart_settle_ms: 1000,
            search_settle_ms: 1000,
            cycle_pause_ms: 200,
            click_offset_y: 30,
            verify_radius: 60.0,
        }
    }
}

impl Tuning {
    /// Load tuning from a JSON file. Fields missing from the file keep their
    /// defaults; a missing file yields the defaults entirely.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "No tuning file found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let tuning: Tuning = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn dialog_settle(&self) -> Duration {
        Duration::from_millis(self.dialog_settle_ms)
    }

    pub fn button_timeout(&self) -> Duration {
        Duration::from_millis(self.button_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn depart_settle(&self) -> Duration {
        Duration::from_millis(self.depart_settle_ms)
    }

    pub fn search_settle(&self) -> Duration {
        Duration::from_millis(self.search_settle_ms)
    }

    pub fn cycle_pause(&self) -> Duration {
        Duration::from_millis(self.cycle_pause_ms)
    }
}
