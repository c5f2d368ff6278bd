use anyhow::{Context, Result};
use mine_state::RunSummary;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Durable destination for finished runs.
pub trait RunSink {
    fn record_run(&mut self, summary: &RunSummary) -> Result<()>;
}

/// One row per run, appended to a CSV file. The header is written when the
/// file is created.
pub struct CsvRunLog {
    path: PathBuf,
}

#[derive(Debug, Serialize)]
struct RunRow<'a> {
    username: &'a str,
    power: &'a str,
    date_time: String,
    start_time: String,
    end_time: String,
    total_attacks: u32,
    successful_attacks: u32,
    failed_attacks: u32,
    success_rate: String,
    searches_performed: u32,
    troops_returned: u32,
}

impl<'a> From<&'a RunSummary> for RunRow<'a> {
    fn from(summary: &'a RunSummary) -> Self {
        let s = &summary.stats;
        Self {
            username: &summary.username,
            power: &summary.power,
            date_time: summary.end_time(),
            start_time: summary.start_time(),
            end_time: summary.end_time(),
            total_attacks: s.total_attacks,
            successful_attacks: s.successful_attacks,
            failed_attacks: s.failed_attacks,
            success_rate: format!("{:.1}%", s.success_rate()),
            searches_performed: s.searches_performed,
            troops_returned: s.troops_returned,
        }
    }
}

impl CsvRunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunSink for CsvRunLog {
    fn record_run(&mut self, summary: &RunSummary) -> Result<()> {
        let is_new = !self.path.is_file();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer
            .serialize(RunRow::from(summary))
            .context("Failed to write run statistics")?;
        writer.flush().context("Failed to flush run statistics")?;

        tracing::info!("✓ Statistics saved to {}", self.path.display());
        Ok(())
    }
}
