use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Counters for one run. Only ever incremented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,
    pub total_attacks: u32,
    pub successful_attacks: u32,
    pub failed_attacks: u32,
    pub searches_performed: u32,
    pub troops_returned: u32,
}

impl RunStats {
    pub fn start() -> Self {
        Self::started(Local::now())
    }

    pub fn started(at: DateTime<Local>) -> Self {
        Self {
            started_at: at,
            ended_at: None,
            total_attacks: 0,
            successful_attacks: 0,
            failed_attacks: 0,
            searches_performed: 0,
            troops_returned: 0,
        }
    }

    pub fn record_attack(&mut self, success: bool) {
        self.total_attacks += 1;
        if success {
            self.successful_attacks += 1;
        } else {
            self.failed_attacks += 1;
        }
    }

    pub fn record_search(&mut self) {
        self.searches_performed += 1;
    }

    pub fn record_return(&mut self) {
        self.troops_returned += 1;
    }

    pub fn finish(&mut self) {
        self.finish_at(Local::now());
    }

    pub fn finish_at(&mut self, at: DateTime<Local>) {
        self.ended_at = Some(at);
    }

    /// Percentage of attacks that succeeded; 0.0 before the first attack.
    pub fn success_rate(&self) -> f64 {
        if self.total_attacks > 0 {
            self.successful_attacks as f64 / self.total_attacks as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Percentage of attacks that failed; 0.0 before the first attack.
    pub fn failure_rate(&self) -> f64 {
        if self.total_attacks > 0 {
            self.failed_attacks as f64 / self.total_attacks as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Marker labels that failed in the current batch.
///
/// Labels are positional, so the set is only meaningful until the next search
/// reveals a new layout.
#[derive(Debug, Clone, Default)]
pub struct FailureSet {
    labels: HashSet<String>,
}

impl FailureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the label was already recorded.
    pub fn insert(&mut self, label: &str) -> bool {
        self.labels.insert(label.to_string())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// How many searches a run may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchBudget {
    Unlimited,
    Limited(u32),
}

impl SearchBudget {
    /// Command-line encoding: zero or a negative count means no limit.
    pub fn from_count(count: i64) -> Self {
        if count <= 0 {
            SearchBudget::Unlimited
        } else {
            SearchBudget::Limited(u32::try_from(count).unwrap_or(u32::MAX))
        }
    }

    pub fn allows_another(&self, performed: u32) -> bool {
        match self {
            SearchBudget::Unlimited => true,
            SearchBudget::Limited(max) => performed < *max,
        }
    }
}

impl fmt::Display for SearchBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBudget::Unlimited => write!(f, "Unlimited"),
            SearchBudget::Limited(n) => write!(f, "{}", n),
        }
    }
}

/// Final report for one run: who ran it and what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub username: String,
    pub power: String,
    pub stats: RunStats,
}

impl RunSummary {
    pub fn start_time(&self) -> String {
        self.stats.started_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// End time, or an empty string if the run was never finished.
    pub fn end_time(&self) -> String {
        self.stats
            .ended_at
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        let rule = "=".repeat(70);
        writeln!(f, "{}", rule)?;
        writeln!(f, "STATISTICS")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Username:            {}", self.username)?;
        writeln!(f, "Power & Troop type:  {}", self.power)?;
        writeln!(f, "Start Time:          {}", self.start_time())?;
        writeln!(f, "End Time:            {}", self.end_time())?;
        writeln!(f, "Total Attacks:       {}", s.total_attacks)?;
        writeln!(f, "Successful Attacks:  {} ({:.1}%)", s.successful_attacks, s.success_rate())?;
        writeln!(f, "Failed Attacks:      {} ({:.1}%)", s.failed_attacks, s.failure_rate())?;
        writeln!(f, "Searches Performed:  {}", s.searches_performed)?;
        writeln!(f, "Troops Returned:     {}", s.troops_returned)?;
        write!(f, "{}", rule)
    }
}
