mod cli;
mod report;

pub use cli::Args;
pub use report::{CsvRunLog, RunSink};

use anyhow::Result;
use clap::Parser;
use mine_capture::{DesktopPointer, FailSafe, MonitorCapture, SystemClock};
use mine_config::Tuning;
use mine_control::{ControlLoop, ScreenField, Termination};
use mine_state::{RunStats, RunSummary, SearchBudget};
use std::time::Duration;

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mine_raider=info,mine_control=info,mine_vision=info,mine_capture=info".into()
            }),
        )
        .init();

    let args = Args::parse();
    let tuning = match &args.config {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let budget = SearchBudget::from_count(args.searches);

    let mut stats = RunStats::start();
    print_banner(&args, budget);
    countdown(args.delay);

    let mut field = ScreenField::new(
        MonitorCapture::primary()?,
        DesktopPointer::new()?,
        SystemClock,
        tuning,
    );
    let outcome = ControlLoop::new(budget).run(&mut field, &mut stats);
    stats.finish();

    let summary = RunSummary {
        username: args.username,
        power: args.power,
        stats,
    };
    println!("\n{}", summary);

    let mut log = CsvRunLog::new(args.log);
    conclude(outcome, &summary, &mut log)
}

/// Record the finished run. Every ending is recorded except an operator
/// abort, which stops the process without touching the log.
fn conclude(
    outcome: Result<Termination>,
    summary: &RunSummary,
    sink: &mut impl RunSink,
) -> Result<()> {
    match outcome {
        Ok(termination) => {
            tracing::info!("Run finished: {}", termination);
            sink.record_run(summary)
        }
        Err(e) if e.downcast_ref::<FailSafe>().is_some() => {
            tracing::error!("Run aborted: {:#}", e);
            Err(e.context("Run aborted by operator, statistics not saved"))
        }
        Err(e) => {
            tracing::error!("Run stopped: {:#}", e);
            sink.record_run(summary)?;
            Err(e.context("Run stopped early"))
        }
    }
}

fn print_banner(args: &Args, budget: SearchBudget) {
    let rule = "=".repeat(70);
    println!("{}", rule);
    println!("MINE ATTACK AUTOMATION");
    println!("{}", rule);
    println!("Player:    {}", args.username);
    println!("Power:     {}", args.power);
    println!("Searches:  {}", budget);
    println!("{}", rule);
    println!("Move the mouse to a screen corner to abort.");
}

fn countdown(seconds: u64) {
    for remaining in (1..=seconds).rev() {
        println!("Starting in {}...", remaining);
        std::thread::sleep(Duration::from_secs(1));
    }
}
