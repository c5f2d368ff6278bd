use anyhow::Result;
use mine_state::{FailureSet, RunStats, SearchBudget};
use mine_vision::Marker;
use std::fmt;
use tracing::{info, warn};

use crate::field::{Field, Outcome};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No attackable markers left and no searches left in the budget.
    BudgetExhausted,
    /// A search came back without red markers.
    NoNewMarkers,
    /// The play area disappeared from the screen.
    PlayAreaLost,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::BudgetExhausted => write!(f, "search budget exhausted"),
            Termination::NoNewMarkers => write!(f, "no new mines found"),
            Termination::PlayAreaLost => write!(f, "play area lost"),
        }
    }
}

#[derive(Debug)]
enum Phase {
    Scanning,
    Attacking(Marker),
    /// Held mines to release before pressing SEARCH.
    Searching(Vec<Marker>),
    Terminal(Termination),
}

/// Attack / search / return state machine.
///
/// Owns the per-batch failure knowledge; counters live in the caller's
/// [`RunStats`] so they survive an aborted run.
pub struct ControlLoop {
    budget: SearchBudget,
    failed: FailureSet,
}

impl ControlLoop {
    pub fn new(budget: SearchBudget) -> Self {
        Self {
            budget,
            failed: FailureSet::new(),
        }
    }

    pub fn failed(&self) -> &FailureSet {
        &self.failed
    }

    /// Run until a terminal condition. `Err` only for capability failures
    /// (capture, pointer, fail-safe abort); everything else ends in a
    /// [`Termination`].
    pub fn run<F: Field>(&mut self, field: &mut F, stats: &mut RunStats) -> Result<Termination> {
        let mut phase = Phase::Scanning;
        loop {
            phase = match phase {
                Phase::Scanning => self.scan(field, stats)?,
                Phase::Attacking(target) => self.attack(field, stats, target)?,
                Phase::Searching(held) => self.search(field, stats, held)?,
                Phase::Terminal(reason) => {
                    info!("Stopping: {}", reason);
                    return Ok(reason);
                }
            };
        }
    }

    fn scan<F: Field>(&mut self, field: &mut F, stats: &RunStats) -> Result<Phase> {
        let Some(survey) = field.survey()? else {
            warn!("✗ ERROR: Could not detect mines!");
            return Ok(Phase::Terminal(Termination::PlayAreaLost));
        };

        info!(
            "[{} RED, {} GREEN, Search {}/{}]",
            survey.red.len(),
            survey.green.len(),
            stats.searches_performed,
            self.budget
        );

        let target = survey
            .red
            .iter()
            .find(|m| !self.failed.contains(&m.label))
            .cloned();
        if let Some(target) = target {
            return Ok(Phase::Attacking(target));
        }

        if survey.red.is_empty() {
            info!("✓ All current red mines cleared!");
        } else {
            info!("✗ All remaining {} red mines have failed.", survey.red.len());
        }

        if self.budget.allows_another(stats.searches_performed) {
            Ok(Phase::Searching(survey.green))
        } else {
            info!("✗ Reached maximum searches ({}).", self.budget);
            Ok(Phase::Terminal(Termination::BudgetExhausted))
        }
    }

    fn attack<F: Field>(&mut self, field: &mut F, stats: &mut RunStats, target: Marker) -> Result<Phase> {
        let outcome = field.attack(&target)?;
        stats.record_attack(outcome.is_success());

        if outcome.is_success() {
            field.pause();
            let Some(after) = field.survey()? else {
                warn!("✗ ERROR: Could not detect mines!");
                return Ok(Phase::Terminal(Termination::PlayAreaLost));
            };
            // Free the troops for the next target while there is one.
            if !after.red.is_empty() {
                return_all(field, stats, &after.green)?;
            }
        } else {
            self.failed.insert(&target.label);
        }

        field.pause();
        Ok(Phase::Scanning)
    }

    fn search<F: Field>(&mut self, field: &mut F, stats: &mut RunStats, held: Vec<Marker>) -> Result<Phase> {
        info!("→ Searching for new mines...");
        return_all(field, stats, &held)?;

        let outcome = field.search_for_more()?;
        stats.record_search();

        match outcome {
            Outcome::Success => {
                self.failed.clear();
                info!("✓ New mines found!");
                Ok(Phase::Scanning)
            }
            Outcome::Failure(reason) => {
                info!("✗ {}. Stopping.", reason);
                Ok(Phase::Terminal(Termination::NoNewMarkers))
            }
        }
    }
}

fn return_all<F: Field>(field: &mut F, stats: &mut RunStats, held: &[Marker]) -> Result<()> {
    for marker in held {
        if field.return_troops(marker)?.is_success() {
            stats.record_return();
        }
        field.pause();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FailureReason;
    use mine_capture::{BoundingBox, FailSafe, Point};
    use mine_vision::{derive_work_area, ButtonColor, MarkerColor, Survey};
    use std::collections::VecDeque;

    fn markers(color: MarkerColor, at: &[(i32, i32)]) -> Vec<Marker> {
        at.iter()
            .enumerate()
            .map(|(i, &(x, y))| Marker {
                label: format!("{}{}", color.label_prefix(), i + 1),
                position: Point::new(x, y),
                color,
            })
            .collect()
    }

    fn board(red: &[(i32, i32)], green: &[(i32, i32)]) -> Option<Survey> {
        let play_area = BoundingBox::new(0, 0, 1000, 1000);
        Some(Survey {
            play_area,
            work_area: derive_work_area(&play_area),
            red: markers(MarkerColor::Red, red),
            green: markers(MarkerColor::Green, green),
        })
    }

    const FAIL: Outcome = Outcome::Failure(FailureReason::NotCaptured);
    const NOTHING_NEW: Outcome = Outcome::Failure(FailureReason::NoNewMarkers);

    /// Replays canned observations and outcomes, logging every action.
    #[derive(Default)]
    struct ScriptedField {
        surveys: VecDeque<Option<Survey>>,
        attacks: VecDeque<Outcome>,
        returns: VecDeque<Outcome>,
        searches: VecDeque<Outcome>,
        calls: Vec<String>,
        fail_attacks_with_error: bool,
    }

    impl ScriptedField {
        fn new(surveys: Vec<Option<Survey>>) -> Self {
            Self {
                surveys: surveys.into(),
                ..Default::default()
            }
        }

        fn attacks(mut self, outcomes: Vec<Outcome>) -> Self {
            self.attacks = outcomes.into();
            self
        }

        fn searches(mut self, outcomes: Vec<Outcome>) -> Self {
            self.searches = outcomes.into();
            self
        }

        fn returns(mut self, outcomes: Vec<Outcome>) -> Self {
            self.returns = outcomes.into();
            self
        }

        fn attacked(&self) -> Vec<&str> {
            self.calls
                .iter()
                .filter_map(|c| c.strip_prefix("attack "))
                .collect()
        }
    }

    impl Field for ScriptedField {
        fn survey(&mut self) -> Result<Option<Survey>> {
            Ok(self.surveys.pop_front().expect("survey script exhausted"))
        }

        fn attack(&mut self, target: &Marker) -> Result<Outcome> {
            if self.fail_attacks_with_error {
                return Err(FailSafe { at: Point::new(0, 0) }.into());
            }
            self.calls.push(format!("attack {}", target.label));
            Ok(self.attacks.pop_front().expect("attack script exhausted"))
        }

        fn return_troops(&mut self, held: &Marker) -> Result<Outcome> {
            self.calls.push(format!("return {}", held.label));
            Ok(self.returns.pop_front().unwrap_or(Outcome::Success))
        }

        fn search_for_more(&mut self) -> Result<Outcome> {
            self.calls.push("search".to_string());
            Ok(self.searches.pop_front().expect("search script exhausted"))
        }

        fn pause(&mut self) {}
    }

    #[test]
    fn test_failed_then_captured_with_nothing_left() {
        let mut field = ScriptedField::new(vec![
            board(&[(300, 300), (600, 300)], &[]),
            board(&[(300, 300), (600, 300)], &[]),
            board(&[], &[]),
            board(&[], &[]),
        ])
        .attacks(vec![FAIL, Outcome::Success])
        .searches(vec![NOTHING_NEW]);
        let mut stats = RunStats::start();

        let end = ControlLoop::new(SearchBudget::Limited(1))
            .run(&mut field, &mut stats)
            .unwrap();

        assert_eq!(end, Termination::NoNewMarkers);
        assert_eq!(field.attacked(), vec!["red_mine1", "red_mine2"]);
        assert_eq!(stats.total_attacks, 2);
        assert_eq!(stats.successful_attacks, 1);
        assert_eq!(stats.failed_attacks, 1);
        assert_eq!(stats.troops_returned, 0);
        assert!(!field.calls.iter().any(|c| c.starts_with("return")));
    }

    #[test]
    fn test_failed_marker_attacked_once_per_batch() {
        let layout = board(&[(300, 300), (600, 300)], &[]);
        let mut field = ScriptedField::new(vec![layout.clone(), layout.clone(), layout])
            .attacks(vec![FAIL, FAIL])
            .searches(vec![NOTHING_NEW]);
        let mut stats = RunStats::start();
        let mut control = ControlLoop::new(SearchBudget::Limited(1));

        let end = control.run(&mut field, &mut stats).unwrap();

        assert_eq!(end, Termination::NoNewMarkers);
        assert_eq!(field.attacked(), vec!["red_mine1", "red_mine2"]);
        assert_eq!(stats.searches_performed, 1);
        assert_eq!(control.failed().len(), 2);
    }

    #[test]
    fn test_successful_search_makes_labels_attackable_again() {
        let mut field = ScriptedField::new(vec![
            board(&[(300, 300)], &[]),
            board(&[(300, 300)], &[]),
            board(&[(300, 300)], &[]),
            board(&[], &[(300, 300)]),
            board(&[], &[(300, 300)]),
        ])
        .attacks(vec![FAIL, Outcome::Success])
        .searches(vec![Outcome::Success, NOTHING_NEW]);
        let mut stats = RunStats::start();

        let end = ControlLoop::new(SearchBudget::Unlimited)
            .run(&mut field, &mut stats)
            .unwrap();

        assert_eq!(end, Termination::NoNewMarkers);
        assert_eq!(field.attacked(), vec!["red_mine1", "red_mine1"]);
        assert_eq!(stats.searches_performed, 2);
        // The held mine is released before the second search.
        assert_eq!(
            field.calls,
            vec![
                "attack red_mine1",
                "search",
                "attack red_mine1",
                "return green_mine1",
                "search",
            ]
        );
        assert_eq!(stats.troops_returned, 1);
    }

    #[test]
    fn test_single_search_budget_stops_after_one_failed_search() {
        let mut field = ScriptedField::new(vec![
            board(&[(300, 300)], &[]),
            board(&[(300, 300)], &[]),
        ])
        .attacks(vec![FAIL])
        .searches(vec![NOTHING_NEW]);
        let mut stats = RunStats::start();

        let end = ControlLoop::new(SearchBudget::Limited(1))
            .run(&mut field, &mut stats)
            .unwrap();

        assert_eq!(end, Termination::NoNewMarkers);
        assert_eq!(stats.searches_performed, 1);
        assert_eq!(field.calls.iter().filter(|c| *c == "search").count(), 1);
    }

    #[test]
    fn test_budget_exhausted_after_last_batch() {
        let mut field = ScriptedField::new(vec![
            board(&[], &[]),
            board(&[(300, 300)], &[]),
            board(&[], &[]),
            board(&[], &[]),
        ])
        .attacks(vec![Outcome::Success])
        .searches(vec![Outcome::Success]);
        let mut stats = RunStats::start();

        let end = ControlLoop::new(SearchBudget::Limited(1))
            .run(&mut field, &mut stats)
            .unwrap();

        assert_eq!(end, Termination::BudgetExhausted);
        assert_eq!(stats.searches_performed, 1);
        assert_eq!(stats.successful_attacks, 1);
    }

    #[test]
    fn test_troops_returned_while_red_remain() {
        let mut field = ScriptedField::new(vec![
            board(&[(300, 300), (600, 300)], &[]),
            board(&[(600, 300)], &[(300, 300), (450, 500)]),
            None,
        ])
        .attacks(vec![Outcome::Success])
        .returns(vec![
            Outcome::Success,
            Outcome::Failure(FailureReason::ButtonMissing(ButtonColor::Yellow)),
        ]);
        let mut stats = RunStats::start();

        let end = ControlLoop::new(SearchBudget::Unlimited)
            .run(&mut field, &mut stats)
            .unwrap();

        assert_eq!(end, Termination::PlayAreaLost);
        assert_eq!(
            field.calls,
            vec!["attack red_mine1", "return green_mine1", "return green_mine2"]
        );
        assert_eq!(stats.troops_returned, 1);
    }

    #[test]
    fn test_play_area_lost_at_start() {
        let mut field = ScriptedField::new(vec![None]);
        let mut stats = RunStats::start();

        let end = ControlLoop::new(SearchBudget::Unlimited)
            .run(&mut field, &mut stats)
            .unwrap();

        assert_eq!(end, Termination::PlayAreaLost);
        assert_eq!(stats.total_attacks, 0);
        assert!(field.calls.is_empty());
    }

    #[test]
    fn test_capability_error_aborts_run() {
        let mut field = ScriptedField::new(vec![board(&[(300, 300)], &[])]);
        field.fail_attacks_with_error = true;
        let mut stats = RunStats::start();

        let result = ControlLoop::new(SearchBudget::Unlimited).run(&mut field, &mut stats);

        let err = result.unwrap_err();
        assert!(err.downcast_ref::<FailSafe>().is_some());
        assert_eq!(stats.total_attacks, 0);
    }
}
