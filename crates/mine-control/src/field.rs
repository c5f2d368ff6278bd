use anyhow::Result;
use mine_vision::{ButtonColor, Marker, Survey};
use std::fmt;

/// Result of one action on the board. Failures are expected and handled by
/// the loop; only capability errors travel as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The control did not show up before the timeout.
    ButtonMissing(ButtonColor),
    /// The play area was gone when the result had to be checked.
    Unverifiable,
    /// No green marker appeared near the attacked mine.
    NotCaptured,
    /// SEARCH was pressed but revealed no red markers.
    NoNewMarkers,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ButtonMissing(color) => write!(f, "{} button not found", color.name()),
            FailureReason::Unverifiable => write!(f, "could not verify result"),
            FailureReason::NotCaptured => write!(f, "mine did not turn green"),
            FailureReason::NoNewMarkers => write!(f, "no new mines found"),
        }
    }
}

/// The board as the control loop sees it: fresh observations plus the three
/// click sequences. Implementations talk to the live screen
/// ([`crate::ScreenField`]) or to a script in tests.
pub trait Field {
    /// Detect the play area and markers on a fresh frame. `None` means the
    /// play area could not be located.
    fn survey(&mut self) -> Result<Option<Survey>>;

    /// Open the mine's dialog, press ATTACK then DEPART, and check that the
    /// mine turned green.
    fn attack(&mut self, target: &Marker) -> Result<Outcome>;

    /// Open a held mine's dialog and press RETURN.
    fn return_troops(&mut self, held: &Marker) -> Result<Outcome>;

    /// Press SEARCH and check that red markers appeared.
    fn search_for_more(&mut self) -> Result<Outcome>;

    /// Short breather between loop steps.
    fn pause(&mut self);
}
