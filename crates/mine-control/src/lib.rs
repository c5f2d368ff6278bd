pub mod control;
pub mod field;
pub mod screen;

#[cfg(test)]
mod sim;

pub use control::{ControlLoop, Termination};
pub use field::{FailureReason, Field, Outcome};
pub use screen::ScreenField;
