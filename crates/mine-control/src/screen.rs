use anyhow::Result;
use mine_capture::{BoundingBox, Clock, FrameSource, Point, Pointer};
use mine_config::Tuning;
use mine_vision::{
    dialog_window, find_button, locate_play_area, search_bar_window, survey, ButtonColor, Marker,
    Survey,
};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::field::{FailureReason, Field, Outcome};

/// [`Field`] backed by live capabilities: every observation is a fresh
/// capture and every action is a real click.
pub struct ScreenField<S, P, C> {
    source: S,
    pointer: P,
    clock: C,
    tuning: Tuning,
}

impl<S: FrameSource, P: Pointer, C: Clock> ScreenField<S, P, C> {
    pub fn new(source: S, pointer: P, clock: C, tuning: Tuning) -> Self {
        Self {
            source,
            pointer,
            clock,
            tuning,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Single look for a button on a fresh frame.
    pub fn find_button(
        &mut self,
        color: ButtonColor,
        window: Option<&BoundingBox>,
    ) -> Result<Option<Point>> {
        let frame = self.source.capture_frame()?;
        Ok(find_button(&frame, color, window))
    }

    /// Poll for a button every `poll_interval` until it appears or `timeout`
    /// has elapsed.
    ///
    /// A button that never appears is reported no earlier than `timeout` and
    /// no later than `timeout` plus one poll interval.
    pub fn wait_for_button(
        &mut self,
        color: ButtonColor,
        timeout: Duration,
        window: Option<&BoundingBox>,
    ) -> Result<Option<Point>> {
        let start = self.clock.now();
        let mut polls = 0u32;

        while self.clock.now().duration_since(start) < timeout {
            polls += 1;
            if let Some(at) = self.find_button(color, window)? {
                debug!("{} button found after {} poll(s)", color.name(), polls);
                return Ok(Some(at));
            }
            self.clock.sleep(self.tuning.poll_interval());
        }

        debug!(
            "{} button not found after {} poll(s) over {:?}",
            color.name(),
            polls,
            timeout
        );
        Ok(None)
    }

    fn click(&mut self, at: Point) -> Result<()> {
        self.pointer.click(at)?;
        self.clock.sleep(self.tuning.click_settle());
        Ok(())
    }

    fn play_area(&mut self) -> Result<Option<BoundingBox>> {
        let frame = self.source.capture_frame()?;
        Ok(locate_play_area(&frame))
    }

    /// Click the structure under a marker and give its dialog time to open.
    fn open_marker(&mut self, marker: &Marker) -> Result<()> {
        let at = marker.position.offset(0, self.tuning.click_offset_y);
        self.click(at)?;
        self.clock.sleep(self.tuning.dialog_settle());
        Ok(())
    }

    /// Where dialog buttons render. Falls back to the whole frame when the
    /// play area is not visible.
    fn dialog_window(&mut self) -> Result<Option<BoundingBox>> {
        Ok(self.play_area()?.map(|p| dialog_window(&p)))
    }

    /// Wait for a dialog button and press it. `false` if it never showed.
    fn press(&mut self, color: ButtonColor, window: Option<&BoundingBox>) -> Result<bool> {
        match self.wait_for_button(color, self.tuning.button_timeout(), window)? {
            Some(at) => {
                self.click(at)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<S: FrameSource, P: Pointer, C: Clock> Field for ScreenField<S, P, C> {
    fn survey(&mut self) -> Result<Option<Survey>> {
        let frame = self.source.capture_frame()?;
        Ok(survey(&frame))
    }

    fn attack(&mut self, target: &Marker) -> Result<Outcome> {
        self.open_marker(target)?;
        let window = self.dialog_window()?;

        if !self.press(ButtonColor::Red, window.as_ref())? {
            return Ok(failed(target, FailureReason::ButtonMissing(ButtonColor::Red)));
        }
        self.clock.sleep(self.tuning.dialog_settle());

        if !self.press(ButtonColor::Green, window.as_ref())? {
            return Ok(failed(target, FailureReason::ButtonMissing(ButtonColor::Green)));
        }
        self.clock.sleep(self.tuning.depart_settle());

        let Some(after) = self.survey()? else {
            return Ok(failed(target, FailureReason::Unverifiable));
        };

        let radius = self.tuning.verify_radius;
        let captured = after
            .green
            .iter()
            .any(|g| g.position.distance(target.position) < radius);

        if captured {
            info!("✓ {}: SUCCESS", target.label);
            Ok(Outcome::Success)
        } else {
            Ok(failed(target, FailureReason::NotCaptured))
        }
    }

    fn return_troops(&mut self, held: &Marker) -> Result<Outcome> {
        self.open_marker(held)?;
        let window = self.dialog_window()?;

        if !self.press(ButtonColor::Yellow, window.as_ref())? {
            warn!("{}: {}", held.label, FailureReason::ButtonMissing(ButtonColor::Yellow));
            return Ok(Outcome::Failure(FailureReason::ButtonMissing(ButtonColor::Yellow)));
        }
        self.clock.sleep(self.tuning.dialog_settle());

        info!("↩ {}: troops returned", held.label);
        Ok(Outcome::Success)
    }

    fn search_for_more(&mut self) -> Result<Outcome> {
        let window = self.play_area()?.map(|p| search_bar_window(&p));

        if !self.press(ButtonColor::Blue, window.as_ref())? {
            let reason = FailureReason::ButtonMissing(ButtonColor::Blue);
            warn!("✗ ERROR: {}", reason);
            return Ok(Outcome::Failure(reason));
        }
        self.clock.sleep(self.tuning.search_settle());

        match self.survey()? {
            Some(s) if !s.red.is_empty() => Ok(Outcome::Success),
            _ => Ok(Outcome::Failure(FailureReason::NoNewMarkers)),
        }
    }

    fn pause(&mut self) {
        self.clock.sleep(self.tuning.cycle_pause());
    }
}

fn failed(target: &Marker, reason: FailureReason) -> Outcome {
    info!("✗ {}: FAILED ({})", target.label, reason);
    Outcome::Failure(reason)
}
