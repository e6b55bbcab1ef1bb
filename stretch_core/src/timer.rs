//! Countdown engine for a single exercise.
//!
//! The engine is a plain state machine: it owns the running flag, the
//! remaining seconds and the instruction step index, and exposes `tick()`
//! as a pure state transition. It never schedules anything itself - the
//! caller owns the one-second heartbeat and invokes `tick()` only while
//! `is_running()` is true, from a single thread.
//!
//! ## State transitions
//!
//! ```text
//! idle -> armed-running -> armed-paused -> armed-running -> idle
//!                 \------------------ stop / remaining==0 ----^
//! ```
//!
//! There is no distinct "finished" state: reaching zero simply halts the
//! countdown, and the caller observes `is_finished()` to advance the
//! session.
//!
//! The instruction step index is time-driven: each second of elapsed time
//! maps onto an instruction via an approximately even per-step allocation,
//! with the last step absorbing any remainder of uneven division.

use crate::types::Exercise;
use crate::{Error, Result};

/// Countdown state for the exercise currently being timed
#[derive(Clone, Debug, Default)]
pub struct TimerEngine {
    running: bool,
    remaining_seconds: u32,
    exercise: Option<Exercise>,
    step: usize,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn exercise(&self) -> Option<&Exercise> {
        self.exercise.as_ref()
    }

    /// Index of the current instruction step, 0-based
    pub fn current_step(&self) -> usize {
        self.step
    }

    /// Text of the current instruction step, if an exercise is bound
    pub fn current_instruction(&self) -> Option<&str> {
        self.exercise
            .as_ref()
            .and_then(|e| e.instructions.get(self.step))
            .map(String::as_str)
    }

    /// Completion percentage in [0, 100]; 0 when no exercise is bound
    pub fn progress_percent(&self) -> f64 {
        match &self.exercise {
            Some(ex) if ex.duration_seconds > 0 => {
                let elapsed = ex.duration_seconds - self.remaining_seconds;
                (f64::from(elapsed) / f64::from(ex.duration_seconds) * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }

    /// True once an armed exercise has counted down to zero
    pub fn is_finished(&self) -> bool {
        self.exercise.is_some() && self.remaining_seconds == 0 && !self.running
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Bind an exercise and start its countdown from the full duration
    ///
    /// Re-arming while another exercise is bound replaces it; the step
    /// index always resets to 0. Rejects a zero-duration exercise, which
    /// indicates a content bug rather than a runtime condition.
    pub fn arm(&mut self, exercise: &Exercise) -> Result<()> {
        if exercise.duration_seconds == 0 {
            return Err(Error::Timer(format!(
                "exercise '{}' has zero duration",
                exercise.id
            )));
        }

        self.running = true;
        self.remaining_seconds = exercise.duration_seconds;
        self.step = 0;
        self.exercise = Some(exercise.clone());

        tracing::debug!(
            "Armed timer for '{}' ({}s, {} steps)",
            exercise.id,
            exercise.duration_seconds,
            exercise.instructions.len()
        );
        Ok(())
    }

    /// Halt the countdown without losing position; redundant calls are no-ops
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume a paused countdown; a no-op when nothing is left to count
    pub fn resume(&mut self) {
        if self.exercise.is_some() && self.remaining_seconds > 0 {
            self.running = true;
        }
    }

    /// Tear the timer down: used for deliberate cancellation and for skip
    pub fn stop(&mut self) {
        self.running = false;
        self.remaining_seconds = 0;
        self.exercise = None;
        self.step = 0;
    }

    /// Advance the countdown by one second
    ///
    /// Called at most once per second by the caller's heartbeat while
    /// running. Decrements remaining time, re-derives the instruction step
    /// from elapsed time, and forces the running flag off at zero.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
            self.step = self.step_for_elapsed();
        }

        if self.remaining_seconds == 0 {
            self.running = false;
        }
    }

    /// Map elapsed seconds onto an instruction index
    ///
    /// Each instruction gets `floor(duration / steps)` seconds; the final
    /// instruction absorbs the remainder and the index clamps there.
    fn step_for_elapsed(&self) -> usize {
        let Some(ex) = &self.exercise else {
            return 0;
        };
        let steps = ex.instructions.len();
        if steps == 0 {
            return 0;
        }

        let step_duration = ex.duration_seconds / steps as u32;
        if step_duration == 0 {
            // More instructions than seconds; clamp to the last one reached
            return steps - 1;
        }

        let elapsed = ex.duration_seconds - self.remaining_seconds;
        ((elapsed / step_duration) as usize).min(steps - 1)
    }
}
