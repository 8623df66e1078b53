//! Count-Up Tween - Displayed integer animated from 0 to a target
//!
//! A stepped state machine advanced by frame timestamps:
//!
//! ```text
//! Placeholder --settle(n > 0)--> Armed --revealed--> Running --progress 1--> Finished
//!      \----------settle(0)-----------------------------------------------/
//! ```
//!
//! - `Placeholder`: value unknown, views render [`PLACEHOLDER`]
//! - `Armed`: value known, shows 0, waits for the region to reveal
//! - `Running`: start time recorded on the first tick;
//!   `value = floor(clamp((now - start) / duration, 0, 1) * target)`
//! - `Finished`: shows exactly `target`, ignores everything after
//!
//! [`CountUp`] is the pure machine (tick it yourself, or iterate
//! [`CountUp::frames`] with synthetic time). [`MountedCountUp`] runs it on
//! the frame scheduler and publishes the value through a signal.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use spark_signals::{signal, Signal};

use crate::state::animate::{cancel_frame, request_frame, FrameHandle};
use crate::state::reveal::RevealState;

// =============================================================================
// CONSTANTS & CONFIG
// =============================================================================

/// Default animation length.
pub const DEFAULT_DURATION_SECS: f64 = 2.0;

/// Text shown before the target is known.
pub const PLACEHOLDER: &str = "\u{2014}";

/// Smallest synthetic step accepted by [`CountUp::frames`].
const MIN_FRAME_STEP_MS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenConfig {
    pub duration_secs: f64,
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenPhase {
    Placeholder,
    Armed,
    Running { start_ms: Option<f64> },
    Finished,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub value: u64,
    /// False once the target is reached.
    pub reschedule: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountUp {
    target: u64,
    duration_ms: f64,
    phase: TweenPhase,
    value: Option<u64>,
}

impl CountUp {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            target: 0,
            duration_ms: duration_secs * 1000.0,
            phase: TweenPhase::Placeholder,
            value: None,
        }
    }

    pub fn from_config(config: &TweenConfig) -> Self {
        Self::new(config.duration_secs)
    }

    /// Supply the target. Only the first call has any effect.
    ///
    /// A target of 0 finishes immediately.
    pub fn settle(&mut self, target: u64) {
        if self.phase != TweenPhase::Placeholder {
            return;
        }
        self.target = target;
        self.value = Some(0);
        self.phase = if target == 0 {
            TweenPhase::Finished
        } else {
            TweenPhase::Armed
        };
    }

    /// Start running once the trigger has revealed. Returns true if this
    /// call started the animation.
    pub fn on_reveal(&mut self, trigger: RevealState) -> bool {
        if self.phase == TweenPhase::Armed && trigger.is_revealed() {
            self.phase = TweenPhase::Running { start_ms: None };
            return true;
        }
        false
    }

    /// Advance to `now_ms`. `None` unless running.
    ///
    /// A non-finite `now_ms` leaves the tween untouched and asks for
    /// another frame.
    pub fn tick(&mut self, now_ms: f64) -> Option<TickOutcome> {
        let TweenPhase::Running { start_ms } = self.phase else {
            return None;
        };
        if !now_ms.is_finite() {
            return Some(TickOutcome {
                value: self.value.unwrap_or(0),
                reschedule: true,
            });
        }
        let start = start_ms.unwrap_or(now_ms);

        let progress = if self.duration_ms > 0.0 {
            ((now_ms - start) / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let value = if progress >= 1.0 {
            self.target
        } else {
            let raw = (progress * self.target as f64).floor() as u64;
            // Never step backwards, even if the clock does
            raw.min(self.target).max(self.value.unwrap_or(0))
        };

        self.value = Some(value);
        self.phase = if progress >= 1.0 {
            TweenPhase::Finished
        } else {
            TweenPhase::Running {
                start_ms: Some(start),
            }
        };

        Some(TickOutcome {
            value,
            reschedule: progress < 1.0,
        })
    }

    pub fn phase(&self) -> TweenPhase {
        self.phase
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    /// Displayed value; `None` while showing the placeholder.
    pub fn value(&self) -> Option<u64> {
        self.value
    }

    pub fn is_finished(&self) -> bool {
        self.phase == TweenPhase::Finished
    }

    pub fn display_text(&self) -> String {
        display_text(self.value)
    }

    /// Lazy sequence of displayed values, ticking every `step_ms` of
    /// synthetic time starting at 0.
    ///
    /// Empty while not settled or not revealed. A finished tween (target 0)
    /// yields its value once. A running tween ends on exactly `target`.
    pub fn frames(self, step_ms: f64) -> TweenFrames {
        let step = if step_ms.is_finite() {
            step_ms.max(MIN_FRAME_STEP_MS)
        } else {
            MIN_FRAME_STEP_MS
        };
        TweenFrames {
            tween: self,
            now: 0.0,
            step,
            done: false,
        }
    }
}

/// Text for a displayed value.
pub fn display_text(value: Option<u64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Build and drive a tween in one go.
///
/// `settled == false` yields nothing (placeholder). Otherwise see
/// [`CountUp::frames`].
pub fn drive(
    target: u64,
    duration_secs: f64,
    trigger: RevealState,
    settled: bool,
    step_ms: f64,
) -> TweenFrames {
    let mut tween = CountUp::new(duration_secs);
    if settled {
        tween.settle(target);
        tween.on_reveal(trigger);
    }
    tween.frames(step_ms)
}

/// Iterator returned by [`CountUp::frames`].
pub struct TweenFrames {
    tween: CountUp,
    now: f64,
    step: f64,
    done: bool,
}

impl Iterator for TweenFrames {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }
        match self.tween.phase() {
            TweenPhase::Finished => {
                self.done = true;
                self.tween.value()
            }
            TweenPhase::Running { .. } => {
                let outcome = self.tween.tick(self.now)?;
                self.now += self.step;
                if !outcome.reschedule {
                    self.done = true;
                }
                Some(outcome.value)
            }
            TweenPhase::Placeholder | TweenPhase::Armed => {
                self.done = true;
                None
            }
        }
    }
}

// =============================================================================
// MOUNTED (FRAME SCHEDULER)
// =============================================================================

/// A [`CountUp`] running on the frame scheduler.
///
/// Dropping (or [`dispose`](Self::dispose)) cancels the pending frame, so
/// no tick reaches a torn down tween.
pub struct MountedCountUp {
    tween: Rc<RefCell<CountUp>>,
    display: Signal<Option<u64>>,
    pending: Rc<Cell<Option<FrameHandle>>>,
}

impl CountUp {
    pub fn mount(self) -> MountedCountUp {
        let value = self.value;
        MountedCountUp {
            tween: Rc::new(RefCell::new(self)),
            display: signal(value),
            pending: Rc::new(Cell::new(None)),
        }
    }
}

impl MountedCountUp {
    /// Apply the latest inputs: `target` is `None` until settled.
    pub fn sync(&self, target: Option<u64>, trigger: RevealState) {
        let started = {
            let mut tween = self.tween.borrow_mut();
            if let Some(target) = target {
                tween.settle(target);
            }
            tween.on_reveal(trigger)
        };

        self.display.set(self.tween.borrow().value());

        if started {
            schedule_tick(self.tween.clone(), self.display.clone(), self.pending.clone());
        }
    }

    pub fn value(&self) -> Option<u64> {
        self.display.get()
    }

    pub fn display_text(&self) -> String {
        display_text(self.value())
    }

    /// Signal carrying the displayed value.
    pub fn display_signal(&self) -> Signal<Option<u64>> {
        self.display.clone()
    }

    pub fn phase(&self) -> TweenPhase {
        self.tween.borrow().phase()
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.get().is_some()
    }

    /// Tear down, cancelling any pending frame.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for MountedCountUp {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            cancel_frame(handle);
        }
    }
}

fn schedule_tick(
    tween: Rc<RefCell<CountUp>>,
    display: Signal<Option<u64>>,
    pending: Rc<Cell<Option<FrameHandle>>>,
) {
    let slot = pending.clone();
    let handle = request_frame(move |now_ms| {
        pending.set(None);
        let outcome = tween.borrow_mut().tick(now_ms);
        if let Some(outcome) = outcome {
            display.set(Some(outcome.value));
            if outcome.reschedule {
                schedule_tick(tween, display, pending);
            }
        }
    });
    slot.set(Some(handle));
}

// =============================================================================
// TESTS
// =============================================================================
