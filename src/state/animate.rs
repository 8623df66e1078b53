//! Frame Scheduler - "Run on next display refresh"
//!
//! Timed animations never sleep or block. They ask for a callback on the
//! next frame and the host advances frames by calling [`run_frame`] once
//! per display refresh (tests call it with synthetic timestamps).
//!
//! # Pattern
//!
//! - [`request_frame`] registers a one-shot callback, [`cancel_frame`] drops it
//! - Callbacks requested while a frame runs are queued for the *next* frame
//! - [`subscribe_to_frames`] registers a persistent per-frame handler and
//!   returns its unsubscribe function
//! - Nothing registered is reachable after cancel/unsubscribe, so a torn
//!   down animation cannot be ticked
//!
//! # Example
//!
//! ```ignore
//! use spark_motion::state::animate::{request_frame, run_frame};
//!
//! let handle = request_frame(|now_ms| println!("tick at {now_ms}"));
//! run_frame(16.0); // prints "tick at 16"
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Upper bound on the delta handed to frame subscribers.
///
/// A backgrounded page can go seconds between frames; springs should resume
/// from where they were instead of jumping.
pub const MAX_FRAME_DELTA_MS: f64 = 100.0;

// =============================================================================
// CLOCKS
// =============================================================================

/// Source of frame timestamps in milliseconds.
pub trait FrameClock {
    fn now_ms(&self) -> f64;
}

/// Clock advanced by hand. Used to drive animations with synthetic time.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }
}

impl FrameClock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Monotonic wall clock, milliseconds since construction.
#[derive(Debug)]
pub struct InstantClock {
    origin: Instant,
}

impl InstantClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for InstantClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

// =============================================================================
// FRAME REGISTRY
// =============================================================================

/// Handle for a pending one-shot frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

type FrameCallback = Box<dyn FnOnce(f64)>;
type FrameSubscriber = Rc<dyn Fn(f64, f64)>;

struct FrameRegistry {
    /// One-shot callbacks for the next frame
    pending: Vec<(FrameHandle, FrameCallback)>,
    /// Persistent handlers: (id, last seen frame time, handler)
    subscribers: Vec<(u64, Option<f64>, FrameSubscriber)>,
    next_id: u64,
    frames_run: u64,
}

impl FrameRegistry {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            subscribers: Vec::new(),
            next_id: 0,
            frames_run: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

thread_local! {
    static FRAMES: RefCell<FrameRegistry> = RefCell::new(FrameRegistry::new());
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Run `callback` on the next frame with that frame's timestamp.
///
/// Requests made while a frame is running land on the following frame.
///
/// # Returns
///
/// A handle for [`cancel_frame`].
pub fn request_frame<F>(callback: F) -> FrameHandle
where
    F: FnOnce(f64) + 'static,
{
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        let handle = FrameHandle(frames.next_id());
        frames.pending.push((handle, Box::new(callback)));
        handle
    })
}

/// Drop a pending frame callback. Unknown or already-run handles are ignored.
pub fn cancel_frame(handle: FrameHandle) {
    FRAMES.with(|frames| {
        frames
            .borrow_mut()
            .pending
            .retain(|(pending, _)| *pending != handle);
    });
}

/// Call `handler(now_ms, dt_ms)` on every frame until unsubscribed.
///
/// `dt_ms` is 0 on the first frame the handler sees and is capped at
/// [`MAX_FRAME_DELTA_MS`].
///
/// # Arguments
///
/// * `handler` - Called with the frame timestamp and the time since the
///   handler's previous frame, both in milliseconds
///
/// # Returns
///
/// A cleanup function that unsubscribes. Safe to call mid-frame.
pub fn subscribe_to_frames<F>(handler: F) -> Box<dyn FnOnce()>
where
    F: Fn(f64, f64) + 'static,
{
    let id = FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        let id = frames.next_id();
        frames.subscribers.push((id, None, Rc::new(handler)));
        id
    });

    Box::new(move || {
        FRAMES.with(|frames| {
            frames
                .borrow_mut()
                .subscribers
                .retain(|(subscriber_id, _, _)| *subscriber_id != id);
        });
    })
}

/// Advance one frame at `now_ms`.
///
/// Runs every one-shot callback queued before this call, then every
/// subscriber.
///
/// # Arguments
///
/// * `now_ms` - Frame timestamp. A non-finite value gives subscribers a
///   zero delta and is not remembered as their last frame time.
///
/// # Returns
///
/// The number of callbacks invoked.
pub fn run_frame(now_ms: f64) -> usize {
    // Take everything out first: callbacks may re-enter the registry
    let (pending, subscribers) = FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        frames.frames_run += 1;
        let pending = std::mem::take(&mut frames.pending);
        let subscribers: Vec<(u64, f64, FrameSubscriber)> = frames
            .subscribers
            .iter_mut()
            .map(|(id, last, handler)| {
                if !now_ms.is_finite() {
                    return (*id, 0.0, handler.clone());
                }
                let dt = match *last {
                    Some(prev) => (now_ms - prev).clamp(0.0, MAX_FRAME_DELTA_MS),
                    None => 0.0,
                };
                *last = Some(now_ms);
                (*id, dt, handler.clone())
            })
            .collect();
        (pending, subscribers)
    });

    let mut invoked = 0;
    for (_, callback) in pending {
        callback(now_ms);
        invoked += 1;
    }

    for (id, dt, handler) in subscribers {
        // A callback earlier in this frame may have unsubscribed it
        if is_subscribed(id) {
            handler(now_ms, dt);
            invoked += 1;
        }
    }

    invoked
}

/// Advance one frame using `clock` for the timestamp.
pub fn run_frame_with(clock: &dyn FrameClock) -> usize {
    run_frame(clock.now_ms())
}

fn is_subscribed(id: u64) -> bool {
    FRAMES.with(|frames| {
        frames
            .borrow()
            .subscribers
            .iter()
            .any(|(subscriber_id, _, _)| *subscriber_id == id)
    })
}

/// Number of one-shot callbacks waiting for the next frame.
pub fn pending_frame_count() -> usize {
    FRAMES.with(|frames| frames.borrow().pending.len())
}

/// Check if a specific one-shot callback is still pending.
pub fn is_frame_pending(handle: FrameHandle) -> bool {
    FRAMES.with(|frames| {
        frames
            .borrow()
            .pending
            .iter()
            .any(|(pending, _)| *pending == handle)
    })
}

/// Number of persistent frame subscribers.
pub fn frame_subscriber_count() -> usize {
    FRAMES.with(|frames| frames.borrow().subscribers.len())
}

/// Total frames run since the last reset.
pub fn frames_run() -> u64 {
    FRAMES.with(|frames| frames.borrow().frames_run)
}

/// Reset the frame registry (for testing).
///
/// Drops every pending callback and subscriber.
pub fn reset_frame_scheduler() {
    FRAMES.with(|frames| {
        *frames.borrow_mut() = FrameRegistry::new();
    });
}

// =============================================================================
// TESTS
// =============================================================================
