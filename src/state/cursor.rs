//! Custom Cursor - Page-global pointer sample and two spring indicators
//!
//! Tracks the last pointer position, whether the pointer is over an
//! interactive element, and whether it is inside the window at all. Two
//! indicators follow the sample:
//!
//! - **dot**: snappy spring, shrinks to nothing over interactive elements
//! - **ring**: trailing spring, grows to 1.5x over interactive elements
//!
//! Hover comes from enter/leave events on registered interactive elements.
//! The tracker keeps the set of hovered elements, so leaving a nested
//! element keeps hover while the pointer is still inside its parent.
//! Leaving the window clears hover and hides both indicators.
//!
//! # State
//!
//! - [`cursor_position`] - last pointer coordinates
//! - [`is_hovering`] - over any interactive element
//! - [`is_cursor_visible`] - pointer inside the window
//! - [`dot`], [`ring`] - indicator snapshots as of the last frame
//!
//! # Example
//!
//! ```ignore
//! use spark_motion::state::cursor::{self, CursorConfig};
//!
//! let handle = cursor::mount_cursor(CursorConfig::default());
//!
//! // Host forwards pointer events and drives frames...
//! let ring = cursor::ring();
//! draw_ring(ring.position, ring.scale);
//!
//! handle.unmount();
//! ```

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};
use spark_signals::{signal, Signal};

use super::animate::subscribe_to_frames;
use super::pointer::{self, ElementId, PointerAction, PointerEvent};
use super::spring::{Spring, Spring2, SpringConfig};
use crate::types::Point;

// =============================================================================
// CONFIG
// =============================================================================

pub const IDLE_SCALE: f32 = 1.0;
pub const HOVER_DOT_SCALE: f32 = 0.0;
pub const HOVER_RING_SCALE: f32 = 1.5;

/// Spring driving indicator scale changes.
pub const SCALE_SPRING: SpringConfig = SpringConfig::new(300.0, 25.0, 0.5);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub dot_spring: SpringConfig,
    pub ring_spring: SpringConfig,
    pub scale_spring: SpringConfig,
    pub hover_dot_scale: f32,
    pub hover_ring_scale: f32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            dot_spring: SpringConfig::SNAPPY,
            ring_spring: SpringConfig::TRAILING,
            scale_spring: SCALE_SPRING,
            hover_dot_scale: HOVER_DOT_SCALE,
            hover_ring_scale: HOVER_RING_SCALE,
        }
    }
}

// =============================================================================
// INDICATOR
// =============================================================================

/// Rendered state of one indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub position: Point,
    pub scale: f32,
}

impl Default for IndicatorSnapshot {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            scale: IDLE_SCALE,
        }
    }
}

/// A visual indicator chasing the pointer sample.
#[derive(Debug, Clone)]
pub struct CursorIndicator {
    position: Spring2,
    scale: Spring,
    hover_scale: f32,
}

impl CursorIndicator {
    pub fn new(position: SpringConfig, scale: SpringConfig, hover_scale: f32) -> Self {
        Self {
            position: Spring2::new(Point::ZERO, position),
            scale: Spring::new(IDLE_SCALE, scale),
            hover_scale,
        }
    }

    pub fn follow(&mut self, target: Point) {
        self.position.set_target(target);
    }

    /// Jump to `point` without animating.
    pub fn snap_to(&mut self, point: Point) {
        self.position.snap_to(point);
    }

    pub fn set_hovering(&mut self, hovering: bool) {
        let scale = if hovering { self.hover_scale } else { IDLE_SCALE };
        self.scale.set_target(scale);
    }

    pub fn tick(&mut self, dt_ms: f32) -> IndicatorSnapshot {
        self.position.tick(dt_ms);
        self.scale.tick(dt_ms);
        self.snapshot()
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            position: self.position.position(),
            scale: self.scale.position(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.position.is_settled() && self.scale.is_settled()
    }
}

// =============================================================================
// TRACKER STATE
// =============================================================================

struct Tracker {
    generation: u64,
    dot: CursorIndicator,
    ring: CursorIndicator,
    hovered: Vec<ElementId>,
    visible: bool,
    cleanups: Vec<Box<dyn FnOnce()>>,
}

/// What a pointer event changed, published after the tracker borrow ends.
struct SampleUpdate {
    position: Option<Point>,
    hovering: bool,
    visible: bool,
    dot: IndicatorSnapshot,
    ring: IndicatorSnapshot,
}

thread_local! {
    static TRACKER: RefCell<Option<Tracker>> = const { RefCell::new(None) };
    static GENERATION: Cell<u64> = const { Cell::new(0) };

    static CURSOR_X: Signal<f32> = signal(0.0);
    static CURSOR_Y: Signal<f32> = signal(0.0);
    static HOVERING: Signal<bool> = signal(false);
    static VISIBLE: Signal<bool> = signal(false);
    static DOT: Signal<IndicatorSnapshot> = signal(IndicatorSnapshot::default());
    static RING: Signal<IndicatorSnapshot> = signal(IndicatorSnapshot::default());
}

// =============================================================================
// STATE ACCESS
// =============================================================================

/// Last pointer coordinates.
pub fn cursor_position() -> Point {
    Point::new(CURSOR_X.with(|s| s.get()), CURSOR_Y.with(|s| s.get()))
}

/// True while the pointer is over any interactive element.
pub fn is_hovering() -> bool {
    HOVERING.with(|s| s.get())
}

/// True once the pointer has moved inside the window, until it leaves.
pub fn is_cursor_visible() -> bool {
    VISIBLE.with(|s| s.get())
}

/// Dot indicator as of the last frame.
pub fn dot() -> IndicatorSnapshot {
    DOT.with(|s| s.get())
}

/// Ring indicator as of the last frame.
pub fn ring() -> IndicatorSnapshot {
    RING.with(|s| s.get())
}

pub fn hovering_signal() -> Signal<bool> {
    HOVERING.with(|s| s.clone())
}

pub fn visible_signal() -> Signal<bool> {
    VISIBLE.with(|s| s.clone())
}

pub fn dot_signal() -> Signal<IndicatorSnapshot> {
    DOT.with(|s| s.clone())
}

pub fn ring_signal() -> Signal<IndicatorSnapshot> {
    RING.with(|s| s.clone())
}

pub fn is_cursor_mounted() -> bool {
    TRACKER.with(|t| t.borrow().is_some())
}

// =============================================================================
// MOUNT / UNMOUNT
// =============================================================================

/// Handle for the mounted tracker. Dropping it unmounts.
#[must_use = "dropping the handle unmounts the cursor"]
pub struct CursorHandle {
    generation: u64,
}

impl CursorHandle {
    /// Deregister listeners and reset the sample.
    pub fn unmount(self) {
        drop(self);
    }

    /// False once a later `mount_cursor` has replaced this mount.
    pub fn is_current(&self) -> bool {
        TRACKER.with(|t| {
            t.borrow()
                .as_ref()
                .is_some_and(|tracker| tracker.generation == self.generation)
        })
    }
}

impl Drop for CursorHandle {
    fn drop(&mut self) {
        if self.is_current() {
            unmount_cursor();
        }
    }
}

/// Start tracking. Replaces any tracker already mounted.
pub fn mount_cursor(config: CursorConfig) -> CursorHandle {
    unmount_cursor();

    let generation = GENERATION.with(|g| {
        let next = g.get() + 1;
        g.set(next);
        next
    });

    TRACKER.with(|t| {
        *t.borrow_mut() = Some(Tracker {
            generation,
            dot: CursorIndicator::new(config.dot_spring, config.scale_spring, config.hover_dot_scale),
            ring: CursorIndicator::new(
                config.ring_spring,
                config.scale_spring,
                config.hover_ring_scale,
            ),
            hovered: Vec::new(),
            visible: false,
            cleanups: Vec::new(),
        });
    });

    let cleanups: Vec<Box<dyn FnOnce()>> = vec![
        Box::new(pointer::on_pointer(handle_pointer)),
        subscribe_to_frames(|_now, dt| tick_indicators(dt as f32)),
    ];
    TRACKER.with(|t| {
        if let Some(tracker) = t.borrow_mut().as_mut() {
            tracker.cleanups = cleanups;
        }
    });

    CursorHandle { generation }
}

/// Deregister the tracker's listeners and reset the sample. No-op if unmounted.
pub fn unmount_cursor() {
    let Some(tracker) = TRACKER.with(|t| t.borrow_mut().take()) else {
        return;
    };
    for cleanup in tracker.cleanups {
        cleanup();
    }
    reset_sample();
}

/// Reset cursor state (for testing)
pub fn reset_cursor_state() {
    unmount_cursor();
    reset_sample();
}

fn reset_sample() {
    CURSOR_X.with(|s| s.set(0.0));
    CURSOR_Y.with(|s| s.set(0.0));
    HOVERING.with(|s| s.set(false));
    VISIBLE.with(|s| s.set(false));
    DOT.with(|s| s.set(IndicatorSnapshot::default()));
    RING.with(|s| s.set(IndicatorSnapshot::default()));
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

fn handle_pointer(event: &PointerEvent) {
    let update = TRACKER.with(|t| {
        let mut t = t.borrow_mut();
        let tracker = t.as_mut()?;
        Some(apply_event(tracker, event))
    });

    // Publish outside the borrow so effects can read the cursor API
    if let Some(update) = update {
        if let Some(position) = update.position {
            CURSOR_X.with(|s| s.set(position.x));
            CURSOR_Y.with(|s| s.set(position.y));
        }
        HOVERING.with(|s| s.set(update.hovering));
        VISIBLE.with(|s| s.set(update.visible));
        DOT.with(|s| s.set(update.dot));
        RING.with(|s| s.set(update.ring));
    }
}

fn apply_event(tracker: &mut Tracker, event: &PointerEvent) -> SampleUpdate {
    let mut position = None;

    match event.action {
        PointerAction::Move | PointerAction::Enter => {
            let point = event.position();
            if tracker.visible {
                tracker.dot.follow(point);
                tracker.ring.follow(point);
            } else {
                // First sample after (re)entering the window: appear in place
                tracker.dot.snap_to(point);
                tracker.ring.snap_to(point);
                tracker.visible = true;
            }
            position = Some(point);

            if event.action == PointerAction::Enter && event.flags.is_hoverable() {
                if let Some(target) = event.target {
                    if !tracker.hovered.contains(&target) {
                        tracker.hovered.push(target);
                    }
                }
            }
        }
        PointerAction::Leave => {
            if let Some(target) = event.target {
                tracker.hovered.retain(|&h| h != target);
            }
        }
        PointerAction::LeaveWindow => {
            tracker.hovered.clear();
            tracker.visible = false;
        }
    }

    let hovering = !tracker.hovered.is_empty();
    tracker.dot.set_hovering(hovering);
    tracker.ring.set_hovering(hovering);

    SampleUpdate {
        position,
        hovering,
        visible: tracker.visible,
        dot: tracker.dot.snapshot(),
        ring: tracker.ring.snapshot(),
    }
}

fn tick_indicators(dt_ms: f32) {
    let snapshots = TRACKER.with(|t| {
        let mut t = t.borrow_mut();
        let tracker = t.as_mut()?;
        Some((tracker.dot.tick(dt_ms), tracker.ring.tick(dt_ms)))
    });

    if let Some((dot, ring)) = snapshots {
        DOT.with(|s| s.set(dot));
        RING.with(|s| s.set(ring));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::animate::{frame_subscriber_count, reset_frame_scheduler, run_frame};
    use crate::state::pointer::{dispatch, listener_count, register_interactive, reset_pointer_state};
    use crate::types::Interactive;

    fn setup() {
        reset_cursor_state();
        reset_frame_scheduler();
        reset_pointer_state();
    }

    fn run_frames(count: usize) {
        for i in 0..count {
            run_frame(i as f64 * 16.0);
        }
    }

    #[test]
    fn test_move_updates_sample() {
        setup();
        let _handle = mount_cursor(CursorConfig::default());

        assert!(!is_cursor_visible());
        dispatch(PointerEvent::move_to(120.0, 80.0));

        assert_eq!(cursor_position(), Point::new(120.0, 80.0));
        assert!(is_cursor_visible());
        // First sample snaps both indicators
        assert_eq!(dot().position, Point::new(120.0, 80.0));
        assert_eq!(ring().position, Point::new(120.0, 80.0));
    }

    #[test]
    fn test_ring_trails_dot() {
        setup();
        let _handle = mount_cursor(CursorConfig::default());

        dispatch(PointerEvent::move_to(0.0, 0.0));
        dispatch(PointerEvent::move_to(100.0, 0.0));

        run_frame(0.0);
        run_frame(16.0);
        assert!(dot().position.x > ring().position.x);
        assert!(ring().position.x > 0.0);

        run_frames(200);
        assert!((dot().position.x - 100.0).abs() < 0.05);
        assert!((ring().position.x - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_hover_scales_indicators() {
        setup();
        let _handle = mount_cursor(CursorConfig::default());
        let _link = register_interactive(1, Interactive::LINK);

        dispatch(PointerEvent::enter(1, 10.0, 10.0));
        assert!(is_hovering());

        run_frames(120);
        assert!(dot().scale.abs() < 0.05);
        assert!((ring().scale - 1.5).abs() < 0.05);

        dispatch(PointerEvent::leave(1, 30.0, 30.0));
        assert!(!is_hovering());

        run_frames(120);
        assert!((dot().scale - 1.0).abs() < 0.05);
        assert!((ring().scale - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_non_interactive_enter_does_not_hover() {
        setup();
        let _handle = mount_cursor(CursorConfig::default());

        dispatch(PointerEvent::enter(42, 10.0, 10.0));
        assert!(!is_hovering());

        // Magnetic alone is not a hover target
        let _magnetic = register_interactive(43, Interactive::MAGNETIC);
        dispatch(PointerEvent::enter(43, 10.0, 10.0));
        assert!(!is_hovering());
    }

    #[test]
    fn test_nested_elements_keep_hover() {
        setup();
        let _handle = mount_cursor(CursorConfig::default());
        let _card = register_interactive(1, Interactive::HOVER_TARGET);
        let _button = register_interactive(2, Interactive::BUTTON);

        dispatch(PointerEvent::enter(1, 10.0, 10.0));
        dispatch(PointerEvent::enter(2, 12.0, 12.0));
        dispatch(PointerEvent::leave(2, 20.0, 20.0));
        assert!(is_hovering());

        dispatch(PointerEvent::leave(1, 40.0, 40.0));
        assert!(!is_hovering());
    }

    #[test]
    fn test_hit_tested_nested_child_keeps_hover() {
        setup();
        let _handle = mount_cursor(CursorConfig::default());
        let _link = register_interactive(1, Interactive::LINK);
        let _icon = register_interactive(2, Interactive::MAGNETIC);
        pointer::set_element_bounds(1, crate::types::Rect::new(0.0, 0.0, 200.0, 40.0));
        pointer::set_element_bounds(2, crate::types::Rect::new(150.0, 5.0, 30.0, 30.0));

        pointer::dispatch_move(20.0, 20.0);
        assert!(is_hovering());

        // Onto the magnetic-only child: still inside the link
        pointer::dispatch_move(160.0, 20.0);
        assert!(is_hovering());

        pointer::dispatch_move(400.0, 20.0);
        assert!(!is_hovering());
    }

    #[test]
    fn test_leave_window_clears_hover_and_hides() {
        setup();
        let _handle = mount_cursor(CursorConfig::default());
        let _link = register_interactive(1, Interactive::LINK);

        dispatch(PointerEvent::enter(1, 10.0, 10.0));
        dispatch(PointerEvent::leave_window());

        assert!(!is_hovering());
        assert!(!is_cursor_visible());

        // Coming back snaps to the new position
        dispatch(PointerEvent::move_to(300.0, 200.0));
        assert!(is_cursor_visible());
        assert_eq!(ring().position, Point::new(300.0, 200.0));
    }

    #[test]
    fn test_unregistering_hovered_element_clears_hover() {
        setup();
        let _handle = mount_cursor(CursorConfig::default());
        let unregister = register_interactive(1, Interactive::BUTTON);

        dispatch(PointerEvent::enter(1, 10.0, 10.0));
        assert!(is_hovering());

        unregister();
        assert!(!is_hovering());
    }

    #[test]
    fn test_unmount_deregisters_and_resets() {
        setup();
        let handle = mount_cursor(CursorConfig::default());
        assert_eq!(listener_count(), 1);
        assert_eq!(frame_subscriber_count(), 1);

        dispatch(PointerEvent::move_to(50.0, 60.0));
        handle.unmount();

        assert!(!is_cursor_mounted());
        assert_eq!(listener_count(), 0);
        assert_eq!(frame_subscriber_count(), 0);
        assert_eq!(cursor_position(), Point::ZERO);
        assert!(!is_cursor_visible());

        // Events after teardown are not observed
        dispatch(PointerEvent::move_to(70.0, 70.0));
        assert_eq!(cursor_position(), Point::ZERO);
    }

    #[test]
    fn test_remount_replaces_previous() {
        setup();
        let first = mount_cursor(CursorConfig::default());
        let second = mount_cursor(CursorConfig::default());

        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(listener_count(), 1);

        // Stale handle does not tear down the live tracker
        first.unmount();
        assert!(is_cursor_mounted());

        second.unmount();
        assert!(!is_cursor_mounted());
    }

    #[test]
    fn test_indicator_hover_targets() {
        let mut dot = CursorIndicator::new(SpringConfig::SNAPPY, SCALE_SPRING, HOVER_DOT_SCALE);
        dot.set_hovering(true);
        for _ in 0..100 {
            dot.tick(16.0);
        }
        assert_eq!(dot.snapshot().scale, 0.0);
        assert!(dot.is_settled());
    }
}
