//! Magnetic Controls - Pointer-following displacement
//!
//! A magnetic control drifts toward the pointer while it is over the
//! control and springs back to rest when the pointer leaves.
//!
//! Target offset is `(pointer - center) * strength`. The rendered offset is
//! the output of a [`Spring2`] chasing that target. No clamp is applied to
//! the magnitude.
//!
//! # Example
//!
//! ```ignore
//! use spark_motion::state::magnetic::{MagneticConfig, MagneticControl};
//! use spark_motion::types::{Interactive, Rect};
//!
//! let handle = MagneticControl::new(MagneticConfig::default())
//!     .mount(cta_button, Interactive::BUTTON);
//! handle.set_bounds(Rect::new(100.0, 100.0, 120.0, 40.0));
//!
//! // Each frame the offset signal follows the spring
//! let offset = handle.offset();
//!
//! handle.unmount();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use spark_signals::{signal, Signal};

use super::animate::subscribe_to_frames;
use super::pointer::{self, ElementId, PointerAction};
use super::spring::{Spring2, SpringConfig};
use crate::types::{Interactive, Point, Rect};

/// Fraction of the pointer's distance from center the control moves.
pub const DEFAULT_STRENGTH: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticConfig {
    pub strength: f32,
    pub spring: SpringConfig,
}

impl Default for MagneticConfig {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STRENGTH,
            spring: SpringConfig::MAGNETIC,
        }
    }
}

/// Raw offset for a pointer sample relative to a control center.
pub fn magnetic_offset(center: Point, pointer: Point, strength: f32) -> Point {
    pointer.sub(center).scale(strength)
}

// =============================================================================
// CONTROL
// =============================================================================

#[derive(Debug, Clone)]
pub struct MagneticControl {
    bounds: Option<Rect>,
    strength: f32,
    spring: Spring2,
}

impl MagneticControl {
    pub fn new(config: MagneticConfig) -> Self {
        Self {
            bounds: None,
            strength: config.strength,
            spring: Spring2::new(Point::ZERO, config.spring),
        }
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
    }

    pub fn clear_bounds(&mut self) {
        self.bounds = None;
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Retarget toward `pointer`. Returns false (and does nothing) when the
    /// control has no usable geometry yet.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let Some(bounds) = self.bounds.filter(|b| !b.is_empty()) else {
            return false;
        };
        self.spring
            .set_target(magnetic_offset(bounds.center(), pointer, self.strength));
        true
    }

    /// Head back to rest.
    pub fn pointer_leave(&mut self) {
        self.spring.set_target(Point::ZERO);
    }

    /// Advance the spring; returns the rendered offset.
    pub fn tick(&mut self, dt_ms: f32) -> Point {
        self.spring.tick(dt_ms)
    }

    /// Rendered offset.
    pub fn offset(&self) -> Point {
        self.spring.position()
    }

    /// Raw target offset.
    pub fn target(&self) -> Point {
        self.spring.target()
    }

    pub fn is_settled(&self) -> bool {
        self.spring.is_settled()
    }

    /// Register `element` as interactive and start following the pointer.
    ///
    /// # Arguments
    ///
    /// * `element` - Id the host uses for hit testing and bounds updates
    /// * `flags` - Interactive kind; `MAGNETIC` is always added
    ///
    /// # Returns
    ///
    /// A handle owning the listener, frame subscription and registration.
    /// Dropping it tears all three down.
    pub fn mount(self, element: ElementId, flags: Interactive) -> MagneticHandle {
        let control = Rc::new(RefCell::new(self));
        let offset = signal(Point::ZERO);
        let mut cleanups: Vec<Box<dyn FnOnce()>> = Vec::new();

        cleanups.push(Box::new(pointer::register_interactive(
            element,
            flags | Interactive::MAGNETIC,
        )));
        if let Some(bounds) = control.borrow().bounds {
            pointer::set_element_bounds(element, bounds);
        }

        let listener_control = control.clone();
        cleanups.push(Box::new(pointer::on_pointer(move |event| {
            let mut control = listener_control.borrow_mut();
            match event.action {
                PointerAction::LeaveWindow => control.pointer_leave(),
                _ if event.target != Some(element) => {}
                PointerAction::Move | PointerAction::Enter => {
                    control.pointer_move(event.position());
                }
                PointerAction::Leave => control.pointer_leave(),
            }
        })));

        let frame_control = control.clone();
        let frame_offset = offset.clone();
        cleanups.push(subscribe_to_frames(move |_now, dt| {
            let rendered = frame_control.borrow_mut().tick(dt as f32);
            frame_offset.set(rendered);
        }));

        MagneticHandle {
            element,
            control,
            offset,
            cleanups,
        }
    }
}

// =============================================================================
// MOUNTED HANDLE
// =============================================================================

/// A mounted magnetic control. Dropping it unmounts.
pub struct MagneticHandle {
    element: ElementId,
    control: Rc<RefCell<MagneticControl>>,
    offset: Signal<Point>,
    cleanups: Vec<Box<dyn FnOnce()>>,
}

impl MagneticHandle {
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Update geometry for both the control and pointer hit testing.
    pub fn set_bounds(&self, bounds: Rect) {
        self.control.borrow_mut().set_bounds(bounds);
        pointer::set_element_bounds(self.element, bounds);
    }

    /// Rendered offset as of the last frame.
    pub fn offset(&self) -> Point {
        self.offset.get()
    }

    pub fn offset_signal(&self) -> Signal<Point> {
        self.offset.clone()
    }

    pub fn target(&self) -> Point {
        self.control.borrow().target()
    }

    pub fn is_settled(&self) -> bool {
        self.control.borrow().is_settled()
    }

    /// Deregister the pointer listener, the frame subscription and the element.
    pub fn unmount(self) {
        drop(self);
    }

    fn teardown(&mut self) {
        // Reverse mount order
        for cleanup in self.cleanups.drain(..).rev() {
            cleanup();
        }
    }
}

impl Drop for MagneticHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// TESTS
// =============================================================================
