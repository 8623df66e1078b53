//! Pointer Module - Pointer event routing and interactive elements
//!
//! The host forwards native pointer events here; the cursor tracker and
//! magnetic controls subscribe. Does NOT own the native event source.
//!
//! # API
//!
//! - `register_interactive(element, flags)` - flag an element (link, button...)
//! - `set_element_bounds(element, rect)` - geometry for hit testing
//! - `on_pointer(fn)` - global listener, returns cleanup
//! - `dispatch(event)` - route an event the host already targeted
//! - `dispatch_move(x, y)` - hit test, synthesize enter/leave for every
//!   element under the pointer, route the move
//!
//! # Example
//!
//! ```ignore
//! use spark_motion::state::pointer::{self, PointerEvent};
//! use spark_motion::types::Interactive;
//!
//! let unregister = pointer::register_interactive(nav_link, Interactive::LINK);
//! let cleanup = pointer::on_pointer(|event| {
//!     println!("{:?} at ({}, {})", event.action, event.x, event.y);
//! });
//!
//! pointer::dispatch(PointerEvent::enter(nav_link, 40.0, 12.0));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{Interactive, Point, Rect};

// =============================================================================
// TYPES
// =============================================================================

/// Index of an element in the host's tree.
pub type ElementId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Move,
    /// Pointer entered `target`
    Enter,
    /// Pointer left `target`
    Leave,
    /// Pointer left the document/window entirely
    LeaveWindow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub x: f32,
    pub y: f32,
    /// Element under the pointer (enter/leave: the element entered/left)
    pub target: Option<ElementId>,
    /// Flags of `target` (filled by dispatch)
    pub flags: Interactive,
}

impl PointerEvent {
    pub fn new(action: PointerAction, x: f32, y: f32, target: Option<ElementId>) -> Self {
        Self {
            action,
            x,
            y,
            target,
            flags: Interactive::NONE,
        }
    }

    /// Move with no known target.
    pub fn move_to(x: f32, y: f32) -> Self {
        Self::new(PointerAction::Move, x, y, None)
    }

    /// Move over a known element.
    pub fn move_over(element: ElementId, x: f32, y: f32) -> Self {
        Self::new(PointerAction::Move, x, y, Some(element))
    }

    pub fn enter(element: ElementId, x: f32, y: f32) -> Self {
        Self::new(PointerAction::Enter, x, y, Some(element))
    }

    pub fn leave(element: ElementId, x: f32, y: f32) -> Self {
        Self::new(PointerAction::Leave, x, y, Some(element))
    }

    pub fn leave_window() -> Self {
        Self::new(PointerAction::LeaveWindow, 0.0, 0.0, None)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Listener for pointer events.
pub type PointerHandler = Rc<dyn Fn(&PointerEvent)>;

// =============================================================================
// REGISTRY
// =============================================================================

struct InteractiveElement {
    flags: Interactive,
    bounds: Option<Rect>,
}

struct PointerRegistry {
    elements: HashMap<ElementId, InteractiveElement>,
    /// Registration order; later elements sit on top for hit testing
    order: Vec<ElementId>,
    /// Elements the pointer is currently inside
    hovered: Vec<ElementId>,
    /// Elements containing the last `dispatch_move` point, bottom to top
    hits: Vec<ElementId>,
    last_position: Point,
    listeners: Vec<(usize, PointerHandler)>,
    next_id: usize,
}

impl PointerRegistry {
    fn new() -> Self {
        Self {
            elements: HashMap::new(),
            order: Vec::new(),
            hovered: Vec::new(),
            hits: Vec::new(),
            last_position: Point::ZERO,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

thread_local! {
    static REGISTRY: RefCell<PointerRegistry> = RefCell::new(PointerRegistry::new());
}

// =============================================================================
// PUBLIC API - ELEMENTS
// =============================================================================

/// Flag `element` as interactive. Returns cleanup function.
///
/// Re-registering replaces the flags and keeps known bounds.
pub fn register_interactive(element: ElementId, flags: Interactive) -> impl FnOnce() {
    REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let bounds = reg.elements.get(&element).and_then(|e| e.bounds);
        reg.elements.insert(element, InteractiveElement { flags, bounds });
        if !reg.order.contains(&element) {
            reg.order.push(element);
        }
    });

    move || unregister_interactive(element)
}

/// Remove `element`. If the pointer was inside it, listeners get a `Leave`.
pub fn unregister_interactive(element: ElementId) {
    let leave = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let removed = reg.elements.remove(&element);
        reg.order.retain(|&e| e != element);
        reg.hits.retain(|&e| e != element);
        let was_hovered = reg.hovered.contains(&element);
        match removed {
            Some(_) if was_hovered => {
                let at = reg.last_position;
                Some(PointerEvent::leave(element, at.x, at.y))
            }
            _ => None,
        }
    });

    if let Some(event) = leave {
        dispatch(event);
    }
}

/// Set hit-test geometry for a registered element. Unknown elements are ignored.
pub fn set_element_bounds(element: ElementId, bounds: Rect) {
    REGISTRY.with(|reg| {
        if let Some(entry) = reg.borrow_mut().elements.get_mut(&element) {
            entry.bounds = Some(bounds);
        }
    });
}

/// Flags of `element` (`NONE` if not registered).
pub fn element_flags(element: ElementId) -> Interactive {
    REGISTRY.with(|reg| {
        reg.borrow()
            .elements
            .get(&element)
            .map(|e| e.flags)
            .unwrap_or(Interactive::NONE)
    })
}

/// Topmost registered element whose bounds contain `point`.
pub fn hit_test(point: Point) -> Option<ElementId> {
    hit_test_all(point).last().copied()
}

/// Every registered element whose bounds contain `point`, bottom to top.
pub fn hit_test_all(point: Point) -> Vec<ElementId> {
    REGISTRY.with(|reg| {
        let reg = reg.borrow();
        reg.order
            .iter()
            .copied()
            .filter(|element| {
                reg.elements
                    .get(element)
                    .and_then(|e| e.bounds)
                    .is_some_and(|bounds| !bounds.is_empty() && bounds.contains(point))
            })
            .collect()
    })
}

/// Elements the pointer is currently inside, in entry order.
pub fn hovered_elements() -> Vec<ElementId> {
    REGISTRY.with(|reg| reg.borrow().hovered.clone())
}

/// Last pointer position seen by dispatch.
pub fn last_position() -> Point {
    REGISTRY.with(|reg| reg.borrow().last_position)
}

// =============================================================================
// PUBLIC API - LISTENERS
// =============================================================================

/// Register a global pointer listener. Returns cleanup function.
pub fn on_pointer<F>(handler: F) -> impl FnOnce()
where
    F: Fn(&PointerEvent) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.listeners.push((id, Rc::new(handler)));
        id
    });

    move || {
        REGISTRY.with(|reg| {
            reg.borrow_mut()
                .listeners
                .retain(|(listener_id, _)| *listener_id != id);
        });
    }
}

/// Number of registered listeners.
pub fn listener_count() -> usize {
    REGISTRY.with(|reg| reg.borrow().listeners.len())
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Route an event to every listener.
pub fn dispatch(mut event: PointerEvent) {
    // 1. Fill flags and update tracking
    let listeners: Vec<(usize, PointerHandler)> = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();

        event.flags = event
            .target
            .and_then(|t| reg.elements.get(&t))
            .map(|e| e.flags)
            .unwrap_or(Interactive::NONE);

        match event.action {
            PointerAction::Move | PointerAction::Enter | PointerAction::Leave => {
                reg.last_position = event.position();
            }
            PointerAction::LeaveWindow => {}
        }

        match (event.action, event.target) {
            (PointerAction::Enter, Some(t)) => {
                if !reg.hovered.contains(&t) {
                    reg.hovered.push(t);
                }
            }
            (PointerAction::Leave, Some(t)) => reg.hovered.retain(|&h| h != t),
            (PointerAction::LeaveWindow, _) => {
                reg.hovered.clear();
                reg.hits.clear();
            }
            _ => {}
        }

        reg.listeners
            .iter()
            .map(|(id, h)| (*id, h.clone()))
            .collect()
    });

    // 2. Call listeners outside the borrow; they may re-enter
    for (id, listener) in listeners {
        // An earlier listener may have removed it during this dispatch
        if is_listening(id) {
            listener(&event);
        }
    }
}

fn is_listening(id: usize) -> bool {
    REGISTRY.with(|reg| {
        reg.borrow()
            .listeners
            .iter()
            .any(|(listener_id, _)| *listener_id == id)
    })
}

/// Dispatch a raw move: hit test registered bounds and route the move.
///
/// Every element containing the point counts as entered, not just the
/// topmost, so moving onto a nested element keeps its parents entered.
/// Enters are emitted before leaves: crossing directly between two
/// elements never passes through an empty hovered set. The final `Move`
/// targets the topmost element under the pointer, if any.
///
/// # Arguments
///
/// * `x`, `y` - Pointer position in page pixels
pub fn dispatch_move(x: f32, y: f32) {
    let point = Point::new(x, y);
    let hits = hit_test_all(point);
    let previous = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        std::mem::replace(&mut reg.hits, hits.clone())
    });

    for &entered in hits.iter().filter(|e| !previous.contains(e)) {
        dispatch(PointerEvent::enter(entered, x, y));
    }
    // Innermost first
    for &left in previous.iter().rev().filter(|e| !hits.contains(e)) {
        dispatch(PointerEvent::leave(left, x, y));
    }

    dispatch(PointerEvent::new(PointerAction::Move, x, y, hits.last().copied()));
}

// =============================================================================
// CLEANUP
// =============================================================================

/// Reset pointer state (for testing)
pub fn reset_pointer_state() {
    REGISTRY.with(|reg| {
        *reg.borrow_mut() = PointerRegistry::new();
    });
}

// =============================================================================
// TESTS
// =============================================================================
