//! State Module - Runtime state for the page's motion systems
//!
//! - **Animate** - Frame scheduler: one-shot callbacks and per-frame subscribers
//! - **Spring** - Damped spring integrator (1D and 2D)
//! - **Visitor** - Durable visit counter with per-session dedup
//! - **Reveal** - One-shot viewport triggers and the observer that feeds them
//! - **Tween** - Count-up animation gated on a trigger
//! - **Scroll** - Page scroll sample and clamped linear mappings
//! - **Pointer** - Pointer event routing and interactive elements
//! - **Magnetic** - Pointer-following controls
//! - **Cursor** - Custom cursor: pointer sample, hover state, dot and ring

pub mod animate;
pub mod cursor;
pub mod magnetic;
pub mod pointer;
pub mod reveal;
pub mod scroll;
pub mod spring;
pub mod tween;
pub mod visitor;

pub use animate::{
    cancel_frame, request_frame, run_frame, run_frame_with, subscribe_to_frames, FrameClock,
    FrameHandle, InstantClock, ManualClock,
};
pub use cursor::{mount_cursor, CursorConfig, CursorHandle, CursorIndicator, IndicatorSnapshot};
pub use magnetic::{MagneticConfig, MagneticControl, MagneticHandle};
pub use pointer::{ElementId, PointerAction, PointerEvent};
pub use reveal::{
    GeometrySource, IntersectionEntry, IntersectionSource, RegionId, RevealObserver, RevealState,
    RootMargin, ViewportTrigger,
};
pub use scroll::{dispatch_scroll, map_range, scroll_offset, scroll_transform, ScrollMapping};
pub use spring::{Spring, Spring2, SpringConfig, SpringState};
pub use tween::{CountUp, MountedCountUp, TweenConfig, TweenPhase};
pub use visitor::{VisitResolution, VisitorConfig, VisitorCounter};
