//! # spark-motion
//!
//! Reactive motion and interaction state for a presentation page.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! Every subsystem is plain state plus signals. The host owns the real event
//! sources (scroll, pointer, intersection, animation frames, storage) and
//! forwards them in; views read signals out:
//!
//! ```text
//! storage ──> VisitorCounter ──┐
//!                              ├──> CountUp ──> display signal
//! intersections ──> Reveal ────┘       ^
//!                                      │
//! animation frames ──> frame scheduler ┴──> springs (cursor, magnetic)
//! pointer events ──> pointer registry ───> cursor / magnetic targets
//! scroll events ──> scroll signal ──> derived transforms
//! ```
//!
//! All state is thread-local: one page, one event loop.
//!
//! ## Modules
//!
//! - [`types`] - Geometry and interactive element flags
//! - [`storage`] - Key-value stores backing the visit counter
//! - [`config`] - TOML configuration
//! - [`error`] - Error types
//! - [`state`] - The motion subsystems

pub mod config;
pub mod error;
pub mod state;
pub mod storage;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{MotionConfig, RevealConfig};
pub use error::{ConfigError, StorageError};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub use state::{
    // Frames
    cancel_frame, request_frame, run_frame, run_frame_with, subscribe_to_frames,
    FrameClock, FrameHandle, InstantClock, ManualClock,
    // Springs
    Spring, Spring2, SpringConfig, SpringState,
    // Visitor counter
    VisitResolution, VisitorConfig, VisitorCounter,
    // Reveal
    GeometrySource, IntersectionEntry, IntersectionSource, RegionId, RevealObserver,
    RevealState, RootMargin, ViewportTrigger,
    // Tween
    CountUp, MountedCountUp, TweenConfig, TweenPhase,
    // Scroll
    dispatch_scroll, map_range, scroll_offset, scroll_transform, ScrollMapping,
    // Pointer
    ElementId, PointerAction, PointerEvent,
    // Magnetic
    MagneticConfig, MagneticControl, MagneticHandle,
    // Cursor
    mount_cursor, CursorConfig, CursorHandle, CursorIndicator, IndicatorSnapshot,
};

// Re-export spark-signals for convenience
pub use spark_signals::{derived, effect, signal, Derived, Signal};
