//! Scroll Progress - Page scroll offset mapped to visual values
//!
//! Manages the page-global scroll sample and the clamped linear mappings
//! parallax and fade effects read from it:
//! - Scroll offset signal, written only by [`dispatch_scroll`]
//! - [`ScrollMapping`]: domain -> range, clamped at the domain edges
//! - [`scroll_transform`]: a derived value bound to the scroll signal
//!
//! Architecture:
//! - the host forwards native scroll events to `dispatch_scroll`
//! - readers get the cached sample, never the live layout value
//! - each transform reads the signal independently, in any number

use serde::{Deserialize, Serialize};
use spark_signals::{derived, signal, Derived, Signal};

// =============================================================================
// SCROLL SAMPLE
// =============================================================================

thread_local! {
    static SCROLL_Y: Signal<f32> = signal(0.0);
}

/// Record a new scroll offset. Non-finite samples are dropped.
pub fn dispatch_scroll(offset: f32) {
    if !offset.is_finite() {
        return;
    }
    SCROLL_Y.with(|s| s.set(offset));
}

/// Current scroll offset (last dispatched sample).
pub fn scroll_offset() -> f32 {
    SCROLL_Y.with(|s| s.get())
}

/// The scroll signal, for binding.
pub fn scroll_signal() -> Signal<f32> {
    SCROLL_Y.with(|s| s.clone())
}

/// Reset scroll state (for testing).
pub fn reset_scroll_state() {
    SCROLL_Y.with(|s| s.set(0.0));
}

// =============================================================================
// MAPPING
// =============================================================================

/// Map `offset` from `domain` onto `range`, clamped at the domain edges.
///
/// `offset <= d0` gives `r0`, `offset >= d1` gives `r1`, linear between.
/// With `d1 <= d0` the mapping is a step at `d0`. A NaN offset counts as `d0`.
pub fn map_range(offset: f32, domain: (f32, f32), range: (f32, f32)) -> f32 {
    let (d0, d1) = domain;
    let (r0, r1) = range;

    if offset.is_nan() || offset <= d0 {
        return r0;
    }
    if offset >= d1 {
        return r1;
    }

    let t = (offset - d0) / (d1 - d0);
    r0 + t * (r1 - r0)
}

/// A clamped linear mapping from scroll offset to an output value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMapping {
    pub domain: (f32, f32),
    pub range: (f32, f32),
}

impl ScrollMapping {
    pub const fn new(domain: (f32, f32), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, offset: f32) -> f32 {
        map_range(offset, self.domain, self.range)
    }

    /// Value at the current scroll sample.
    pub fn current(&self) -> f32 {
        self.map(scroll_offset())
    }
}

/// Hero parallax: content drifts 150px down over the first 500px of scroll.
pub const HERO_PARALLAX: ScrollMapping = ScrollMapping::new((0.0, 500.0), (0.0, 150.0));

/// Hero fade: fully transparent after 300px of scroll.
pub const HERO_FADE: ScrollMapping = ScrollMapping::new((0.0, 300.0), (1.0, 0.0));

/// Derived value tracking `mapping` over the scroll signal.
///
/// # Example
///
/// ```ignore
/// use spark_motion::state::scroll::{dispatch_scroll, scroll_transform, HERO_FADE};
///
/// let opacity = scroll_transform(HERO_FADE);
/// dispatch_scroll(150.0);
/// assert_eq!(opacity.get(), 0.5);
/// ```
pub fn scroll_transform(mapping: ScrollMapping) -> Derived<f32> {
    let source = scroll_signal();
    derived(move || mapping.map(source.get()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        reset_scroll_state();
    }

    #[test]
    fn test_map_clamps_at_domain_edges() {
        let mapping = ScrollMapping::new((0.0, 500.0), (0.0, 150.0));

        assert_eq!(mapping.map(-50.0), 0.0);
        assert_eq!(mapping.map(0.0), 0.0);
        assert_eq!(mapping.map(500.0), 150.0);
        assert_eq!(mapping.map(10000.0), 150.0);
    }

    #[test]
    fn test_map_interpolates() {
        assert_eq!(map_range(250.0, (0.0, 500.0), (0.0, 150.0)), 75.0);
        assert_eq!(map_range(150.0, (100.0, 200.0), (10.0, 20.0)), 15.0);
    }

    #[test]
    fn test_map_descending_range() {
        assert_eq!(HERO_FADE.map(0.0), 1.0);
        assert_eq!(HERO_FADE.map(150.0), 0.5);
        assert_eq!(HERO_FADE.map(300.0), 0.0);
        assert_eq!(HERO_FADE.map(900.0), 0.0);
    }

    #[test]
    fn test_map_degenerate_domain_is_step() {
        assert_eq!(map_range(99.0, (100.0, 100.0), (0.0, 1.0)), 0.0);
        assert_eq!(map_range(100.0, (100.0, 100.0), (0.0, 1.0)), 0.0);
        assert_eq!(map_range(101.0, (100.0, 100.0), (0.0, 1.0)), 1.0);
        // Reversed domain behaves the same way
        assert_eq!(map_range(50.0, (100.0, 0.0), (0.0, 1.0)), 0.0);
        assert_eq!(map_range(150.0, (100.0, 0.0), (0.0, 1.0)), 1.0);
    }

    #[test]
    fn test_map_nan_offset() {
        assert_eq!(map_range(f32::NAN, (0.0, 100.0), (3.0, 7.0)), 3.0);
    }

    #[test]
    fn test_dispatch_updates_sample() {
        setup();

        assert_eq!(scroll_offset(), 0.0);
        dispatch_scroll(320.0);
        assert_eq!(scroll_offset(), 320.0);

        // Non-finite samples are dropped
        dispatch_scroll(f32::INFINITY);
        dispatch_scroll(f32::NAN);
        assert_eq!(scroll_offset(), 320.0);
    }

    #[test]
    fn test_current_reads_sample() {
        setup();

        dispatch_scroll(250.0);
        assert_eq!(HERO_PARALLAX.current(), 75.0);
    }

    #[test]
    fn test_transforms_share_signal_independently() {
        setup();

        let translate = scroll_transform(HERO_PARALLAX);
        let opacity = scroll_transform(HERO_FADE);

        assert_eq!(translate.get(), 0.0);
        assert_eq!(opacity.get(), 1.0);

        dispatch_scroll(150.0);
        assert!((translate.get() - 45.0).abs() < 1e-4);
        assert!((opacity.get() - 0.5).abs() < 1e-6);

        dispatch_scroll(600.0);
        assert_eq!(translate.get(), 150.0);
        assert_eq!(opacity.get(), 0.0);
    }
}
