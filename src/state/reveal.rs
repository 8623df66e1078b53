//! Reveal Triggers - One-shot viewport visibility per region
//!
//! Each bound region owns a [`ViewportTrigger`] holding a
//! `Signal<RevealState>`. It starts `Unseen` and flips to `Revealed` the
//! first time the observation service reports the region intersecting the
//! viewport (expanded by a [`RootMargin`], so it fires slightly early).
//! `Revealed` is terminal: scrolling away does not re-arm it.
//!
//! # Pattern
//!
//! - [`IntersectionSource`] is the external observation service
//! - [`RevealObserver`] binds regions, routes entries, and stops observing a
//!   region as soon as it reveals
//! - [`GeometrySource`] computes entries from layout rectangles for hosts
//!   without a native observer
//!
//! # Example
//!
//! ```ignore
//! use spark_motion::state::reveal::{GeometrySource, RevealObserver, RootMargin};
//!
//! let mut observer = RevealObserver::new(GeometrySource::new(viewport), RootMargin::default());
//! let trigger = observer.bind(region_index);
//! observer.source_mut().set_region_bounds(region_index, rect);
//! observer.refresh();
//! if trigger.is_revealed() { /* start animations */ }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use spark_signals::{signal, Signal};
use tracing::trace;

use crate::types::Rect;

// =============================================================================
// TYPES
// =============================================================================

/// Index of an observed region (component index in the host's tree).
pub type RegionId = usize;

/// Default margin, in pixels, added to each viewport edge.
pub const DEFAULT_ROOT_MARGIN_PX: f32 = 50.0;

/// Reveal state of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealState {
    #[default]
    Unseen,
    Revealed,
}

impl RevealState {
    pub fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed)
    }
}

/// Per-edge expansion of the viewport used for the intersection test.
///
/// Positive values grow the trigger zone beyond the visible viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootMargin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl RootMargin {
    pub const ZERO: Self = Self::uniform(0.0);

    pub const fn uniform(px: f32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// Apply to a viewport rectangle.
    pub fn expand(&self, viewport: &Rect) -> Rect {
        viewport.expand(self.top, self.right, self.bottom, self.left)
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::uniform(DEFAULT_ROOT_MARGIN_PX)
    }
}

/// One notification from the observation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub region: RegionId,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub const fn new(region: RegionId, is_intersecting: bool) -> Self {
        Self {
            region,
            is_intersecting,
        }
    }
}

/// The viewport-intersection observation service.
pub trait IntersectionSource {
    /// Start reporting entries for `region`.
    fn observe(&mut self, region: RegionId, margin: RootMargin);

    /// Stop reporting entries for `region`.
    fn unobserve(&mut self, region: RegionId);
}

// =============================================================================
// VIEWPORT TRIGGER
// =============================================================================

/// One-shot reveal state for a single region.
///
/// Cloning shares the underlying signal.
#[derive(Clone)]
pub struct ViewportTrigger {
    region: RegionId,
    state: Signal<RevealState>,
}

impl ViewportTrigger {
    pub fn new(region: RegionId) -> Self {
        Self {
            region,
            state: signal(RevealState::Unseen),
        }
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn state(&self) -> RevealState {
        self.state.get()
    }

    pub fn is_revealed(&self) -> bool {
        self.state().is_revealed()
    }

    /// Signal for binding views to the reveal state.
    pub fn state_signal(&self) -> Signal<RevealState> {
        self.state.clone()
    }

    /// Feed one notification. Returns true only on the Unseen -> Revealed
    /// transition; every other call is a no-op.
    pub fn on_intersection(&self, is_intersecting: bool) -> bool {
        if !is_intersecting || self.is_revealed() {
            return false;
        }
        self.state.set(RevealState::Revealed);
        true
    }
}

// =============================================================================
// REVEAL OBSERVER
// =============================================================================

/// Binds regions to an [`IntersectionSource`] and routes its entries.
pub struct RevealObserver<S: IntersectionSource> {
    source: S,
    margin: RootMargin,
    /// Bound triggers in registration (document) order
    triggers: Vec<ViewportTrigger>,
}

impl<S: IntersectionSource> RevealObserver<S> {
    pub fn new(source: S, margin: RootMargin) -> Self {
        Self {
            source,
            margin,
            triggers: Vec::new(),
        }
    }

    /// Bind `region` with the observer's default margin.
    ///
    /// Binding an already bound region returns its existing trigger.
    pub fn bind(&mut self, region: RegionId) -> ViewportTrigger {
        let margin = self.margin;
        self.bind_with_margin(region, margin)
    }

    /// Bind `region` with its own margin.
    pub fn bind_with_margin(&mut self, region: RegionId, margin: RootMargin) -> ViewportTrigger {
        if let Some(existing) = self.trigger(region) {
            return existing;
        }

        let trigger = ViewportTrigger::new(region);
        self.source.observe(region, margin);
        self.triggers.push(trigger.clone());
        trigger
    }

    /// Unbind `region` (its view is being torn down).
    ///
    /// Later entries for the region are ignored.
    pub fn unbind(&mut self, region: RegionId) {
        let Some(pos) = self.triggers.iter().position(|t| t.region() == region) else {
            return;
        };
        let trigger = self.triggers.remove(pos);
        // Revealed regions were already unobserved
        if !trigger.is_revealed() {
            self.source.unobserve(region);
        }
    }

    /// Unbind everything.
    pub fn dispose(&mut self) {
        for trigger in std::mem::take(&mut self.triggers) {
            if !trigger.is_revealed() {
                self.source.unobserve(trigger.region());
            }
        }
    }

    /// Route a batch of entries. Returns the regions revealed by this batch.
    pub fn notify<I>(&mut self, entries: I) -> Vec<RegionId>
    where
        I: IntoIterator<Item = IntersectionEntry>,
    {
        let mut revealed = Vec::new();
        for entry in entries {
            let Some(trigger) = self.trigger(entry.region) else {
                continue;
            };
            if trigger.on_intersection(entry.is_intersecting) {
                trace!(region = entry.region, "region revealed");
                self.source.unobserve(entry.region);
                revealed.push(entry.region);
            }
        }
        revealed
    }

    /// Trigger for a bound region.
    pub fn trigger(&self, region: RegionId) -> Option<ViewportTrigger> {
        self.triggers.iter().find(|t| t.region() == region).cloned()
    }

    pub fn is_bound(&self, region: RegionId) -> bool {
        self.triggers.iter().any(|t| t.region() == region)
    }

    pub fn bound_count(&self) -> usize {
        self.triggers.len()
    }

    pub fn margin(&self) -> RootMargin {
        self.margin
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl RevealObserver<GeometrySource> {
    /// Recompute intersections from layout and route the changes.
    pub fn refresh(&mut self) -> Vec<RegionId> {
        let entries = self.source.take_entries();
        self.notify(entries)
    }
}

// =============================================================================
// GEOMETRY SOURCE
// =============================================================================

/// Intersection source computed from rectangles.
///
/// The host feeds the viewport (in page coordinates) and region bounds
/// after layout; [`take_entries`](Self::take_entries) reports regions whose
/// intersecting state changed since the last call. A region's first report
/// is always delivered. Regions without bounds yet produce nothing.
#[derive(Debug, Default)]
pub struct GeometrySource {
    viewport: Rect,
    observed: Vec<(RegionId, RootMargin)>,
    bounds: HashMap<RegionId, Rect>,
    last: HashMap<RegionId, bool>,
}

impl GeometrySource {
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Move the viewport vertically, keeping its size.
    pub fn scroll_to(&mut self, offset_y: f32) {
        self.viewport.y = offset_y;
    }

    pub fn set_region_bounds(&mut self, region: RegionId, bounds: Rect) {
        self.bounds.insert(region, bounds);
    }

    pub fn is_observing(&self, region: RegionId) -> bool {
        self.observed.iter().any(|(r, _)| *r == region)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// True while layout bounds are held for `region`.
    pub fn has_bounds(&self, region: RegionId) -> bool {
        self.bounds.contains_key(&region)
    }

    /// Entries for observed regions whose state changed.
    pub fn take_entries(&mut self) -> Vec<IntersectionEntry> {
        let mut entries = Vec::new();
        for (region, margin) in &self.observed {
            let Some(bounds) = self.bounds.get(region) else {
                continue;
            };
            let zone = margin.expand(&self.viewport);
            let is_intersecting = zone.intersects(bounds);
            if self.last.get(region) != Some(&is_intersecting) {
                self.last.insert(*region, is_intersecting);
                entries.push(IntersectionEntry::new(*region, is_intersecting));
            }
        }
        entries
    }
}

impl IntersectionSource for GeometrySource {
    fn observe(&mut self, region: RegionId, margin: RootMargin) {
        if !self.is_observing(region) {
            self.observed.push((region, margin));
        }
    }

    fn unobserve(&mut self, region: RegionId) {
        self.observed.retain(|(r, _)| *r != region);
        self.bounds.remove(&region);
        self.last.remove(&region);
    }
}

// =============================================================================
// TESTS
// =============================================================================
