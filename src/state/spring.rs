//! Damped Spring - Smoothed motion toward a target
//!
//! A small deterministic integrator: position and velocity pulled toward a
//! target by `stiffness`, slowed by `damping`. Used for the cursor dot and
//! ring and for magnetic controls.
//!
//! # Pattern
//!
//! - [`step`] is pure: `(state, target, config, dt) -> state`
//! - [`Spring`] / [`Spring2`] wrap it with a target for per-frame ticking
//! - Time is stepped in fixed 1ms substeps, so a long frame and many short
//!   frames covering the same span land on the same state
//!
//! # Example
//!
//! ```ignore
//! use spark_motion::state::spring::{Spring, SpringConfig};
//!
//! let mut spring = Spring::new(0.0, SpringConfig::SNAPPY);
//! spring.set_target(100.0);
//! spring.tick(16.0);
//! assert!(spring.position() > 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Point;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Integration substep in milliseconds.
pub const SUBSTEP_MS: f32 = 1.0;

/// Longest span a single [`step`] integrates. Larger deltas are clamped.
pub const MAX_STEP_MS: f32 = 1000.0;

/// Displacement below which a spring may count as settled.
pub const REST_DELTA: f32 = 0.01;

/// Speed (units/second) below which a spring may count as settled.
pub const REST_SPEED: f32 = 0.01;

// =============================================================================
// CONFIG
// =============================================================================

/// Spring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    /// Tight follower: reaches the target within a couple of frames.
    pub const SNAPPY: Self = Self {
        stiffness: 800.0,
        damping: 35.0,
        mass: 0.2,
    };

    /// Visibly lagging follower.
    pub const TRAILING: Self = Self {
        stiffness: 150.0,
        damping: 15.0,
        mass: 0.1,
    };

    /// Pointer-following controls.
    pub const MAGNETIC: Self = Self {
        stiffness: 150.0,
        damping: 15.0,
        mass: 0.1,
    };

    pub const fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::new(100.0, 10.0, 1.0)
    }
}

// =============================================================================
// PURE INTEGRATOR
// =============================================================================

/// Position and velocity (units per second) of one spring axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpringState {
    pub position: f32,
    pub velocity: f32,
}

impl SpringState {
    pub const fn at(position: f32) -> Self {
        Self {
            position,
            velocity: 0.0,
        }
    }

    /// True when close enough to `target` and slow enough to stop.
    pub fn is_at_rest(&self, target: f32) -> bool {
        (self.position - target).abs() < REST_DELTA && self.velocity.abs() < REST_SPEED
    }
}

/// Advance `state` toward `target` by `dt_ms` milliseconds.
///
/// Semi-implicit Euler in [`SUBSTEP_MS`] substeps; the remainder is stepped
/// as a final partial substep.
///
/// # Arguments
///
/// * `state` - Position and velocity before the step
/// * `target` - Rest position the spring pulls toward
/// * `config` - Stiffness, damping and mass. A non-positive mass is treated as 1
/// * `dt_ms` - Elapsed time, clamped to [`MAX_STEP_MS`]
///
/// # Returns
///
/// The advanced state, snapped exactly onto `target` once at rest.
/// Non-positive or non-finite `dt_ms` returns `state` unchanged.
pub fn step(state: SpringState, target: f32, config: &SpringConfig, dt_ms: f32) -> SpringState {
    if !dt_ms.is_finite() || dt_ms <= 0.0 {
        return state;
    }

    let mass = if config.mass > 0.0 { config.mass } else { 1.0 };
    let mut position = state.position;
    let mut velocity = state.velocity;
    let dt_ms = dt_ms.min(MAX_STEP_MS);
    let full_steps = (dt_ms / SUBSTEP_MS).floor() as u32;
    let partial_ms = dt_ms - full_steps as f32 * SUBSTEP_MS;

    let mut substep = |h_ms: f32| {
        let h = h_ms / 1000.0;
        let spring_force = -config.stiffness * (position - target);
        let damping_force = -config.damping * velocity;
        let acceleration = (spring_force + damping_force) / mass;

        velocity += acceleration * h;
        position += velocity * h;
    };

    for _ in 0..full_steps {
        substep(SUBSTEP_MS);
    }
    if partial_ms > 0.0 {
        substep(partial_ms);
    }

    let next = SpringState { position, velocity };
    // Snap once at rest so settled springs stop producing sub-pixel drift
    if next.is_at_rest(target) {
        SpringState::at(target)
    } else {
        next
    }
}

// =============================================================================
// SPRING (1D)
// =============================================================================

/// One-axis spring with a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    state: SpringState,
    target: f32,
    config: SpringConfig,
}

impl Spring {
    /// A spring resting at `initial`.
    pub fn new(initial: f32, config: SpringConfig) -> Self {
        Self {
            state: SpringState::at(initial),
            target: initial,
            config,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn position(&self) -> f32 {
        self.state.position
    }

    pub fn velocity(&self) -> f32 {
        self.state.velocity
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    /// Jump to `value` with no motion, target included.
    pub fn snap_to(&mut self, value: f32) {
        self.state = SpringState::at(value);
        self.target = value;
    }

    /// Advance by `dt_ms` and return the new position.
    pub fn tick(&mut self, dt_ms: f32) -> f32 {
        self.state = step(self.state, self.target, &self.config, dt_ms);
        self.state.position
    }

    pub fn is_settled(&self) -> bool {
        self.state.is_at_rest(self.target)
    }
}

// =============================================================================
// SPRING2 (2D)
// =============================================================================

/// Two independent axes sharing one config.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring2 {
    x: Spring,
    y: Spring,
}

impl Spring2 {
    pub fn new(initial: Point, config: SpringConfig) -> Self {
        Self {
            x: Spring::new(initial.x, config),
            y: Spring::new(initial.y, config),
        }
    }

    pub fn set_target(&mut self, target: Point) {
        self.x.set_target(target.x);
        self.y.set_target(target.y);
    }

    pub fn target(&self) -> Point {
        Point::new(self.x.target(), self.y.target())
    }

    pub fn position(&self) -> Point {
        Point::new(self.x.position(), self.y.position())
    }

    pub fn snap_to(&mut self, value: Point) {
        self.x.snap_to(value.x);
        self.y.snap_to(value.y);
    }

    pub fn tick(&mut self, dt_ms: f32) -> Point {
        Point::new(self.x.tick(dt_ms), self.y.tick(dt_ms))
    }

    pub fn is_settled(&self) -> bool {
        self.x.is_settled() && self.y.is_settled()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(spring: &mut Spring, frames: usize, dt_ms: f32) {
        for _ in 0..frames {
            spring.tick(dt_ms);
        }
    }

    #[test]
    fn test_step_zero_dt_is_identity() {
        let state = SpringState {
            position: 3.0,
            velocity: 2.0,
        };
        assert_eq!(step(state, 10.0, &SpringConfig::SNAPPY, 0.0), state);
        assert_eq!(step(state, 10.0, &SpringConfig::SNAPPY, -5.0), state);
        assert_eq!(step(state, 10.0, &SpringConfig::SNAPPY, f32::NAN), state);
    }

    #[test]
    fn test_step_is_deterministic() {
        let start = SpringState::at(0.0);
        let a = step(start, 100.0, &SpringConfig::TRAILING, 16.0);
        let b = step(start, 100.0, &SpringConfig::TRAILING, 16.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_step_frame_split_independent() {
        let start = SpringState::at(0.0);
        let one = step(start, 50.0, &SpringConfig::SNAPPY, 16.0);
        let mut two = step(start, 50.0, &SpringConfig::SNAPPY, 8.0);
        two = step(two, 50.0, &SpringConfig::SNAPPY, 8.0);
        assert!((one.position - two.position).abs() < 1e-3);
    }

    #[test]
    fn test_step_huge_dt_returns_finite() {
        let start = SpringState::at(0.0);
        let next = step(start, 100.0, &SpringConfig::SNAPPY, 33_554_432.0);
        assert!(next.position.is_finite());
        assert!(next.velocity.is_finite());
        // Clamped to the longest integrated span; a second of SNAPPY settles
        assert_eq!(next, SpringState::at(100.0));
    }

    #[test]
    fn test_step_clamps_to_max_step() {
        let start = SpringState::at(0.0);
        let capped = step(start, 100.0, &SpringConfig::default(), MAX_STEP_MS);
        let longer = step(start, 100.0, &SpringConfig::default(), MAX_STEP_MS * 60.0);
        assert_eq!(capped, longer);
    }

    #[test]
    fn test_spring_moves_toward_target() {
        let mut spring = Spring::new(0.0, SpringConfig::SNAPPY);
        spring.set_target(100.0);

        let first = spring.tick(16.0);
        assert!(first > 0.0);
        assert!(first < 100.0); // Smoothed, not snapped
    }

    #[test]
    fn test_spring_settles_on_target() {
        let mut spring = Spring::new(0.0, SpringConfig::TRAILING);
        spring.set_target(40.0);

        run(&mut spring, 300, 16.0);

        assert!(spring.is_settled());
        assert_eq!(spring.position(), 40.0);
    }

    #[test]
    fn test_snappy_leads_trailing() {
        let mut dot = Spring::new(0.0, SpringConfig::SNAPPY);
        let mut ring = Spring::new(0.0, SpringConfig::TRAILING);
        dot.set_target(100.0);
        ring.set_target(100.0);

        run(&mut dot, 3, 16.0);
        run(&mut ring, 3, 16.0);

        assert!(dot.position() > ring.position());
    }

    #[test]
    fn test_snap_to() {
        let mut spring = Spring::new(0.0, SpringConfig::SNAPPY);
        spring.set_target(100.0);
        spring.tick(16.0);

        spring.snap_to(5.0);
        assert_eq!(spring.position(), 5.0);
        assert_eq!(spring.target(), 5.0);
        assert_eq!(spring.velocity(), 0.0);
        assert!(spring.is_settled());
    }

    #[test]
    fn test_zero_mass_does_not_blow_up() {
        let config = SpringConfig::new(100.0, 10.0, 0.0);
        let next = step(SpringState::at(0.0), 10.0, &config, 16.0);
        assert!(next.position.is_finite());
    }

    #[test]
    fn test_spring2_axes_independent() {
        let mut spring = Spring2::new(Point::ZERO, SpringConfig::MAGNETIC);
        spring.set_target(Point::new(30.0, 0.0));

        let pos = spring.tick(16.0);
        assert!(pos.x > 0.0);
        assert_eq!(pos.y, 0.0);

        for _ in 0..300 {
            spring.tick(16.0);
        }
        assert!(spring.is_settled());
        assert_eq!(spring.position(), Point::new(30.0, 0.0));
    }
}
