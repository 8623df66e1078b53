//! Core types for spark-motion.
//!
//! Geometry and element flags shared by the state systems. Coordinates are
//! page pixels as reported by the host's pointer and layout sources.

// =============================================================================
// Point
// =============================================================================

/// A 2D point or displacement in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The origin, also the "no displacement" vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Scale both components by `factor`.
    pub fn scale(self, factor: f32) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from origin and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center of the box.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the box has no area (not laid out yet, or collapsed).
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Grow the box outward by the given per-edge amounts.
    pub fn expand(&self, top: f32, right: f32, bottom: f32, left: f32) -> Rect {
        Rect::new(
            self.x - left,
            self.y - top,
            self.width + left + right,
            self.height + top + bottom,
        )
    }

    /// True when the two boxes overlap or touch.
    ///
    /// Touching counts so a zero-height region sitting on the viewport
    /// edge still reports as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    /// Point containment, edges inclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }
}

// =============================================================================
// Interactive flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Marks an element as interactive for the custom cursor.
    ///
    /// Combine with bitwise OR: `Interactive::LINK | Interactive::HOVER_TARGET`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Interactive: u8 {
        const NONE = 0;
        const LINK = 1 << 0;
        const BUTTON = 1 << 1;
        /// Explicitly marked hover target (neither link nor button).
        const HOVER_TARGET = 1 << 2;
        /// Control that follows the pointer while hovered.
        const MAGNETIC = 1 << 3;
    }
}

impl Interactive {
    /// Flags that make the cursor switch to its hover appearance.
    pub const HOVERABLE: Self = Self::LINK.union(Self::BUTTON).union(Self::HOVER_TARGET);

    /// True when the cursor should treat this element as interactive.
    pub fn is_hoverable(self) -> bool {
        self.intersects(Self::HOVERABLE)
    }
}
