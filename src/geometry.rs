//! Canvas-space primitives shared by every component.
//!
//! All coordinates are in layout units (unzoomed canvas space). Items are
//! axis-aligned rectangles anchored at their top-left corner; the canvas
//! grid is [`GRID_SIZE`] units and persisted positions sit on it.

use serde::{Deserialize, Serialize};

/// Grid step for item placement. Resolved drop positions are always
/// multiples of this.
pub const GRID_SIZE: f32 = 20.0;

/// Default footprint width for a node that has not been measured yet.
pub const NODE_WIDTH: f32 = 200.0;

/// Default footprint height for a node that has not been measured yet.
pub const NODE_HEIGHT: f32 = 80.0;

/// Stickies have a fixed width; their height follows their content.
pub const STICKY_WIDTH: f32 = 200.0;

/// Height used for a sticky with neither a measurement nor a recorded
/// content height.
pub const STICKY_FALLBACK_HEIGHT: f32 = 160.0;

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids the sqrt when only
    /// comparing against a threshold).
    pub fn dist_sq(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

/// Width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a rect from a top-left anchor and a size.
    pub fn from_position(position: Point, size: Size) -> Self {
        Self {
            left: position.x,
            top: position.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    /// Top-left corner as a point.
    pub fn position(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True when the point lies inside the rect (edges count as inside).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    /// True when the two rects share any positive area.
    ///
    /// All four comparisons are strict, so rects that merely share an edge
    /// or a corner do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }

    /// True when the rect cannot anchor a connection endpoint: an element
    /// that exists but has not been laid out yet reports a zero extent.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Smallest multiple of [`GRID_SIZE`] at or above `value`.
pub fn snap_up(value: f32) -> f32 {
    (value / GRID_SIZE).ceil() * GRID_SIZE
}

/// Nearest multiple of [`GRID_SIZE`] to `value`.
pub fn snap_round(value: f32) -> f32 {
    (value / GRID_SIZE).round() * GRID_SIZE
}
