//! Page-coordinate rectangles.

use serde::{Deserialize, Serialize};

/// Raw `[x0, y0, x1, y1]` box as reported by a layout source. May be empty.
pub type BBox = [f32; 4];

/// Axis-aligned rectangle in page coordinates.
///
/// Always has positive width and height; constructors return `None` for
/// degenerate input instead of storing a zero-area rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Builds a rectangle, rejecting zero-area or non-finite input.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Option<Self> {
        let finite = x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite();
        if finite && x1 > x0 && y1 > y0 {
            Some(Self { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    pub fn from_bbox(bbox: &BBox) -> Option<Self> {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }
}

/// Accumulates the bounding box of a sequence of boxes.
#[derive(Debug, Clone, Copy)]
pub struct BoundsAccumulator {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Default for BoundsAccumulator {
    fn default() -> Self {
        Self {
            x0: f32::INFINITY,
            y0: f32::INFINITY,
            x1: f32::NEG_INFINITY,
            y1: f32::NEG_INFINITY,
        }
    }
}

impl BoundsAccumulator {
    pub fn add(&mut self, bbox: &BBox) {
        self.x0 = self.x0.min(bbox[0]);
        self.y0 = self.y0.min(bbox[1]);
        self.x1 = self.x1.max(bbox[2]);
        self.y1 = self.y1.max(bbox[3]);
    }

    /// `None` when nothing was added or the result has no area.
    pub fn finish(self) -> Option<Rect> {
        Rect::new(self.x0, self.y0, self.x1, self.y1)
    }
}
