//! Axis-aligned rectangle geometry shared by every entity
//!
//! A rectangle is defined by:
//! - pos: top-left corner (screen space, y grows downward)
//! - size: width and height (always treated as positive)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{CULL_MARGIN, FIELD_HEIGHT, FIELD_WIDTH};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size.abs()
    }

    /// Center point
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size.abs() * 0.5
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a0, a1) = (self.min(), self.max());
        let (b0, b1) = (other.min(), other.max());
        a0.x < b1.x && a1.x > b0.x && a0.y < b1.y && a1.y > b0.y
    }

    /// Check if a point is inside (inclusive of the top-left edge)
    pub fn contains_point(&self, point: Vec2) -> bool {
        let (lo, hi) = (self.min(), self.max());
        point.x >= lo.x && point.x < hi.x && point.y >= lo.y && point.y < hi.y
    }

    /// True while the top-left corner lies within the playfield plus the cull margin
    pub fn in_field(&self) -> bool {
        let c = self.pos;
        c.x > -CULL_MARGIN
            && c.x < FIELD_WIDTH + CULL_MARGIN
            && c.y > -CULL_MARGIN
            && c.y < FIELD_HEIGHT + CULL_MARGIN
    }
}

/// Clamp a top-left position so a body of `size` stays inside the playfield
pub fn clamp_to_field(pos: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.clamp(0.0, (FIELD_WIDTH - size.x).max(0.0)),
        pos.y.clamp(0.0, (FIELD_HEIGHT - size.y).max(0.0)),
    )
}
