//! Minimal axis-aligned geometry for the arrow router: a point, a
//! rectangle, and the two segment-intersection tests routing needs.
//! Kept deliberately small — no transforms, no unit abstraction — since
//! the router never needs anything beyond inflate-and-intersect.

use crate::FeaturePosition;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    #[must_use]
    pub fn from_position(position: &FeaturePosition) -> Self {
        Self {
            left: position.left,
            top: position.top,
            right: position.left + position.width,
            bottom: position.top + position.height,
        }
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub fn inflated(&self, margin: f64) -> Self {
        Self {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }

    /// Whether the horizontal segment at height `y` spanning `[x1, x2]`
    /// (in either order) crosses this rectangle's interior. A segment
    /// that only touches an edge does not count.
    #[must_use]
    pub fn intersects_horizontal_segment(&self, y: f64, x1: f64, x2: f64) -> bool {
        let (min_x, max_x) = (x1.min(x2), x1.max(x2));
        y > self.top && y < self.bottom && max_x > self.left && min_x < self.right
    }

    /// Whether the vertical segment at `x` spanning `[y1, y2]` crosses
    /// this rectangle's interior.
    #[must_use]
    pub fn intersects_vertical_segment(&self, x: f64, y1: f64, y2: f64) -> bool {
        let (min_y, max_y) = (y1.min(y2), y1.max(y2));
        x > self.left && x < self.right && max_y > self.top && min_y < self.bottom
    }
}
