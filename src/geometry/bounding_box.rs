//! Axis-aligned bounding boxes.

use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned box `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// An inverted box that any `include` turns into a valid one.
    pub fn empty() -> Self {
        Self {
            min: Point::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// Smallest box containing all `points`; `None` for an empty slice.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut bbox = Self::empty();
        let mut any = false;
        for p in points {
            bbox.include(p);
            any = true;
        }
        any.then_some(bbox)
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include(&mut self, p: &Point) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(self.min.min(&other.min), self.max.max(&other.max))
    }

    pub fn extent(&self) -> Point {
        self.max - self.min
    }

    pub fn center(&self) -> Point {
        (self.min + self.max) * 0.5
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    /// Grow the box by `amount` on every side.
    pub fn inflated(&self, amount: f64) -> BoundingBox {
        let pad = Point::new(amount, amount, amount);
        BoundingBox::new(self.min - pad, self.max + pad)
    }

    /// Point inclusion, closed, with absolute tolerance `tol`.
    pub fn contains_point(&self, p: &Point, tol: f64) -> bool {
        p.x >= self.min.x - tol
            && p.x <= self.max.x + tol
            && p.y >= self.min.y - tol
            && p.y <= self.max.y + tol
            && p.z >= self.min.z - tol
            && p.z <= self.max.z + tol
    }

    /// Closed-box overlap test.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Child box `octant` (0..8) of the halved box; bit 0 selects +x, bit 1
    /// selects +y and bit 2 selects +z.
    pub fn octant(&self, octant: usize) -> BoundingBox {
        debug_assert!(octant < 8);
        let c = self.center();
        let mut min = self.min;
        let mut max = c;
        for axis in 0..3 {
            if (octant >> axis) & 1 == 1 {
                min[axis] = c[axis];
                max[axis] = self.max[axis];
            }
        }
        BoundingBox::new(min, max)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}
