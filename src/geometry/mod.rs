//! Geometric primitives for mesh-geom.
//!
//! Points and axis-aligned boxes; the element-level geometry (maps, volumes,
//! containment) lives in [`crate::fe`] and [`crate::topology`].

pub mod bounding_box;
pub mod point;

pub use bounding_box::BoundingBox;
pub use point::Point;
