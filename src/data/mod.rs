//! Data attached to meshes.

pub mod field;

pub use field::Field;
