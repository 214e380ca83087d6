//! Algorithms over pairs of meshes.

pub mod field_transfer;

pub use field_transfer::{grid_to_grid, grid_to_grid_with_mapping, TransferOptions, TransferReport};
