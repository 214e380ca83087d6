//! Element topology.
//!
//! - [`elem_type`]: the closed set of element types and their const tables
//! - [`elem`]: element instances, side/edge construction and containment
//! - [`connectivity`]: node orderings for output formats
//! - [`refine`]: embedding matrices and uniform refinement

pub mod connectivity;
pub mod elem;
pub mod elem_type;
pub mod refine;

pub use elem::{Elem, SideMode, SubElem};
pub use elem_type::ElemType;
