//! Structural invariant checks for meshes, fields and spatial indices.

use crate::mesh_error::MeshGeomError;

/// Types whose internal consistency can be checked on demand.
pub trait DebugInvariants {
    /// Panic on a broken invariant in debug builds or with the
    /// `check-invariants` feature; no-op otherwise.
    fn debug_assert_invariants(&self);
    /// Check every invariant and report the first violation.
    fn validate_invariants(&self) -> Result<(), MeshGeomError>;
}

/// Run a fallible check and panic with context when invariant checking is
/// compiled in.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
