//! Library context.
//!
//! Holds the settings shared by one comparison run (containment tolerance and
//! reference mapping) and forces the lazily computed refinement tables so
//! that no query pays for them later.

use crate::algs::field_transfer::TransferOptions;
use crate::fe::LagrangeMap;
use crate::topology::refine::init_embedding_tables;
use serde::{Deserialize, Serialize};

/// Default reference-space containment tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Context {
    tolerance: f64,
    mapping: LagrangeMap,
}

impl Context {
    pub fn init() -> Self {
        init_embedding_tables();
        log::debug!("mesh-geom context initialised (tolerance {DEFAULT_TOLERANCE:e})");
        Self {
            tolerance: DEFAULT_TOLERANCE,
            mapping: LagrangeMap::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_mapping(mut self, mapping: LagrangeMap) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn mapping(&self) -> &LagrangeMap {
        &self.mapping
    }

    /// Transfer options for `variable_index` using this context's tolerance.
    pub fn transfer_options(&self, variable_index: usize) -> TransferOptions {
        TransferOptions {
            variable_index,
            tolerance: self.tolerance,
            ..TransferOptions::default()
        }
    }

    pub fn close(self) {
        log::debug!("mesh-geom context closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::elem_type::ElemType;
    use crate::topology::refine::embedding_matrix;

    #[test]
    fn init_makes_tables_available() {
        let ctx = Context::init().with_tolerance(1e-8);
        assert_eq!(ctx.tolerance(), 1e-8);
        assert_eq!(ctx.transfer_options(2).variable_index, 2);
        assert_eq!(ctx.transfer_options(0).tolerance, 1e-8);
        assert!(embedding_matrix(ElemType::Hex27, 7).is_ok());
        ctx.close();
    }
}
