//! Nodal solution fields.
//!
//! Values are stored node-major: `values[node * n_variables + var]`.

use crate::debug_invariants::DebugInvariants;
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use serde::{Deserialize, Serialize};

/// Named scalar variables sampled at every mesh node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    variable_names: Vec<String>,
    n_nodes: usize,
    values: Vec<f64>,
}

impl Field {
    /// Zero-initialised field.
    pub fn new(n_nodes: usize, variable_names: Vec<String>) -> Self {
        let values = vec![0.0; n_nodes * variable_names.len()];
        Self {
            variable_names,
            n_nodes,
            values,
        }
    }

    /// Wrap existing node-major values.
    pub fn from_values(
        n_nodes: usize,
        variable_names: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self, MeshGeomError> {
        let expected = n_nodes * variable_names.len();
        if values.len() != expected {
            return Err(MeshGeomError::FieldSizeMismatch {
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            variable_names,
            n_nodes,
            values,
        })
    }

    /// Sample `f(point, var)` at every node of `mesh`.
    pub fn from_fn<F>(mesh: &Mesh, variable_names: Vec<String>, mut f: F) -> Self
    where
        F: FnMut(&Point, usize) -> f64,
    {
        let n_vars = variable_names.len();
        let mut values = Vec::with_capacity(mesh.n_nodes() * n_vars);
        for node in mesh.nodes() {
            for var in 0..n_vars {
                values.push(f(&node.point, var));
            }
        }
        Self {
            variable_names,
            n_nodes: mesh.n_nodes(),
            values,
        }
    }

    /// A zero field with the same shape and names as `self`.
    pub fn zeros_like(&self) -> Self {
        Self::new(self.n_nodes, self.variable_names.clone())
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn n_variables(&self) -> usize {
        self.variable_names.len()
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_names.iter().position(|n| n == name)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of `var` at `node`. Panics if either index is out of range.
    #[inline]
    pub fn value(&self, node: usize, var: usize) -> f64 {
        debug_assert!(var < self.n_variables());
        self.values[node * self.n_variables() + var]
    }

    pub fn try_value(&self, node: usize, var: usize) -> Result<f64, MeshGeomError> {
        self.check_variable(var)?;
        if node >= self.n_nodes {
            return Err(MeshGeomError::InvalidNodeIndex {
                elem_type: crate::topology::elem_type::ElemType::NodeElem,
                index: node,
                n_nodes: self.n_nodes,
            });
        }
        Ok(self.value(node, var))
    }

    #[inline]
    pub fn set(&mut self, node: usize, var: usize, value: f64) {
        let n_vars = self.n_variables();
        self.values[node * n_vars + var] = value;
    }

    /// All variables at `node`.
    pub fn node_values(&self, node: usize) -> &[f64] {
        let n_vars = self.n_variables();
        &self.values[node * n_vars..(node + 1) * n_vars]
    }

    /// Values of `var` gathered at `nodes`.
    pub fn gather(&self, var: usize, nodes: &[usize]) -> Vec<f64> {
        nodes.iter().map(|&n| self.value(n, var)).collect()
    }

    pub fn check_variable(&self, var: usize) -> Result<(), MeshGeomError> {
        if var < self.n_variables() {
            Ok(())
        } else {
            Err(MeshGeomError::InvalidVariableIndex {
                index: var,
                n_variables: self.n_variables(),
            })
        }
    }

    /// Fail unless the field has one entry per node of `mesh`.
    pub fn check_mesh(&self, mesh: &Mesh) -> Result<(), MeshGeomError> {
        if self.n_nodes == mesh.n_nodes() {
            Ok(())
        } else {
            Err(MeshGeomError::FieldSizeMismatch {
                expected: mesh.n_nodes() * self.n_variables(),
                found: self.values.len(),
            })
        }
    }

    /// Largest absolute value of `var`.
    pub fn max_abs(&self, var: usize) -> f64 {
        (0..self.n_nodes)
            .map(|n| self.value(n, var).abs())
            .fold(0.0, f64::max)
    }
}

impl DebugInvariants for Field {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Field");
    }

    fn validate_invariants(&self) -> Result<(), MeshGeomError> {
        let expected = self.n_nodes * self.n_variables();
        if self.values.len() != expected {
            return Err(MeshGeomError::FieldSizeMismatch {
                expected,
                found: self.values.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_major_layout() {
        let mut f = Field::new(3, vec!["u".into(), "v".into()]);
        f.set(1, 1, 4.0);
        assert_eq!(f.values()[3], 4.0);
        assert_eq!(f.node_values(1), &[0.0, 4.0]);
        assert_eq!(f.variable_index("v"), Some(1));
        assert_eq!(
            f.try_value(0, 2),
            Err(MeshGeomError::InvalidVariableIndex {
                index: 2,
                n_variables: 2
            })
        );
    }

    #[test]
    fn size_is_checked() {
        assert_eq!(
            Field::from_values(2, vec!["u".into()], vec![1.0]),
            Err(MeshGeomError::FieldSizeMismatch {
                expected: 2,
                found: 1
            })
        );
    }
}
