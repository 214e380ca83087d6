//! Per-element evaluation of shape functions and integration weights.

use crate::fe::quadrature::QuadratureRule;
use crate::fe::{shape, ReferenceMapping};
use crate::geometry::point::Point;
use crate::mesh_error::MeshGeomError;
use crate::topology::elem_type::ElemType;

/// Shape values, physical quadrature points and `JxW` on one element.
///
/// Call [`FeValues::reinit`] for every element; the Gauss rule for each
/// dimension is built once and reused.
#[derive(Clone, Debug)]
pub struct FeValues {
    quadrature_order: u32,
    rules: [Option<QuadratureRule>; 4],
    elem_type: Option<ElemType>,
    /// `phi[i][qp]`: shape function `i` at quadrature point `qp`.
    pub phi: Vec<Vec<f64>>,
    /// Quadrature weight times Jacobian determinant.
    pub jxw: Vec<f64>,
    /// Physical location of each quadrature point.
    pub xyz: Vec<Point>,
}

impl FeValues {
    pub fn new(quadrature_order: u32) -> Self {
        Self {
            quadrature_order,
            rules: [None, None, None, None],
            elem_type: None,
            phi: Vec::new(),
            jxw: Vec::new(),
            xyz: Vec::new(),
        }
    }

    pub fn quadrature_order(&self) -> u32 {
        self.quadrature_order
    }

    /// Element type of the last `reinit`.
    pub fn elem_type(&self) -> Option<ElemType> {
        self.elem_type
    }

    pub fn n_quadrature_points(&self) -> usize {
        self.jxw.len()
    }

    /// Evaluate on the element with node positions `points`, using the
    /// element's own (geometric) order for the shape functions.
    pub fn reinit<M: ReferenceMapping>(
        &mut self,
        mapping: &M,
        elem_type: ElemType,
        points: &[Point],
    ) -> Result<(), MeshGeomError> {
        let dim = elem_type.dim();
        let order = self.quadrature_order;
        let rule = self.rules[dim].get_or_insert_with(|| QuadratureRule::gauss(dim, order));

        let n_shapes = elem_type.n_shape_functions(elem_type.default_order())?;
        self.phi.clear();
        self.phi.resize(n_shapes, Vec::with_capacity(rule.n_points()));
        self.jxw.clear();
        self.xyz.clear();

        for (q, w) in rule.points.iter().zip(&rule.weights) {
            let values = shape::shape_values(elem_type, elem_type.default_order(), q)?;
            for (row, v) in self.phi.iter_mut().zip(values) {
                row.push(v);
            }
            self.xyz.push(mapping.map(elem_type, points, q)?);
            let det = mapping.jacobian_determinant(elem_type, points, q)?;
            self.jxw.push(w * det.abs());
        }
        self.elem_type = Some(elem_type);
        Ok(())
    }

    /// Interpolate nodal values at quadrature point `qp`.
    pub fn value_at(&self, nodal: &[f64], qp: usize) -> f64 {
        self.phi
            .iter()
            .zip(nodal)
            .map(|(row, v)| row[qp] * v)
            .sum()
    }
}
