//! Reference-to-physical mappings for mesh elements.
//!
//! An element of type `t` with node positions `x_i` maps reference point `xi`
//! to `x(xi) = sum_i N_i(xi) x_i`, where `N_i` are the Lagrange shape functions
//! of the element's own order. [`LagrangeMap`] evaluates this map, its
//! Jacobian and its inverse; the inverse uses Newton iteration for volume
//! elements and Gauss-Newton (normal equations) for curves and surfaces
//! embedded in 3D.

pub mod fe_values;
pub mod quadrature;
pub mod shape;

pub use fe_values::FeValues;
pub use quadrature::QuadratureRule;
pub use shape::{interpolate, on_reference_domain, shape_gradients, shape_value, shape_values};

use crate::geometry::point::Point;
use crate::mesh_error::MeshGeomError;
use crate::topology::elem_type::{AxisKind, ElemType, Order};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-14;

/// Physical <-> reference coordinate maps and shape-function evaluation.
///
/// `points` always holds the physical positions of all `elem_type.n_nodes()`
/// nodes of one element, in local node order.
pub trait ReferenceMapping {
    /// Physical image of reference point `xi`.
    fn map(&self, elem_type: ElemType, points: &[Point], xi: &Point) -> Result<Point, MeshGeomError>;

    /// Reference coordinates of physical point `p`.
    ///
    /// `tol` is the convergence tolerance on the reference-space Newton step.
    /// Fails with [`MeshGeomError::InverseMapDiverged`] when the iteration
    /// does not converge or the Jacobian is singular.
    fn inverse_map(
        &self,
        elem_type: ElemType,
        points: &[Point],
        p: &Point,
        tol: f64,
    ) -> Result<Point, MeshGeomError>;

    /// Volume (or area, or length) scaling of the map at `xi`.
    fn jacobian_determinant(
        &self,
        elem_type: ElemType,
        points: &[Point],
        xi: &Point,
    ) -> Result<f64, MeshGeomError>;

    fn shape_value(
        &self,
        elem_type: ElemType,
        order: Order,
        i: usize,
        xi: &Point,
    ) -> Result<f64, MeshGeomError> {
        shape::shape_value(elem_type, order, i, xi)
    }

    fn on_reference_domain(&self, xi: &Point, elem_type: ElemType, tol: f64) -> bool {
        shape::on_reference_domain(xi, elem_type, tol)
    }
}

/// Isoparametric Lagrange map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LagrangeMap {
    /// Newton iterations before the inverse map gives up.
    pub max_iterations: usize,
}

impl Default for LagrangeMap {
    fn default() -> Self {
        Self { max_iterations: 30 }
    }
}

fn check_points(elem_type: ElemType, points: &[Point]) -> Result<(), MeshGeomError> {
    if points.len() == elem_type.n_nodes() {
        Ok(())
    } else {
        Err(MeshGeomError::NodeCountMismatch {
            elem_type,
            expected: elem_type.n_nodes(),
            found: points.len(),
        })
    }
}

/// Columns `dx/dxi_a` of the Jacobian, one per reference dimension.
pub fn jacobian(
    elem_type: ElemType,
    points: &[Point],
    xi: &Point,
) -> Result<Vec<Point>, MeshGeomError> {
    check_points(elem_type, points)?;
    let grads = shape::shape_gradients(elem_type, elem_type.default_order(), xi)?;
    let dim = elem_type.dim();
    let mut cols = vec![Point::zero(); dim];
    for (g, x) in grads.iter().zip(points) {
        for (a, col) in cols.iter_mut().enumerate() {
            *col += *x * g[a];
        }
    }
    Ok(cols)
}

/// Generalised determinant `sqrt(det(J^T J))`; the signed determinant for
/// volume elements.
fn determinant(cols: &[Point]) -> f64 {
    match cols.len() {
        0 => 1.0,
        1 => cols[0].norm(),
        2 => cols[0].cross(&cols[1]).norm(),
        _ => cols[0].dot(&cols[1].cross(&cols[2])),
    }
}

fn invert_3x3(m: [[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    if !det.is_finite() || det.abs() <= EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}

/// Least-squares solve of `J d = r` through the normal equations.
fn pull_back(cols: &[Point], r: &Point) -> Option<Point> {
    let mut d = Point::zero();
    match cols.len() {
        0 => {}
        1 => {
            let denom = cols[0].norm_sq();
            if denom <= EPS * EPS {
                return None;
            }
            d.x = cols[0].dot(r) / denom;
        }
        2 => {
            let a = cols[0].norm_sq();
            let b = cols[0].dot(&cols[1]);
            let c = cols[1].norm_sq();
            let det = a * c - b * b;
            if !det.is_finite() || det.abs() <= EPS * a.max(c) * a.max(c) {
                return None;
            }
            let r0 = cols[0].dot(r);
            let r1 = cols[1].dot(r);
            d.x = (c * r0 - b * r1) / det;
            d.y = (a * r1 - b * r0) / det;
        }
        _ => {
            // J is square: invert it directly
            let m = [
                [cols[0].x, cols[1].x, cols[2].x],
                [cols[0].y, cols[1].y, cols[2].y],
                [cols[0].z, cols[1].z, cols[2].z],
            ];
            let inv = invert_3x3(m)?;
            for (a, row) in inv.iter().enumerate() {
                d[a] = row[0] * r.x + row[1] * r.y + row[2] * r.z;
            }
        }
    }
    Some(d)
}

impl LagrangeMap {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    fn diverged(elem_type: ElemType, p: &Point, reason: impl Into<String>) -> MeshGeomError {
        MeshGeomError::InverseMapDiverged {
            elem_type,
            point: p.to_array(),
            reason: reason.into(),
        }
    }
}

impl ReferenceMapping for LagrangeMap {
    fn map(&self, elem_type: ElemType, points: &[Point], xi: &Point) -> Result<Point, MeshGeomError> {
        check_points(elem_type, points)?;
        let phi = shape::shape_values(elem_type, elem_type.default_order(), xi)?;
        Ok(phi
            .iter()
            .zip(points)
            .fold(Point::zero(), |acc, (w, x)| acc + *x * *w))
    }

    fn inverse_map(
        &self,
        elem_type: ElemType,
        points: &[Point],
        p: &Point,
        tol: f64,
    ) -> Result<Point, MeshGeomError> {
        check_points(elem_type, points)?;
        let dim = elem_type.dim();
        if dim == 0 {
            return Ok(Point::zero());
        }
        let kinds = elem_type.axis_kinds();
        let step_tol = tol.max(1e-12);
        let mut xi = Point::zero();
        for _ in 0..self.max_iterations {
            let x = self.map(elem_type, points, &xi)?;
            let cols = jacobian(elem_type, points, &xi)?;
            let delta = pull_back(&cols, &(x - *p))
                .ok_or_else(|| Self::diverged(elem_type, p, "singular Jacobian"))?;
            let mut next = xi - delta;
            for a in 0..dim {
                // the radial map blows up at v = 1; never step onto or past it
                if kinds[a] == AxisKind::Radial && next[a] >= 1.0 {
                    next[a] = 0.5 * (xi[a] + 1.0);
                }
            }
            if !next.to_array().iter().all(|c| c.is_finite()) {
                return Err(Self::diverged(elem_type, p, "non-finite iterate"));
            }
            let step = (next - xi).norm();
            xi = next;
            if step <= step_tol {
                return Ok(xi);
            }
            // far outside the element; no point iterating further
            if xi.to_array()[..dim].iter().any(|c| c.abs() > 1e6) {
                return Err(Self::diverged(elem_type, p, "iterate left the reference region"));
            }
        }
        Err(Self::diverged(
            elem_type,
            p,
            format!("no convergence after {} iterations", self.max_iterations),
        ))
    }

    fn jacobian_determinant(
        &self,
        elem_type: ElemType,
        points: &[Point],
        xi: &Point,
    ) -> Result<f64, MeshGeomError> {
        Ok(determinant(&jacobian(elem_type, points, xi)?))
    }
}
