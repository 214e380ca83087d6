//! Lagrange shape functions on the reference elements.
//!
//! Every supported element is a tensor product of 1D bases: linear and
//! quadratic Lagrange polynomials on `[-1, 1]` and, for infinite elements,
//! the radial mapping pair
//!
//! - base:  `-2v / (1 - v)`  (1 at `v = -1`, 0 at `v = 0`)
//! - outer: `(1 + v) / (1 - v)` (0 at `v = -1`, 1 at `v = 0`)
//!
//! which sum to one for every `v < 1` and grow without bound as `v -> 1`.

use crate::geometry::point::Point;
use crate::mesh_error::MeshGeomError;
use crate::topology::elem_type::{AxisKind, ElemType, Order};

/// Element type whose nodes carry the shape functions of `order` on `elem_type`.
fn basis_type(elem_type: ElemType, order: Order) -> Result<ElemType, MeshGeomError> {
    elem_type.n_shape_functions(order)?;
    Ok(match order {
        Order::First => elem_type.first_order_type(),
        Order::Second => elem_type,
    })
}

fn basis_1d(kind: AxisKind, idx: u8, x: f64) -> f64 {
    match (kind, idx) {
        (AxisKind::Linear, 0) => 0.5 * (1.0 - x),
        (AxisKind::Linear, _) => 0.5 * (1.0 + x),
        (AxisKind::Quadratic, 0) => 0.5 * x * (x - 1.0),
        (AxisKind::Quadratic, 1) => 0.5 * x * (x + 1.0),
        (AxisKind::Quadratic, _) => 1.0 - x * x,
        (AxisKind::Radial, 0) => -2.0 * x / (1.0 - x),
        (AxisKind::Radial, _) => (1.0 + x) / (1.0 - x),
    }
}

fn basis_1d_derivative(kind: AxisKind, idx: u8, x: f64) -> f64 {
    match (kind, idx) {
        (AxisKind::Linear, 0) => -0.5,
        (AxisKind::Linear, _) => 0.5,
        (AxisKind::Quadratic, 0) => x - 0.5,
        (AxisKind::Quadratic, 1) => x + 0.5,
        (AxisKind::Quadratic, _) => -2.0 * x,
        (AxisKind::Radial, 0) => -2.0 / ((1.0 - x) * (1.0 - x)),
        (AxisKind::Radial, _) => 2.0 / ((1.0 - x) * (1.0 - x)),
    }
}

/// Values of all shape functions of `order` at reference point `xi`.
pub fn shape_values(elem_type: ElemType, order: Order, xi: &Point) -> Result<Vec<f64>, MeshGeomError> {
    let basis = basis_type(elem_type, order)?;
    let kinds = basis.axis_kinds();
    let dim = basis.dim();
    Ok(basis
        .tensor_indices()
        .iter()
        .map(|idx| (0..dim).map(|a| basis_1d(kinds[a], idx[a], xi[a])).product())
        .collect())
}

/// Reference gradients `dN_i / dxi_a` of all shape functions; components
/// beyond the element dimension are zero.
pub fn shape_gradients(
    elem_type: ElemType,
    order: Order,
    xi: &Point,
) -> Result<Vec<[f64; 3]>, MeshGeomError> {
    let basis = basis_type(elem_type, order)?;
    let kinds = basis.axis_kinds();
    let dim = basis.dim();
    Ok(basis
        .tensor_indices()
        .iter()
        .map(|idx| {
            let mut grad = [0.0; 3];
            for (a, g) in grad.iter_mut().enumerate().take(dim) {
                *g = (0..dim)
                    .map(|b| {
                        if a == b {
                            basis_1d_derivative(kinds[b], idx[b], xi[b])
                        } else {
                            basis_1d(kinds[b], idx[b], xi[b])
                        }
                    })
                    .product();
            }
            grad
        })
        .collect())
}

/// Value of shape function `i` of `order` at `xi`.
pub fn shape_value(
    elem_type: ElemType,
    order: Order,
    i: usize,
    xi: &Point,
) -> Result<f64, MeshGeomError> {
    let values = shape_values(elem_type, order, xi)?;
    values
        .get(i)
        .copied()
        .ok_or(MeshGeomError::InvalidNodeIndex {
            elem_type,
            index: i,
            n_nodes: values.len(),
        })
}

/// Whether `xi` lies in the closed reference domain of `elem_type`, within `tol`.
///
/// Radial coordinates of infinite elements must additionally stay strictly
/// below 1, which represents the point at infinity.
pub fn on_reference_domain(xi: &Point, elem_type: ElemType, tol: f64) -> bool {
    let kinds = elem_type.axis_kinds();
    (0..elem_type.dim()).all(|a| {
        let x = xi[a];
        if !x.is_finite() || x < -1.0 - tol {
            return false;
        }
        match kinds[a] {
            AxisKind::Radial => x < 1.0,
            _ => x <= 1.0 + tol,
        }
    })
}

/// Interpolate nodal `values` at `xi` with the shape functions of `order`.
pub fn interpolate(
    elem_type: ElemType,
    order: Order,
    values: &[f64],
    xi: &Point,
) -> Result<f64, MeshGeomError> {
    let phi = shape_values(elem_type, order, xi)?;
    if values.len() < phi.len() {
        return Err(MeshGeomError::NodeCountMismatch {
            elem_type,
            expected: phi.len(),
            found: values.len(),
        });
    }
    Ok(phi.iter().zip(values).map(|(p, v)| p * v).sum())
}
