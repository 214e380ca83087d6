//! Grid-to-grid comparison of nodal fields on two meshes.
//!
//! Given a coarse and a fine mesh covering the same domain and a nodal field
//! on each, [`grid_to_grid`] measures how far the coarse solution is from the
//! fine one:
//!
//! - an L2 error `sqrt(sum_e sum_q JxW_q (u_c(x_q) - u_f(x_q))^2)` over the
//!   Gauss points of every fine element, and
//! - a per-node difference field `u_c(x_n) - u_f(x_n)` for every variable.
//!
//! Coarse values are found by locating each point in the coarse mesh through
//! an [`Octree`] and interpolating with the coarse element's shape functions.
//! Successive points are usually in the same coarse element, so a
//! [`CoarseLocator`] rechecks the last element before asking the tree.

use crate::data::field::Field;
use crate::fe::{shape, FeValues, LagrangeMap, ReferenceMapping};
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use crate::octree::{Octree, OctreeOptions};
use crate::topology::elem::locate_in;
use serde::{Deserialize, Serialize};

/// Parameters of [`grid_to_grid`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferOptions {
    /// Variable whose L2 error is computed.
    pub variable_index: usize,
    /// Leaf capacity of the coarse octree.
    pub bin_size: usize,
    /// Polynomial degree integrated exactly by the Gauss rule.
    pub quadrature_order: u32,
    /// Reference-space containment tolerance.
    pub tolerance: f64,
    /// Factor applied to `tolerance` for the single retry after a failed lookup.
    pub retry_factor: f64,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            variable_index: 0,
            bin_size: 100,
            quadrature_order: 5,
            tolerance: 1e-6,
            retry_factor: 1e3,
        }
    }
}

/// Outcome of [`grid_to_grid`].
#[derive(Clone, Debug, PartialEq)]
pub struct TransferReport {
    pub l2_error: f64,
    /// `coarse - fine` at every fine node, shaped like the fine field.
    pub difference: Field,
    /// Non-empty leaves of the coarse octree.
    pub n_active_bins: usize,
    /// Queries that had to go to the octree.
    pub octree_lookups: usize,
    /// Queries answered by the cached element.
    pub cache_hits: usize,
}

#[derive(Clone, Debug)]
struct CachedElem {
    elem: usize,
    points: Vec<Point>,
}

/// Point location with a one-element cache in front of an [`Octree`].
///
/// The cache is plain loop state; parallel callers need one locator each.
#[derive(Debug)]
pub struct CoarseLocator<'t, 'm, M = LagrangeMap> {
    tree: &'t Octree<'m, M>,
    cached: Option<CachedElem>,
    tolerance: f64,
    retry_factor: f64,
    lookups: usize,
    cache_hits: usize,
}

impl<'t, 'm, M: ReferenceMapping> CoarseLocator<'t, 'm, M> {
    pub fn new(tree: &'t Octree<'m, M>, tolerance: f64, retry_factor: f64) -> Self {
        Self {
            tree,
            cached: None,
            tolerance,
            retry_factor,
            lookups: 0,
            cache_hits: 0,
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits
    }

    /// Id of the cached coarse element.
    pub fn cached_elem(&self) -> Option<usize> {
        self.cached.as_ref().map(|c| c.elem)
    }

    /// Coarse element containing `p` and the reference coordinates of `p`.
    pub fn locate(&mut self, p: &Point) -> Option<(usize, Point)> {
        let mesh = self.tree.mesh();
        if let Some(cached) = &self.cached {
            let elem_type = mesh.elem(cached.elem).elem_type;
            if let Some(xi) =
                locate_in(self.tree.mapping(), elem_type, &cached.points, p, self.tolerance)
            {
                self.cache_hits += 1;
                return Some((cached.elem, xi));
            }
        }
        self.lookups += 1;
        let hit = self.tree.locate(p, self.tolerance).or_else(|| {
            let widened = self.tolerance * self.retry_factor;
            log::warn!("no coarse element contains {p}; retrying with tolerance {widened:e}");
            self.tree.locate(p, widened)
        });
        match hit {
            Some((elem, xi)) => {
                log::trace!("cache miss at {p}: now in coarse element {elem}");
                self.cached = Some(CachedElem {
                    elem,
                    points: mesh.elem(elem).points(mesh),
                });
                Some((elem, xi))
            }
            None => {
                self.cached = None;
                None
            }
        }
    }

    /// Like [`CoarseLocator::locate`], failing with
    /// [`MeshGeomError::PointNotLocated`] described by `context`.
    pub fn require<F>(&mut self, p: &Point, context: F) -> Result<(usize, Point), MeshGeomError>
    where
        F: FnOnce() -> String,
    {
        self.locate(p).ok_or_else(|| MeshGeomError::PointNotLocated {
            point: p.to_array(),
            context: context(),
        })
    }
}

/// Coarse shape-function values at `xi` in coarse element `elem`.
fn coarse_shapes(coarse: &Mesh, elem: usize, xi: &Point) -> Result<Vec<f64>, MeshGeomError> {
    let t = coarse.elem(elem).elem_type;
    shape::shape_values(t, t.default_order(), xi)
}

fn check_inputs(
    coarse_mesh: &Mesh,
    coarse_field: &Field,
    fine_mesh: &Mesh,
    fine_field: &Field,
    options: &TransferOptions,
) -> Result<(), MeshGeomError> {
    if coarse_field.variable_names() != fine_field.variable_names() {
        return Err(MeshGeomError::VariableMismatch {
            coarse: coarse_field.variable_names().to_vec(),
            fine: fine_field.variable_names().to_vec(),
        });
    }
    coarse_field.check_variable(options.variable_index)?;
    coarse_field.check_mesh(coarse_mesh)?;
    fine_field.check_mesh(fine_mesh)?;
    if coarse_mesh.n_elem() == 0 || fine_mesh.n_elem() == 0 {
        return Err(MeshGeomError::EmptyMesh);
    }
    if let Some(elem) = fine_mesh.elems().iter().find(|e| e.is_infinite()) {
        return Err(MeshGeomError::InvalidGeometry(format!(
            "fine element {} is an infinite {}; the fine mesh must be finite",
            elem.id, elem.elem_type
        )));
    }
    Ok(())
}

/// Fine nodes in order of first appearance in the element connectivity.
fn nodes_in_visit_order(mesh: &Mesh) -> Vec<usize> {
    let mut visited = vec![false; mesh.n_nodes()];
    let mut order = Vec::with_capacity(mesh.n_nodes());
    for elem in mesh.elems() {
        for &n in &elem.nodes {
            if !visited[n] {
                visited[n] = true;
                order.push(n);
            }
        }
    }
    order
}

/// `coarse - fine` for every variable at one fine node.
fn node_difference<M: ReferenceMapping>(
    locator: &mut CoarseLocator<'_, '_, M>,
    coarse_mesh: &Mesh,
    coarse_field: &Field,
    fine_mesh: &Mesh,
    fine_field: &Field,
    node: usize,
) -> Result<Vec<f64>, MeshGeomError> {
    let p = fine_mesh.point(node);
    let (elem, xi) = locator.require(&p, || format!("fine node {}", fine_mesh.node(node).id))?;
    let phi = coarse_shapes(coarse_mesh, elem, &xi)?;
    let coarse_nodes = &coarse_mesh.elem(elem).nodes;
    Ok((0..fine_field.n_variables())
        .map(|var| {
            let c: f64 = phi
                .iter()
                .zip(coarse_nodes)
                .map(|(w, &n)| w * coarse_field.value(n, var))
                .sum();
            c - fine_field.value(node, var)
        })
        .collect())
}

/// Compare `fine_field` on `fine_mesh` against `coarse_field` on `coarse_mesh`
/// with the default [`LagrangeMap`].
///
/// The variable names of both fields must match; this is checked before any
/// point location happens. Only fine elements of the mesh dimension enter the
/// L2 sum, so boundary faces and point elements stored next to the volume
/// cells do not count. A point that no coarse element contains (even after
/// one retry with a wider tolerance) aborts the comparison with
/// [`MeshGeomError::PointNotLocated`]. Infinite fine elements are rejected.
pub fn grid_to_grid(
    coarse_mesh: &Mesh,
    coarse_field: &Field,
    fine_mesh: &Mesh,
    fine_field: &Field,
    options: &TransferOptions,
) -> Result<TransferReport, MeshGeomError> {
    grid_to_grid_with_mapping(
        coarse_mesh,
        coarse_field,
        fine_mesh,
        fine_field,
        options,
        LagrangeMap::default(),
    )
}

/// [`grid_to_grid`] with an explicit reference mapping, used both for the
/// fine Gauss points and for inverting coarse elements.
pub fn grid_to_grid_with_mapping<M: ReferenceMapping + Sync>(
    coarse_mesh: &Mesh,
    coarse_field: &Field,
    fine_mesh: &Mesh,
    fine_field: &Field,
    options: &TransferOptions,
    mapping: M,
) -> Result<TransferReport, MeshGeomError> {
    check_inputs(coarse_mesh, coarse_field, fine_mesh, fine_field, options)?;
    let var = options.variable_index;

    let octree_options = OctreeOptions {
        bin_size: options.bin_size,
        tolerance: options.tolerance,
        ..OctreeOptions::default()
    };
    let tree = Octree::with_options(coarse_mesh, octree_options, mapping)?;
    log::info!("coarse octree: {} active bins", tree.n_active_bins());

    // L2 error over the fine Gauss points, in element then point order
    let mut locator = CoarseLocator::new(&tree, options.tolerance, options.retry_factor);
    let mut fe = FeValues::new(options.quadrature_order);
    let mut sum = 0.0;
    let dim = fine_mesh.mesh_dimension();
    for elem in fine_mesh.elems().iter().filter(|e| e.dim() == dim) {
        let points = elem.points(fine_mesh);
        fe.reinit(tree.mapping(), elem.elem_type, &points)?;
        let fine_values = fine_field.gather(var, &elem.nodes);
        for qp in 0..fe.n_quadrature_points() {
            let fine_value = fe.value_at(&fine_values, qp);
            let (coarse_elem, xi) = locator.require(&fe.xyz[qp], || {
                format!("fine element {}, quadrature point {qp}", elem.id)
            })?;
            let phi = coarse_shapes(coarse_mesh, coarse_elem, &xi)?;
            let coarse_value: f64 = phi
                .iter()
                .zip(&coarse_mesh.elem(coarse_elem).nodes)
                .map(|(w, &n)| w * coarse_field.value(n, var))
                .sum();
            let diff = coarse_value - fine_value;
            sum += fe.jxw[qp] * diff * diff;
        }
    }
    let l2_error = sum.sqrt();
    let mut octree_lookups = locator.lookups();
    let mut cache_hits = locator.cache_hits();

    // per-node differences, each fine node once
    let order = nodes_in_visit_order(fine_mesh);
    let mut difference = fine_field.zeros_like();

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        let results: Vec<Result<(usize, Vec<f64>, usize, usize), MeshGeomError>> = order
            .par_iter()
            .map_init(
                || CoarseLocator::new(&tree, options.tolerance, options.retry_factor),
                |loc, &node| {
                    let (l0, h0) = (loc.lookups(), loc.cache_hits());
                    let diffs =
                        node_difference(loc, coarse_mesh, coarse_field, fine_mesh, fine_field, node)?;
                    Ok((node, diffs, loc.lookups() - l0, loc.cache_hits() - h0))
                },
            )
            .collect();
        for result in results {
            let (node, diffs, lookups, hits) = result?;
            octree_lookups += lookups;
            cache_hits += hits;
            for (v, d) in diffs.into_iter().enumerate() {
                difference.set(node, v, d);
            }
        }
    }

    #[cfg(not(feature = "rayon"))]
    {
        let mut locator = CoarseLocator::new(&tree, options.tolerance, options.retry_factor);
        for &node in &order {
            let diffs =
                node_difference(&mut locator, coarse_mesh, coarse_field, fine_mesh, fine_field, node)?;
            for (v, d) in diffs.into_iter().enumerate() {
                difference.set(node, v, d);
            }
        }
        octree_lookups += locator.lookups();
        cache_hits += locator.cache_hits();
    }

    log::info!("Computed error={l2_error}");
    Ok(TransferReport {
        l2_error,
        difference,
        n_active_bins: tree.n_active_bins(),
        octree_lookups,
        cache_hits,
    })
}
