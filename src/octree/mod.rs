//! Octree point location over the elements of a mesh.
//!
//! Bins live in one arena (`Vec<Bin>`); internal bins store the arena indices
//! of their eight octants (bit 0 = +x, bit 1 = +y, bit 2 = +z), leaves store
//! element indices. An element is filed under every leaf its node bounding
//! box overlaps, so a query only has to visit the leaves whose box contains
//! the query point.
//!
//! The tree borrows the mesh and is immutable after construction; queries
//! take `&self` and can run from several threads at once.

use crate::debug_invariants::DebugInvariants;
use crate::fe::{LagrangeMap, ReferenceMapping};
use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use crate::topology::elem::locate_in;
use serde::{Deserialize, Serialize};

/// Build parameters of an [`Octree`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeOptions {
    /// A leaf holding more elements than this is split.
    pub bin_size: usize,
    /// Bins at this depth are never split.
    pub max_depth: usize,
    /// Reference-space tolerance used by [`Octree::find_element`].
    pub tolerance: f64,
    /// Relative padding of the root box and of each element box.
    pub padding: f64,
    /// A bin whose diagonal is below this fraction of the diagonal of its
    /// smallest element is never split.
    pub min_bin_fraction: f64,
}

impl Default for OctreeOptions {
    fn default() -> Self {
        Self {
            bin_size: 100,
            max_depth: 12,
            tolerance: 1e-6,
            padding: 1e-3,
            min_bin_fraction: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum BinKind {
    Leaf(Vec<usize>),
    Internal([usize; 8]),
}

#[derive(Clone, Debug, PartialEq)]
struct Bin {
    bbox: BoundingBox,
    depth: usize,
    kind: BinKind,
}

/// Spatial index over the elements of one mesh.
#[derive(Debug)]
pub struct Octree<'m, M = LagrangeMap> {
    mesh: &'m Mesh,
    mapping: M,
    options: OctreeOptions,
    bins: Vec<Bin>,
    elem_boxes: Vec<BoundingBox>,
    /// Infinite elements, whose node box does not bound them.
    unbounded: Vec<usize>,
    /// Absolute slack for point-in-bin tests.
    box_tol: f64,
}

impl<'m> Octree<'m, LagrangeMap> {
    /// Index `mesh` with leaves of at most `bin_size` elements where possible.
    pub fn build(mesh: &'m Mesh, bin_size: usize) -> Result<Self, MeshGeomError> {
        let options = OctreeOptions {
            bin_size,
            ..OctreeOptions::default()
        };
        Self::with_options(mesh, options, LagrangeMap::default())
    }
}

impl<'m, M: ReferenceMapping> Octree<'m, M> {
    pub fn with_options(
        mesh: &'m Mesh,
        options: OctreeOptions,
        mapping: M,
    ) -> Result<Self, MeshGeomError> {
        if mesh.n_elem() == 0 {
            return Err(MeshGeomError::EmptyMesh);
        }
        if options.bin_size == 0 {
            return Err(MeshGeomError::InvalidGeometry(
                "octree bin_size must be at least 1".into(),
            ));
        }
        let mesh_box = mesh.bounding_box().ok_or(MeshGeomError::EmptyMesh)?;
        let diag = mesh_box.diagonal();
        let box_tol = (options.padding * diag).max(f64::EPSILON * (1.0 + diag));
        let root_box = mesh_box.inflated(box_tol);

        let elem_boxes: Vec<BoundingBox> = mesh
            .elems()
            .iter()
            .map(|e| {
                let b = e.bounding_box(mesh);
                b.inflated(options.padding * b.diagonal() + f64::EPSILON)
            })
            .collect();
        let unbounded = mesh
            .elems()
            .iter()
            .filter(|e| e.is_infinite())
            .map(|e| e.id)
            .collect();

        let mut tree = Self {
            mesh,
            mapping,
            options,
            bins: vec![Bin {
                bbox: root_box,
                depth: 0,
                kind: BinKind::Leaf((0..mesh.n_elem()).collect()),
            }],
            elem_boxes,
            unbounded,
            box_tol,
        };
        tree.subdivide();
        log::debug!(
            "octree over {} elements: {} bins, {} active, depth {}",
            mesh.n_elem(),
            tree.n_bins(),
            tree.n_active_bins(),
            tree.depth()
        );
        crate::debug_invariants!(tree.validate_invariants(), "Octree::with_options");
        Ok(tree)
    }

    /// Split overfull leaves until every leaf fits, hits `max_depth`, shrinks
    /// below its smallest element, or no octant would hold fewer elements than
    /// its parent.
    fn subdivide(&mut self) {
        let mut stack = vec![0usize];
        while let Some(b) = stack.pop() {
            let (bbox, depth, elems) = match &self.bins[b] {
                Bin {
                    bbox,
                    depth,
                    kind: BinKind::Leaf(elems),
                } => (*bbox, *depth, elems),
                _ => continue,
            };
            if elems.len() <= self.options.bin_size || depth >= self.options.max_depth {
                continue;
            }
            // padded neighbours overlap, so shared faces never empty out
            let smallest = elems
                .iter()
                .map(|&e| self.elem_boxes[e].diagonal())
                .fold(f64::INFINITY, f64::min);
            if bbox.diagonal() < self.options.min_bin_fraction * smallest {
                log::trace!(
                    "bin {b} not split: diagonal {} below its smallest element",
                    bbox.diagonal()
                );
                continue;
            }
            let octants: Vec<(BoundingBox, Vec<usize>)> = (0..8)
                .map(|o| {
                    let child_box = bbox.octant(o);
                    let members = elems
                        .iter()
                        .copied()
                        .filter(|&e| self.elem_boxes[e].intersects(&child_box))
                        .collect();
                    (child_box, members)
                })
                .collect();
            if octants.iter().all(|(_, m)| m.len() >= elems.len()) {
                log::trace!("bin {b} not split: no octant reduces its {} elements", elems.len());
                continue;
            }
            let first = self.bins.len();
            let mut children = [0usize; 8];
            for (o, (child_box, members)) in octants.into_iter().enumerate() {
                children[o] = first + o;
                self.bins.push(Bin {
                    bbox: child_box,
                    depth: depth + 1,
                    kind: BinKind::Leaf(members),
                });
                stack.push(first + o);
            }
            self.bins[b].kind = BinKind::Internal(children);
        }
    }

    pub fn mesh(&self) -> &'m Mesh {
        self.mesh
    }

    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    pub fn options(&self) -> &OctreeOptions {
        &self.options
    }

    /// Box of the root bin.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bins[0].bbox
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Leaves holding at least one element.
    pub fn n_active_bins(&self) -> usize {
        self.bins
            .iter()
            .filter(|b| matches!(&b.kind, BinKind::Leaf(e) if !e.is_empty()))
            .count()
    }

    /// Depth of the deepest bin (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.bins.iter().map(|b| b.depth).max().unwrap_or(0)
    }

    /// Sorted, deduplicated elements of every leaf whose box holds `p`.
    pub fn candidates(&self, p: &Point) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(b) = stack.pop() {
            let bin = &self.bins[b];
            if !bin.bbox.contains_point(p, self.box_tol) {
                continue;
            }
            match &bin.kind {
                BinKind::Leaf(elems) => out.extend_from_slice(elems),
                BinKind::Internal(children) => stack.extend_from_slice(children),
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Element containing `p` (default tolerance), if any.
    pub fn find_element(&self, p: &Point) -> Option<usize> {
        self.find_element_with_tol(p, self.options.tolerance)
    }

    pub fn find_element_with_tol(&self, p: &Point, tol: f64) -> Option<usize> {
        self.locate(p, tol).map(|(e, _)| e)
    }

    /// Containing element and the reference coordinates of `p` in it.
    ///
    /// Candidates are tried in ascending element order; infinite elements not
    /// reached through the bins are tried last.
    pub fn locate(&self, p: &Point, tol: f64) -> Option<(usize, Point)> {
        let candidates = self.candidates(p);
        let hit = candidates
            .iter()
            .copied()
            .chain(
                self.unbounded
                    .iter()
                    .copied()
                    .filter(|e| candidates.binary_search(e).is_err()),
            )
            .find_map(|e| {
                let elem = self.mesh.elem(e);
                let points = elem.points(self.mesh);
                locate_in(&self.mapping, elem.elem_type, &points, p, tol).map(|xi| (e, xi))
            });
        if hit.is_none() {
            log::trace!("no element contains {p} ({} candidates)", candidates.len());
        }
        hit
    }
}

impl<M: ReferenceMapping> DebugInvariants for Octree<'_, M> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Octree");
    }

    fn validate_invariants(&self) -> Result<(), MeshGeomError> {
        for (i, bin) in self.bins.iter().enumerate() {
            if let BinKind::Internal(children) = &bin.kind {
                for &c in children {
                    let child = self.bins.get(c).ok_or_else(|| {
                        MeshGeomError::InvalidGeometry(format!("bin {i} has dangling child {c}"))
                    })?;
                    if child.depth != bin.depth + 1 {
                        return Err(MeshGeomError::InvalidGeometry(format!(
                            "bin {c} has depth {} under bin {i} at depth {}",
                            child.depth, bin.depth
                        )));
                    }
                }
            }
        }
        for (e, ebox) in self.elem_boxes.iter().enumerate() {
            let mut stack = vec![0usize];
            let mut reached = false;
            while let Some(b) = stack.pop() {
                let bin = &self.bins[b];
                if !bin.bbox.intersects(ebox) {
                    continue;
                }
                match &bin.kind {
                    BinKind::Leaf(elems) => reached |= elems.binary_search(&e).is_ok(),
                    BinKind::Internal(children) => stack.extend_from_slice(children),
                }
            }
            if !reached {
                return Err(MeshGeomError::InvalidGeometry(format!(
                    "element {e} is not reachable from the octree root"
                )));
            }
        }
        Ok(())
    }
}
