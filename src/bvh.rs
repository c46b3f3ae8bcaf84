//! The LBVH facade: staged build pipeline and the finished structure.
//!
//! ```text
//! positions → scene bound (par reduce) → Morton keys (par map)
//!           → key sort (par sort) → topology (par per-node) → refit
//! ```
//!
//! Every stage is a rayon fork-join, so each one completes before the next
//! starts; stages never overlap. Only the refit stage races internally,
//! through the atomic box/counter protocol.

use glam::Vec3;
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::debug;

use crate::aabb::Aabb;
use crate::error::{Error, Result};
use crate::morton::morton3;
use crate::refit::refit;
use crate::tree::{build_topology, ChildRef, Node, INVALID_INDEX};

/// A built linear bounding volume hierarchy over point primitives.
///
/// For `T >= 2` primitives the tree has exactly `T` leaves and `T - 1`
/// internal nodes, with node 0 as the root. [`Lbvh::positions`] and
/// [`Lbvh::prim_ids`] are in *leaf order*: leaf `k` of the tree refers to
/// `positions()[k]` and reports `prim_ids()[k]` on a hit.
///
/// Degenerate inputs (`T <= 1`) produce an empty node array and
/// `root() == INVALID_INDEX`; traversal code should check
/// [`Lbvh::leaf_count`] and test the single primitive (if any) against
/// [`Lbvh::bounds`] directly.
///
/// Construction is single-shot: nothing is mutated after [`Lbvh::build`]
/// returns, and the instance exclusively owns all arrays.
#[derive(Debug)]
pub struct Lbvh {
    bounds: Aabb,
    root: u32,
    nodes: Vec<Node>,
    positions: Vec<Vec3>,
    prim_ids: Vec<u32>,
}

impl Lbvh {
    /// Build the hierarchy from positions and caller-visible primitive ids.
    ///
    /// Validates lengths and coordinate finiteness up front; a bad input is
    /// rejected before any stage runs.
    #[tracing::instrument(skip_all, fields(prim_count = positions.len()))]
    pub fn build(positions: Vec<Vec3>, prim_ids: Vec<u32>) -> Result<Self> {
        if positions.len() != prim_ids.len() {
            return Err(Error::LengthMismatch {
                positions: positions.len(),
                ids: prim_ids.len(),
            });
        }
        if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
            return Err(Error::NonFinitePosition { index });
        }

        let t = positions.len();
        let bounds = positions
            .par_iter()
            .map(|&p| Aabb::from_point(p))
            .reduce(|| Aabb::EMPTY, |a, b| a.union(&b));

        if t <= 1 {
            debug!(prim_count = t, "degenerate input, trivial tree");
            return Ok(Self {
                bounds,
                root: INVALID_INDEX,
                nodes: Vec::new(),
                positions,
                prim_ids,
            });
        }

        // combined sort keys: Morton code in the high half, original index
        // in the low half, so equal codes still sort (and compare in the
        // LCP math) as distinct keys
        let mut keys: Vec<u64> = positions
            .par_iter()
            .enumerate()
            .map(|(i, &p)| (morton3(bounds.normalize_point(p)) as u64) << 32 | i as u64)
            .collect();
        keys.par_sort_unstable();

        // reorder both arrays into leaf order once, so traversal indexes
        // them directly by leaf
        let positions: Vec<Vec3> = keys
            .par_iter()
            .map(|&k| positions[(k & 0xFFFF_FFFF) as usize])
            .collect();
        let prim_ids: Vec<u32> = keys
            .par_iter()
            .map(|&k| prim_ids[(k & 0xFFFF_FFFF) as usize])
            .collect();

        let mut topology = build_topology(&keys);
        refit(&mut topology, &positions);
        debug!(node_count = topology.nodes.len(), "hierarchy complete");

        Ok(Self {
            bounds,
            root: 0,
            nodes: topology.nodes,
            positions,
            prim_ids,
        })
    }

    /// Scene-wide bounding box.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Root node index; [`INVALID_INDEX`] for degenerate trees.
    #[inline]
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Internal nodes, `leaf_count() - 1` of them (empty when degenerate).
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Primitive positions in leaf order.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Caller-visible primitive ids in leaf order.
    #[inline]
    pub fn prim_ids(&self) -> &[u32] {
        &self.prim_ids
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.positions.len()
    }

    /// Visit every leaf reachable from the root, depth-first.
    ///
    /// Iterative with an inline stack; covers the degenerate single-leaf
    /// tree even though it has no nodes. Handy for consumers that need to
    /// enumerate structure without writing a ray traversal.
    pub fn for_each_leaf(&self, mut f: impl FnMut(u32)) {
        if self.nodes.is_empty() {
            if self.leaf_count() == 1 {
                f(0);
            }
            return;
        }
        let mut stack: SmallVec<[ChildRef; 64]> = SmallVec::new();
        stack.push(ChildRef::internal(self.root));
        while let Some(child) = stack.pop() {
            debug_assert!(!child.is_unset(), "sentinel in finished tree");
            if child.is_leaf() {
                f(child.index());
            } else {
                let node = &self.nodes[child.index() as usize];
                stack.push(node.right);
                stack.push(node.left);
            }
        }
    }
}
