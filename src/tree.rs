//! Radix-tree topology construction.
//!
//! Derives the binary hierarchy directly from sorted spatial keys, one
//! internal node per task with no inter-node dependencies, so the whole
//! pass is a single parallel-for. Follows the radix-tree formulation of
//! "Thinking Parallel, Part III" / Karras 2012: node `i` owns a contiguous
//! leaf range determined by comparing longest-common-prefix lengths of
//! adjacent keys.
//!
//! Keys here are 64-bit combined values, `(morton << 32) | original_index`,
//! strictly increasing in sorted order. Equal Morton codes therefore still
//! produce distinct keys and the LCP math needs no special tie handling.

use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::aabb::Aabb;
use crate::search::{max_true, probe_bound};

/// Reserved all-ones sentinel for "no index". Never present in a finished
/// tree's child references.
pub const INVALID_INDEX: u32 = u32::MAX;

/// Tagged child reference: a 32-bit index with the least significant bit
/// distinguishing leaves (1, index into leaf order) from internal nodes
/// (0, index into the node array).
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct ChildRef(u32);

impl ChildRef {
    /// All-ones sentinel; check [`ChildRef::is_unset`] before the tag bit.
    pub const UNSET: Self = Self(u32::MAX);

    #[inline]
    pub fn leaf(index: u32) -> Self {
        Self(index << 1 | 1)
    }

    #[inline]
    pub fn internal(index: u32) -> Self {
        Self(index << 1)
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        self.0 & 1 == 1
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0 >> 1
    }

    #[inline]
    pub fn is_unset(self) -> bool {
        self.0 == u32::MAX
    }
}

/// One internal hierarchy node: bounding box plus two tagged children.
/// 32 bytes, `Pod`, so a finished node array can be uploaded as raw bytes.
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Node {
    pub aabb: Aabb,
    pub left: ChildRef,
    pub right: ChildRef,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            aabb: Aabb::EMPTY,
            left: ChildRef::UNSET,
            right: ChildRef::UNSET,
        }
    }
}

/// Topology output: `T - 1` nodes plus the parent links the refit pass
/// walks upward. The root is always node 0 and has no parent entry
/// (`node_parent[0] == INVALID_INDEX`).
pub struct Topology {
    pub nodes: Vec<Node>,
    /// Parent node index per leaf (sorted order).
    pub leaf_parent: Vec<u32>,
    /// Parent node index per internal node; `INVALID_INDEX` for the root.
    pub node_parent: Vec<u32>,
}

/// LCP length of the keys at sorted positions `i` and `j`, or -1 when `j`
/// is out of bounds (an out-of-range neighbor is infinitely dissimilar).
#[inline]
fn delta(keys: &[u64], i: usize, j: isize) -> i32 {
    if j < 0 || j >= keys.len() as isize {
        return -1;
    }
    // i == j gives 64: a key shares its full prefix with itself
    (keys[i] ^ keys[j as usize]).leading_zeros() as i32
}

/// Determine node `i`'s children from the sorted keys alone.
///
/// Range end via exponential probe + binary refinement, split position via
/// a second binary search against the range's own LCP. Returns
/// `(left, right)` child references with the leaf tag already applied.
fn link_node(keys: &[u64], i: usize) -> (ChildRef, ChildRef) {
    let ii = i as isize;

    // growth direction: toward the more similar neighbor
    let d = (delta(keys, i, ii + 1) - delta(keys, i, ii - 1)).signum() as isize;
    debug_assert!(d != 0, "duplicate combined keys");

    // everything inside the range shares a strictly longer prefix than the
    // neighbor just outside it
    let delta_min = delta(keys, i, ii - d);
    let bound = probe_bound(|k| delta(keys, i, ii + k as isize * d) > delta_min);
    let len = max_true(bound, |k| delta(keys, i, ii + k as isize * d) > delta_min);
    let j = ii + len as isize * d;

    // split where the LCP with i first drops to the range-wide LCP
    let delta_node = delta(keys, i, j);
    let s = max_true(len, |k| delta(keys, i, ii + k as isize * d) > delta_node);
    let split = (ii + s as isize * d + d.min(0)) as usize;

    let lo = i.min(j as usize);
    let hi = i.max(j as usize);

    let left = if lo == split {
        ChildRef::leaf(split as u32)
    } else {
        ChildRef::internal(split as u32)
    };
    let right = if hi == split + 1 {
        ChildRef::leaf(split as u32 + 1)
    } else {
        ChildRef::internal(split as u32 + 1)
    };
    (left, right)
}

/// Build the full topology over `T >= 2` sorted, strictly increasing keys.
///
/// Each node's task reads only the shared key slice, so tasks run in any
/// order. Parent links are scatter-written through relaxed atomics; every
/// slot is written exactly once (each leaf and each non-root node is the
/// child of exactly one node).
#[tracing::instrument(skip_all, fields(leaf_count = keys.len()))]
pub fn build_topology(keys: &[u64]) -> Topology {
    let t = keys.len();
    debug_assert!(t >= 2, "degenerate trees are handled by the facade");
    debug_assert!(keys.windows(2).all(|w| w[0] < w[1]));

    let mut nodes = vec![Node::default(); t - 1];
    let leaf_parent: Vec<AtomicU32> = (0..t).map(|_| AtomicU32::new(INVALID_INDEX)).collect();
    let node_parent: Vec<AtomicU32> = (0..t - 1).map(|_| AtomicU32::new(INVALID_INDEX)).collect();

    nodes.par_iter_mut().enumerate().for_each(|(i, node)| {
        let (left, right) = link_node(keys, i);
        node.left = left;
        node.right = right;
        for child in [left, right] {
            let slot = if child.is_leaf() {
                &leaf_parent[child.index() as usize]
            } else {
                &node_parent[child.index() as usize]
            };
            slot.store(i as u32, Ordering::Relaxed);
        }
    });

    Topology {
        nodes,
        leaf_parent: leaf_parent.into_iter().map(AtomicU32::into_inner).collect(),
        node_parent: node_parent.into_iter().map(AtomicU32::into_inner).collect(),
    }
}
