//! Lock-free bottom-up box computation.
//!
//! Once topology is fixed, every node's box is the union of its children's
//! boxes. Leaves start upward walks in parallel; an atomic arrival counter
//! per node (initialized to 2, one per child) gates progress. Whoever
//! decrements a counter to zero has proof both child boxes are already
//! merged in, and is the only walker allowed to continue to the parent.
//! Everyone else stops. Each node is therefore finalized exactly once and
//! total upward work stays O(T).
//!
//! The walk is iterative, not recursive: stack depth is O(1) no matter how
//! degenerate the tree shape gets.

use glam::Vec3;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::aabb::{Aabb, AtomicAabb};
use crate::tree::{Topology, INVALID_INDEX};

/// Fill in every node's box from the leaf positions (leaf order).
///
/// Boxes accumulate in a canonical atomic array while threads race, then
/// convert into the plain `Node` boxes in a final pass once all writers
/// are done. The `AcqRel` counter decrement pairs with the `Acquire` load
/// of the finished box: the winning walker observes both children's
/// expansions before reading.
#[tracing::instrument(skip_all, fields(leaf_count = positions.len()))]
pub fn refit(topology: &mut Topology, positions: &[Vec3]) {
    let node_count = topology.nodes.len();
    debug_assert_eq!(positions.len(), node_count + 1);

    let boxes: Vec<AtomicAabb> = (0..node_count).map(|_| AtomicAabb::empty()).collect();
    let pending: Vec<AtomicU32> = (0..node_count).map(|_| AtomicU32::new(2)).collect();

    let leaf_parent = &topology.leaf_parent;
    let node_parent = &topology.node_parent;

    (0..positions.len()).into_par_iter().for_each(|leaf| {
        let mut bound = Aabb::from_point(positions[leaf]);
        let mut node = leaf_parent[leaf] as usize;
        loop {
            boxes[node].expand(&bound);
            let before = pending[node].fetch_sub(1, Ordering::AcqRel);
            debug_assert!(before > 0, "arrival counter underflow");
            if before != 1 {
                // first arrival: the sibling's walker finishes this node
                break;
            }
            bound = boxes[node].load();
            let parent = node_parent[node];
            if parent == INVALID_INDEX {
                break;
            }
            node = parent as usize;
        }
    });

    topology.nodes.par_iter_mut().enumerate().for_each(|(i, node)| {
        node.aabb = boxes[i].load();
    });
}
