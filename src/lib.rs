//! # lbvh
//!
//! Parallel linear bounding volume hierarchy (LBVH) construction.
//!
//! Builds a binary spatial index over 3D point primitives by sorting
//! Morton keys instead of iterative splitting, following the radix-tree
//! construction of "Thinking Parallel, Part III" (Karras 2012). Every
//! stage of the pipeline is a data-parallel pass over rayon; bounding
//! boxes are filled in by a lock-free bottom-up refit.
//!
//! Ray traversal itself is deliberately not included: the crate exposes
//! the finished node array, boxes, and the ray/box slab test, and leaves
//! occlusion/intersection algorithms to the consumer.
//!
//! ## Modules
//!
//! - [`aabb`] - Bounding boxes, plain and atomically expandable
//! - [`ray`] - Query-time ray types
//! - [`morton`] - 30-bit Z-order key encoding
//! - [`tree`] - Nodes, child tagging, parallel topology construction
//! - [`refit`] - Counter-gated bottom-up box computation
//! - [`bvh`] - The [`Lbvh`] facade and build pipeline
//! - [`error`] - Error handling
//!
//! ## Example
//!
//! ```
//! use glam::Vec3;
//! use lbvh::Lbvh;
//!
//! let positions = vec![
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//! ];
//! let bvh = Lbvh::build(positions, vec![0, 1, 2]).unwrap();
//! assert_eq!(bvh.nodes().len(), 2);
//! ```

pub mod aabb;
pub mod bvh;
pub mod error;
pub mod morton;
pub mod ray;
pub mod refit;
pub mod tree;

mod search;

// Re-export commonly used types
pub use aabb::{Aabb, AtomicAabb};
pub use bvh::Lbvh;
pub use error::{Error, Result};
pub use ray::{RadianceRay, Ray};
pub use tree::{ChildRef, Node, INVALID_INDEX};
