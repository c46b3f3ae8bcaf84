//! Query-time ray types.
//!
//! Rays are not persisted by the hierarchy; traversal code constructs them
//! per query. The reciprocal direction needed by the slab test is a cached
//! field carried by value with the ray, recomputed whenever the direction
//! changes. Keeping the cache inside the ray (instead of thread-local or
//! ambient state) makes copied rays safe by construction.

use glam::Vec3;

use crate::tree::INVALID_INDEX;

/// Minimal ray: origin, direction, cached reciprocal direction.
///
/// The direction is private so the reciprocal cannot go stale; mutate it
/// through [`Ray::set_dir`].
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    dir: Vec3,
    inv_dir: Vec3,
}

impl Ray {
    /// Build a ray. Zero direction components yield infinite reciprocals,
    /// which the slab test relies on.
    #[inline]
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir,
            inv_dir: dir.recip(),
        }
    }

    #[inline]
    pub fn dir(&self) -> Vec3 {
        self.dir
    }

    /// Per-component `1 / dir`.
    #[inline]
    pub fn inv_dir(&self) -> Vec3 {
        self.inv_dir
    }

    /// Replace the direction, refreshing the cached reciprocal.
    #[inline]
    pub fn set_dir(&mut self, dir: Vec3) {
        self.dir = dir;
        self.inv_dir = dir.recip();
    }
}

/// Ray plus hit state, filled in by traversal code.
#[derive(Clone, Copy, Debug)]
pub struct RadianceRay {
    pub ray: Ray,
    /// Barycentric coordinates of the hit.
    pub barycentric: Vec3,
    /// Distance to the closest hit so far.
    pub length: f32,
    /// Primitive id of the closest hit, [`INVALID_INDEX`] when none.
    pub prim: u32,
}

impl RadianceRay {
    /// Wrap a ray with no-hit state: infinite-ish length, invalid primitive.
    #[inline]
    pub fn new(ray: Ray) -> Self {
        Self {
            ray,
            barycentric: Vec3::ZERO,
            length: f32::MAX,
            prim: INVALID_INDEX,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.prim != INVALID_INDEX
    }
}
