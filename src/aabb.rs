//! Axis-aligned bounding boxes.
//!
//! Two representations exist:
//! - [`Aabb`] - plain `Vec3` min/max for single-writer use,
//! - [`AtomicAabb`] - per-component atomic storage for concurrent expansion
//!   during the bottom-up refit pass.
//!
//! The atomic form stores each float component as an order-preserving `u32`
//! (see [`ordered_bits`]), so integer compare-exchange implements min/max
//! correctly across the full float range, negatives included.

use glam::Vec3;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::ray::Ray;

const SIGN_BIT: u32 = 0x8000_0000;

/// Map a float to a `u32` whose unsigned order matches the float's numeric
/// order. Non-negative values get the sign bit set; negative values are
/// fully complemented so that more-negative floats compare smaller.
#[inline]
pub(crate) fn ordered_bits(f: f32) -> u32 {
    let b = f.to_bits();
    if b & SIGN_BIT != 0 {
        !b
    } else {
        b | SIGN_BIT
    }
}

/// Inverse of [`ordered_bits`].
#[inline]
pub(crate) fn from_ordered_bits(b: u32) -> f32 {
    if b & SIGN_BIT != 0 {
        f32::from_bits(b & !SIGN_BIT)
    } else {
        f32::from_bits(!b)
    }
}

/// 3D axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Degenerate box enclosing a single point.
    #[inline]
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Check if this box is empty (min exceeds max on some axis).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point. Single writer only.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand this box to include another box. Single writer only.
    #[inline]
    pub fn expand_by_box(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Union of two boxes, by value.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Check if `other` lies entirely inside this box.
    #[inline]
    pub fn contains_box(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// Map a point into this box's unit cube.
    ///
    /// Axes with zero extent map to 0 instead of dividing zero by zero, so
    /// planar scenes still produce finite spatial keys.
    #[inline]
    pub fn normalize_point(&self, p: Vec3) -> Vec3 {
        let extent = (self.max - self.min).max(Vec3::splat(f32::MIN_POSITIVE));
        (p - self.min) / extent
    }

    /// Half the surface area: `wx*wy + wy*wz + wz*wx` with clamped extents.
    /// The usual SAH cost metric.
    #[inline]
    pub fn halved_area(&self) -> f32 {
        let w = (self.max - self.min).max(Vec3::ZERO);
        w.x * w.y + w.y * w.z + w.z * w.x
    }

    /// Slab test against a ray. Returns the near-plane distance on a hit.
    ///
    /// Each axis picks the entering face by the sign of the reciprocal
    /// direction, so both ray orientations are handled without a second
    /// branch. Zero direction components produce IEEE infinities that flow
    /// through the comparisons correctly; do not "fix" them.
    ///
    /// A hit requires `t_near <= t_far`, the far crossing in front of the
    /// origin, and the near crossing closer than `max_len`. `t_near` may be
    /// negative when the origin is inside the box.
    #[inline]
    pub fn intersect(&self, ray: &Ray, max_len: f32) -> Option<f32> {
        let inv = ray.inv_dir();
        let origin = ray.origin;

        let x = ((if inv.x > 0.0 { self.min.x } else { self.max.x }) - origin.x) * inv.x;
        let y = ((if inv.y > 0.0 { self.min.y } else { self.max.y }) - origin.y) * inv.y;
        let z = ((if inv.z > 0.0 { self.min.z } else { self.max.z }) - origin.z) * inv.z;
        let t_near = x.max(y).max(z);

        let x = ((if inv.x > 0.0 { self.max.x } else { self.min.x }) - origin.x) * inv.x;
        let y = ((if inv.y > 0.0 { self.max.y } else { self.min.y }) - origin.y) * inv.y;
        let z = ((if inv.z > 0.0 { self.max.z } else { self.min.z }) - origin.z) * inv.z;
        let t_far = x.min(y).min(z);

        if t_near <= t_far && t_far > 0.0 && t_near < max_len {
            Some(t_near)
        } else {
            None
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Bounding box safe for concurrent expansion from multiple threads.
///
/// This is the canonical storage during the refit pass; once all writers are
/// done, [`AtomicAabb::load`] converts back to a plain [`Aabb`]. There is no
/// layout aliasing between the two forms, only bit reinterpretation.
pub struct AtomicAabb {
    min: [AtomicU32; 3],
    max: [AtomicU32; 3],
}

impl AtomicAabb {
    /// Empty box: any expansion strictly improves it.
    pub fn empty() -> Self {
        let lo = ordered_bits(f32::INFINITY);
        let hi = ordered_bits(f32::NEG_INFINITY);
        Self {
            min: [AtomicU32::new(lo), AtomicU32::new(lo), AtomicU32::new(lo)],
            max: [AtomicU32::new(hi), AtomicU32::new(hi), AtomicU32::new(hi)],
        }
    }

    /// Expand to include `other`. Safe against any number of concurrent
    /// callers targeting the same box; this is the only racing write in the
    /// whole build pipeline besides the refit arrival counters.
    pub fn expand(&self, other: &Aabb) {
        for i in 0..3 {
            atomic_min(&self.min[i], ordered_bits(other.min[i]));
            atomic_max(&self.max[i], ordered_bits(other.max[i]));
        }
    }

    /// Read back as a plain box. Acquire loads pair with the releasing
    /// compare-exchanges in [`AtomicAabb::expand`].
    pub fn load(&self) -> Aabb {
        let c = |a: &AtomicU32| from_ordered_bits(a.load(Ordering::Acquire));
        Aabb {
            min: Vec3::new(c(&self.min[0]), c(&self.min[1]), c(&self.min[2])),
            max: Vec3::new(c(&self.max[0]), c(&self.max[1]), c(&self.max[2])),
        }
    }
}

/// CAS-retry min. Exits as soon as the stored value is already no larger
/// than `value`; the stored value only ever decreases, so the loop cannot
/// live-lock.
#[inline]
fn atomic_min(slot: &AtomicU32, value: u32) {
    let mut current = slot.load(Ordering::Relaxed);
    while value < current {
        match slot.compare_exchange_weak(current, value, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}

/// CAS-retry max, mirror of [`atomic_min`].
#[inline]
fn atomic_max(slot: &AtomicU32, value: u32) {
    let mut current = slot.load(Ordering::Relaxed);
    while value > current {
        match slot.compare_exchange_weak(current, value, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}
