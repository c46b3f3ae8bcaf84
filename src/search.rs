//! Monotonic predicate searches.
//!
//! The topology builder works with predicates of the form
//! `delta(i, i + k*d) > threshold`, which are true at `k = 0` and flip to
//! false exactly once as `k` grows. Both the range-end search and the split
//! search reduce to "largest `k` still satisfying the predicate", with the
//! exponential probe supplying an upper bound when none is known up front.

/// Largest `k` in `[0, hi]` for which `pred(k)` holds.
///
/// `pred` must be monotonically decreasing (true up to some point, false
/// after) and true at 0.
pub(crate) fn max_true(hi: usize, pred: impl Fn(usize) -> bool) -> usize {
    debug_assert!(pred(0));
    let mut lo = 0;
    let mut hi = hi;
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if pred(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Doubling probe: smallest power of two (at least 2) at which `pred`
/// fails. The result bounds a subsequent [`max_true`] refinement.
pub(crate) fn probe_bound(pred: impl Fn(usize) -> bool) -> usize {
    let mut bound = 2usize;
    while pred(bound) {
        bound *= 2;
    }
    bound
}
