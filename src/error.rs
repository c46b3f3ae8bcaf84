//! Error types for hierarchy construction.

use thiserror::Error;

/// Build-boundary validation failures.
///
/// These are precondition violations reported before any stage runs; a
/// non-finite coordinate would corrupt the scene bound and poison every
/// downstream key, so it is rejected rather than propagated. Internal
/// invariant breaks (sentinel children, counter underflow) are programming
/// errors and assert instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// `positions` and `prim_ids` must be the same length
    #[error("position/id count mismatch: {positions} positions, {ids} ids")]
    LengthMismatch { positions: usize, ids: usize },

    /// NaN or infinite coordinate in the input
    #[error("non-finite coordinate at position {index}")]
    NonFinitePosition { index: usize },
}

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::LengthMismatch { positions: 4, ids: 3 };
        assert!(e.to_string().contains("4"));
        assert!(e.to_string().contains("3"));

        let e = Error::NonFinitePosition { index: 17 };
        assert!(e.to_string().contains("17"));
    }
}
