//! Shared test utilities for the reanalysis analysis workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Granule lookup under `TEST_DATA_DIR`
//! - Skip macros for optional NetCDF granules
//! - Synthetic grid generators and dataset bundles
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{synthetic_bundle, BundleOptions, grid};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// Real MERRA-2 granules are large and not checked in; tests that need one
/// skip themselves unless `TEST_DATA_DIR` points at a copy.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_slv_granule() {
///     let path = require_test_file!("MERRA2_400.tavg1_2d_slv_Nx.20250901.nc4");
///     // Test code using path...
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: granule {} not found; set TEST_DATA_DIR to a directory holding it.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(26.850000001_f64, 26.85_f64, 1e-6); // passes
/// assert_approx_eq!(1.1_f64, 1.0_f64, 0.001);           // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality for every cell of two float slices.
///
/// NaN in the expected slice matches only NaN.
#[macro_export]
macro_rules! assert_cells_approx_eq {
    ($actual:expr, $expected:expr, $epsilon:expr) => {{
        let actual: Vec<f64> = $actual.into_iter().map(|v| v as f64).collect();
        let expected: Vec<f64> = $expected.into_iter().map(|v| v as f64).collect();
        assert_eq!(actual.len(), expected.len(), "cell count differs");
        for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
            if e.is_nan() {
                assert!(a.is_nan(), "cell {} expected NaN, got {}", i, a);
            } else {
                let diff = (a - e).abs();
                assert!(
                    diff <= $epsilon as f64,
                    "cell {}: {} vs {} (diff {})",
                    i,
                    a,
                    e,
                    diff
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 1.0, 0.001);
    }

    #[test]
    fn test_assert_cells_approx_eq() {
        assert_cells_approx_eq!(vec![1.0, f64::NAN], vec![1.0000001, f64::NAN], 1e-6);
    }
}
