//! Parallel iteration abstraction for batch decomposition.
//!
//! The decomposition kernel itself is strictly sequential and side-effect-free
//! apart from its own table registry, so independent series can be processed
//! concurrently at the call boundary (one context and one registry per call).
//! This module provides conditional parallel/sequential iteration based on
//! the `parallel` feature flag: on native targets with the feature enabled,
//! iteration uses rayon; otherwise the same code runs sequentially.
//!
//! # Usage
//!
//! ```ignore
//! use crate::slice_maybe_parallel;
//!
//! let results: Vec<_> = slice_maybe_parallel!(series)
//!     .map(|s| kernel.process(s))
//!     .collect();
//! ```

/// Macro for conditionally parallel reference iteration over slices.
///
/// When the `parallel` feature is enabled, uses `par_iter()`.
/// Otherwise, uses `iter()` for sequential execution.
#[macro_export]
macro_rules! slice_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            $expr.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $expr.iter()
        }
    }};
}

// Re-export the macro at module level
pub use slice_maybe_parallel;
