//! # x11-core
//!
//! Seasonal decomposition of monthly and quarterly time series in Rust,
//! following the X-11 method:
//! - Time-series buffers with period-aligned domain arithmetic
//! - Linear filters (Henderson trends, composite seasonal averages,
//!   Musgrave asymmetric end treatment)
//! - Extreme-value detection and correction with selectable sigma policies
//!   and a Cochran pre-test
//! - Automatic Henderson length selection from the I/C ratio and automatic
//!   seasonal filter selection from the Moving Seasonality Ratio
//! - The staged A-F decomposition kernel publishing the classical tables
//!   (B1 ... D13, E1 ... E3) through an append-only registry
//!
//! ## Entry points
//!
//! [`X11Kernel::process`] decomposes one series under an [`X11Spec`];
//! [`decompose_all`] runs many series with one configuration, in parallel
//! when the `parallel` feature is enabled.

#![allow(clippy::needless_range_loop)]

pub mod parallel;

pub mod context;
pub mod error;
pub mod extreme;
pub mod filter;
pub mod henderson;
pub mod kernel;
pub mod musgrave;
pub mod registry;
pub mod seasonal;
pub mod seasonal_filters;
pub mod timeseries;
pub mod trend;
pub mod variation;

// Re-export the configuration and kernel surface
pub use kernel::{
    decompose_all, BiasCorrection, NoForecastPreprocessor, Preprocessor, X11Kernel, X11Results,
    X11Spec,
};

// Re-export the core data types
pub use context::{Context, DecompositionMode};
pub use error::{Result, X11Error};
pub use registry::{Registry, Stage, TableId};
pub use timeseries::{Domain, Frequency, Period, TimeSeries};

// Re-export the component-level strategy types
pub use extreme::{CochranTest, ExtremeValueCorrector, SigmaLimits, SigmaPolicy};
pub use seasonal::MsrSelection;
pub use seasonal_filters::SeasonalFilterOption;
pub use trend::TrendOption;
