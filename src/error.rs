//! Error taxonomy for the decomposition kernel.
//!
//! Configuration errors are detected eagerly at entry (or at construction of
//! the offending component) and abort the run; none are retried. Numerical
//! edge cases (short sub-series, unavailable filter margins) are documented
//! fallback policies, not errors, and never surface here.

use crate::registry::TableId;

/// Typed failure raised by the decomposition kernel.
///
/// Every variant is a configuration error in the sense of the design: it is
/// caused by invalid input or invalid options, never by the numerical state
/// of an intermediate table (with the single exception of
/// [`X11Error::NonPositiveTrend`], which indicates that a multiplicative
/// decomposition was requested for a series the mode cannot represent).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum X11Error {
    /// Annual frequency other than 4 or 12.
    #[error("unsupported annual frequency {0}; only 4 (quarterly) and 12 (monthly) are supported")]
    UnsupportedFrequency(usize),

    /// Fewer than the required number of whole years of data.
    #[error("insufficient data: {actual} observations, at least {required} required")]
    InsufficientData { required: usize, actual: usize },

    /// Missing (NaN) values inside the kernel input.
    #[error("input series contains a missing value at index {0}")]
    MissingValue(usize),

    /// Non-positive values under a non-additive decomposition mode.
    #[error("non-positive value {value} at index {index} is invalid for mode {mode}")]
    NonPositiveValue {
        index: usize,
        value: f64,
        mode: &'static str,
    },

    /// Extreme-value sigma limits violating `usigma > lsigma > 0.5`.
    #[error("invalid sigma limits (lsigma={lsigma}, usigma={usigma}); usigma > lsigma > 0.5 required")]
    InvalidSigmaLimits { lsigma: f64, usigma: f64 },

    /// Henderson length that is not 0 (automatic) or an odd integer in [1, 101].
    #[error("invalid Henderson filter length {0}; expected 0 (automatic) or an odd length in [1, 101]")]
    InvalidHendersonLength(usize),

    /// Per-period seasonal filter list whose length does not match the frequency.
    #[error("per-period seasonal filter list has {actual} entries, frequency requires {required}")]
    SeasonalFilterCount { required: usize, actual: usize },

    /// Sigma group assignment whose length does not match the frequency.
    #[error("sigma group assignment has {actual} entries, frequency requires {required}")]
    SigmaGroupCount { required: usize, actual: usize },

    /// Sigma group label outside the two supported groups.
    #[error("sigma group label {label} at position {position}; only groups 0 and 1 are supported")]
    InvalidSigmaGroupLabel { position: usize, label: usize },

    /// Series and spec frequencies disagree.
    #[error("series frequency {series} does not match configured frequency {spec}")]
    FrequencyMismatch { spec: usize, series: usize },

    /// Multiplicative decomposition produced a non-positive trend value.
    #[error("multiplicative trend for table {table} is non-positive at index {index}")]
    NonPositiveTrend { table: TableId, index: usize },

    /// A stage read a table that no earlier stage published.
    #[error("required table {0} has not been published")]
    MissingTable(TableId),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, X11Error>;
