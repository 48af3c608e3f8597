//! Henderson trend filters and composite trend probe filters.
//!
//! The Henderson coefficients minimize the sum of squared third differences
//! of the filter while reproducing cubic polynomials; the classical closed
//! form is used here. Lengths 9, 13 and 23 are the ones selected by the
//! automatic trend computer, but any odd length in [1, 101] is accepted.

use crate::error::{Result, X11Error};
use crate::filter::SymmetricFilter;
use crate::timeseries::Frequency;

/// Largest Henderson length accepted by the configuration surface.
pub const MAX_HENDERSON_LENGTH: usize = 101;

/// Check a configured Henderson length: 0 means automatic selection,
/// otherwise an odd integer in [1, 101].
pub fn validate_henderson_length(length: usize) -> Result<()> {
    if length == 0 || (length % 2 == 1 && length <= MAX_HENDERSON_LENGTH) {
        Ok(())
    } else {
        Err(X11Error::InvalidHendersonLength(length))
    }
}

/// Build the Henderson filter of the given odd length.
///
/// The choice of length is a pure function of the request; data-dependent
/// selection lives in the trend-cycle computer.
pub fn henderson(length: usize) -> Result<SymmetricFilter> {
    if length % 2 == 0 || length == 0 || length > MAX_HENDERSON_LENGTH {
        return Err(X11Error::InvalidHendersonLength(length));
    }
    if length == 1 {
        return Ok(SymmetricFilter::new(vec![1.0]));
    }
    let h = (length / 2) as i64;
    let n = (h + 2) as f64;
    let denom = 8.0
        * n
        * (n * n - 1.0)
        * (4.0 * n * n - 1.0)
        * (4.0 * n * n - 9.0)
        * (4.0 * n * n - 25.0);
    let weights = (-h..=h)
        .map(|j| {
            let j = j as f64;
            let j2 = j * j;
            315.0
                * ((n - 1.0) * (n - 1.0) - j2)
                * (n * n - j2)
                * ((n + 1.0) * (n + 1.0) - j2)
                * (3.0 * n * n - 16.0 - 11.0 * j2)
                / denom
        })
        .collect();
    Ok(SymmetricFilter::new(weights))
}

/// Composite `2xN` moving average: MA(2) of MA(N), weights
/// `(1, 2, ..., 2, 1) / 2N` over `N + 1` points. This is the basic symmetric
/// smoother used as the trend probe and by the seasonal normalizer.
pub fn trend_probe_filter(frequency: Frequency) -> SymmetricFilter {
    let n = frequency.periods_per_year();
    let mut weights = vec![1.0 / n as f64; n + 1];
    weights[0] = 0.5 / n as f64;
    weights[n] = 0.5 / n as f64;
    SymmetricFilter::new(weights)
}

/// Conventional Musgrave inertia ratio associated with a Henderson length,
/// used when no measured I/C ratio is available.
pub fn default_inertia_ratio(length: usize) -> f64 {
    match length {
        0..=5 => 0.001,
        6..=9 => 1.0,
        10..=13 => 3.5,
        _ => 4.5,
    }
}
