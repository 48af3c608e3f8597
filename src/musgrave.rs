//! Musgrave asymmetric end-point filters.
//!
//! Given a symmetric filter and an inertia ratio `R` (the measured or assumed
//! I/C ratio), the Musgrave procedure minimizes the expected revision of the
//! boundary estimates under a local linear trend whose slope-to-noise ratio
//! is tied to `R` through `D = 4 / (pi * R^2)`. The result is one filter per
//! boundary position; interior positions keep the symmetric output.

use crate::filter::{AsymmetricFilter, SymmetricFilter};
use std::f64::consts::PI;

/// Build the right-boundary family for `sym`: `family[q]` applies at the
/// position with exactly `q` future observations available (`q < h`). Left
/// boundaries use the mirror images.
pub fn musgrave_family(sym: &SymmetricFilter, ic_ratio: f64) -> Vec<AsymmetricFilter> {
    let h = sym.half_width();
    let w = sym.weights();
    let n = w.len();
    let d = 4.0 / (PI * ic_ratio * ic_ratio);

    (0..h)
        .map(|q| {
            // Keep the first m coefficients, redistribute the truncated tail.
            let m = h + 1 + q;
            let center = (m as f64 + 1.0) / 2.0;
            let tail_sum: f64 = w[m..n].iter().sum();
            let tail_slope: f64 = w[m..n]
                .iter()
                .enumerate()
                .map(|(k, &wj)| wj * ((m + k + 1) as f64 - center))
                .sum();
            let mf = m as f64;
            let b = d / (1.0 + d * mf * (mf * mf - 1.0) / 12.0);
            let weights: Vec<f64> = (0..m)
                .map(|i| w[i] + tail_sum / mf + ((i + 1) as f64 - center) * b * tail_slope)
                .collect();
            AsymmetricFilter::new(weights, -(h as isize))
        })
        .collect()
}
