//! Mean absolute variation measures.
//!
//! These feed the diagnostic ratios: the I/C ratio that drives the automatic
//! Henderson selection compares the average movement of the irregular with
//! the average movement of the trend, and the Moving Seasonality Ratio does
//! the same per calendar period for the irregular and the seasonal.
//!
//! In the additive arithmetic a movement is `|x_t - x_{t-lag}|`; in the
//! multiplicative arithmetic it is the relative change `|x_t / x_{t-lag} - 1|`.

use crate::context::Context;

/// Mean absolute variation of `values` at the given lag, in the working
/// arithmetic of `ctx`. Returns 0 when fewer than `lag + 1` values are given.
pub fn mean_abs_variation(ctx: &Context, values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag || lag == 0 {
        return 0.0;
    }
    let additive = ctx.mode().is_additive_arithmetic();
    let sum: f64 = values
        .iter()
        .skip(lag)
        .zip(values.iter())
        .map(|(&x, &prev)| {
            if additive {
                (x - prev).abs()
            } else {
                (x / prev - 1.0).abs()
            }
        })
        .sum();
    sum / (values.len() - lag) as f64
}
