//! Trend-cycle estimation: fixed or automatically selected Henderson filters.
//!
//! The automatic strategy runs a rough `2xN` probe first, measures the I/C
//! ratio (mean absolute variation of the implied irregular over that of the
//! probe trend) and maps it to a Henderson length and Musgrave inertia through
//! the classical selection table. When the selected length coincides with the
//! probe length, the probe interior is kept and only the boundary positions
//! are refiltered.

use crate::context::Context;
use crate::error::{Result, X11Error};
use crate::filter::{filter_series, filter_series_with_ends, FilterWithEnds};
use crate::henderson::{default_inertia_ratio, henderson, trend_probe_filter};
use crate::musgrave::musgrave_family;
use crate::timeseries::{Frequency, TimeSeries};
use crate::variation::mean_abs_variation;

/// Trend-cycle strategy selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendOption {
    /// Henderson filter of a caller-specified odd length.
    Fixed(usize),
    /// Probe with the `2xN` filter, then select the length from the
    /// measured I/C ratio.
    #[default]
    Automatic,
}

/// Result of a trend pass.
#[derive(Debug, Clone)]
pub struct TrendEstimate {
    /// Trend-cycle on the full input domain.
    pub trend: TimeSeries,
    /// Henderson length actually applied.
    pub henderson_length: usize,
    /// Measured I/C ratio (already rescaled for sub-monthly frequencies).
    pub ic_ratio: f64,
}

/// Map a (rescaled) I/C ratio to a Henderson length and Musgrave inertia.
///
/// Monthly table: `<1` selects the 9-term filter, `[1, 3.5)` the 13-term,
/// `[3.5, 4.5)` the 13-term with higher inertia, `>= 4.5` the 23-term.
/// Quarterly series use the reduced 5-/7-term table. A half-yearly variant
/// would rescale the ratio by 6 instead of 3.
pub fn select_henderson(frequency: Frequency, ratio: f64) -> (usize, f64) {
    match frequency {
        Frequency::Monthly => {
            if ratio < 1.0 {
                (9, 1.0)
            } else if ratio < 3.5 {
                (13, 3.5)
            } else if ratio < 4.5 {
                (13, 4.5)
            } else {
                (23, 4.5)
            }
        }
        Frequency::Quarterly => {
            if ratio < 1.0 {
                (5, default_inertia_ratio(5))
            } else {
                (7, default_inertia_ratio(7))
            }
        }
    }
}

/// Rough `2xN` trend on the shrunk interior domain, as used by the first
/// decomposition pass before any Henderson selection has happened.
pub fn trend_probe(ctx: &Context, series: &TimeSeries) -> TimeSeries {
    filter_series(&trend_probe_filter(ctx.frequency()), series)
}

/// Measure the I/C ratio of `series` against the probe trend, with the
/// frequency rescaling applied.
pub fn measure_ic_ratio(ctx: &Context, series: &TimeSeries) -> f64 {
    let rough = trend_probe(ctx, series);
    let irregular = ctx.separate_series(series, &rough);
    let gc = mean_abs_variation(ctx, rough.values(), 1);
    let gi = mean_abs_variation(ctx, irregular.values(), 1);
    let raw = if gc > 0.0 {
        gi / gc
    } else if gi > 0.0 {
        f64::INFINITY
    } else {
        1.0
    };
    let scale = match ctx.frequency() {
        Frequency::Monthly => 1.0,
        Frequency::Quarterly => 3.0,
    };
    raw * scale
}

/// Compute the trend-cycle of `series` on its full domain.
pub fn compute_trend(
    ctx: &Context,
    option: TrendOption,
    series: &TimeSeries,
) -> Result<TrendEstimate> {
    let (length, inertia, ic_ratio) = match option {
        TrendOption::Fixed(length) => {
            // Musgrave ends still want an inertia measurement.
            let ratio = measure_ic_ratio(ctx, series);
            let inertia = if ratio.is_finite() && ratio > 0.0 {
                ratio
            } else {
                default_inertia_ratio(length)
            };
            (length, inertia, ratio)
        }
        TrendOption::Automatic => {
            let ratio = measure_ic_ratio(ctx, series);
            let (length, inertia) = select_henderson(ctx.frequency(), ratio);
            log::debug!(
                "automatic trend selection: I/C = {:.3}, Henderson length = {}",
                ratio,
                length
            );
            (length, inertia, ratio)
        }
    };

    if length > series.len() {
        return Err(X11Error::InsufficientData {
            required: length,
            actual: series.len(),
        });
    }

    let probe = trend_probe_filter(ctx.frequency());
    let sym = if length == probe.len() {
        // Same length as the probe: keep its interior, refit the ends only.
        probe
    } else {
        henderson(length)?
    };
    let ends = musgrave_family(&sym, inertia);
    let filter = FilterWithEnds::new(sym, ends);
    let trend = filter_series_with_ends(&filter, series);

    Ok(TrendEstimate {
        trend,
        henderson_length: length,
        ic_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecompositionMode;
    use crate::timeseries::{Domain, Period};

    fn monthly_ctx() -> Context {
        Context::new(DecompositionMode::Additive, Frequency::Monthly, 0, 0)
    }

    fn monthly(values: Vec<f64>) -> TimeSeries {
        let domain = Domain::new(Period::new(2000, 0), values.len(), Frequency::Monthly);
        TimeSeries::new(domain, values)
    }

    #[test]
    fn test_selection_table() {
        assert_eq!(select_henderson(Frequency::Monthly, 0.5), (9, 1.0));
        assert_eq!(select_henderson(Frequency::Monthly, 2.0), (13, 3.5));
        assert_eq!(select_henderson(Frequency::Monthly, 4.0), (13, 4.5));
        assert_eq!(select_henderson(Frequency::Monthly, 5.0), (23, 4.5));
        assert_eq!(select_henderson(Frequency::Quarterly, 0.5).0, 5);
        assert_eq!(select_henderson(Frequency::Quarterly, 2.0).0, 7);
    }

    #[test]
    fn test_smooth_series_selects_short_filter() {
        let series = monthly((0..72).map(|i| 100.0 + 0.5 * i as f64).collect());
        let estimate = compute_trend(&monthly_ctx(), TrendOption::Automatic, &series).unwrap();
        // A pure trend has no irregular at all.
        assert_eq!(estimate.henderson_length, 9);
        assert!(estimate.ic_ratio < 1.0);
        // The trend tracks the line, ends included.
        for i in 0..series.len() {
            assert!(
                (estimate.trend.get(i) - series.get(i)).abs() < 0.5,
                "trend drifts at {}",
                i
            );
        }
    }

    #[test]
    fn test_noisy_series_selects_long_filter() {
        let series = monthly(
            (0..96)
                .map(|i| 100.0 + 0.05 * i as f64 + if i % 2 == 0 { 5.0 } else { -5.0 })
                .collect(),
        );
        let estimate = compute_trend(&monthly_ctx(), TrendOption::Automatic, &series).unwrap();
        assert!(estimate.ic_ratio >= 4.5, "I/C = {}", estimate.ic_ratio);
        assert_eq!(estimate.henderson_length, 23);
    }

    #[test]
    fn test_fixed_length_is_respected() {
        let series = monthly((0..72).map(|i| (i as f64 * 0.3).sin() + 10.0).collect());
        let estimate = compute_trend(&monthly_ctx(), TrendOption::Fixed(9), &series).unwrap();
        assert_eq!(estimate.henderson_length, 9);
        assert_eq!(estimate.trend.domain(), series.domain());
    }

    #[test]
    fn test_fixed_length_errors() {
        let series = monthly(vec![1.0; 48]);
        assert!(matches!(
            compute_trend(&monthly_ctx(), TrendOption::Fixed(8), &series),
            Err(X11Error::InvalidHendersonLength(8))
        ));
        assert!(matches!(
            compute_trend(&monthly_ctx(), TrendOption::Fixed(101), &series),
            Err(X11Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_probe_length_reuses_interior() {
        // Force the 13-term path on a monthly series: the probe is also
        // 13 terms, so the interior must equal the probe interior.
        // Slope 0.5 with a period-3 ripple of 0.5 gives I/C = 4/3.
        let series = monthly(
            (0..72)
                .map(|i| 50.0 + 0.5 * i as f64 + 0.5 * ((i % 3) as f64 - 1.0))
                .collect(),
        );
        let ctx = monthly_ctx();
        let estimate = compute_trend(&ctx, TrendOption::Automatic, &series).unwrap();
        assert_eq!(estimate.henderson_length, 13);
        let probe = trend_probe(&ctx, &series);
        for i in 0..probe.len() {
            let full_index = i + 6;
            assert!(
                (estimate.trend.get(full_index) - probe.get(i)).abs() < 1e-12,
                "interior not reused at {}",
                full_index
            );
        }
    }
}
