//! Seasonal moving-average filters (S3x1 ... S3x15) and filtering strategies.
//!
//! A seasonal filter smooths the observations of one calendar position across
//! years: the `3xN` filter is the MA(3) of an MA(N) applied to that
//! per-period sub-series. The symmetric sets come with matching asymmetric
//! end filters; the classical published end weights are used for 3x1, 3x3
//! and 3x5, while the longer 3x9 and 3x15 ends cut the symmetric weights at
//! the boundary and renormalize them.
//!
//! The stable filter is the degenerate case: one factor per calendar period,
//! computed as the plain average over the whole series, with no moving window.

use crate::filter::{AsymmetricFilter, FilterWithEnds, SymmetricFilter};
use crate::timeseries::TimeSeries;

/// Seasonal filter choice exposed on the configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalFilterOption {
    /// 3x1 moving average (3 years).
    S3x1,
    /// 3x3 moving average (5 years).
    #[default]
    S3x3,
    /// 3x5 moving average (7 years).
    S3x5,
    /// 3x9 moving average (11 years).
    S3x9,
    /// 3x15 moving average (17 years).
    S3x15,
    /// One factor per calendar period over the whole series.
    Stable,
    /// Automatic selection driven by the Moving Seasonality Ratio.
    Msr,
}

impl SeasonalFilterOption {
    /// Length of the symmetric filter in years; 1 for the stable filter.
    /// The automatic option has no fixed span until resolved.
    pub fn span_years(self) -> usize {
        match self {
            SeasonalFilterOption::S3x1 => 3,
            SeasonalFilterOption::S3x3 => 5,
            SeasonalFilterOption::S3x5 => 7,
            SeasonalFilterOption::S3x9 => 11,
            SeasonalFilterOption::S3x15 => 17,
            SeasonalFilterOption::Stable | SeasonalFilterOption::Msr => 1,
        }
    }

    /// Filter degree (span minus one); drives the forced-stable rule for
    /// long filters on short series.
    pub fn degree(self) -> usize {
        self.span_years() - 1
    }

    /// The symmetric coefficient set with its end filters; `None` for the
    /// stable and automatic options, which are not linear filters.
    pub fn filter(self) -> Option<FilterWithEnds> {
        match self {
            SeasonalFilterOption::S3x1 => Some(s3x1()),
            SeasonalFilterOption::S3x3 => Some(s3x3()),
            SeasonalFilterOption::S3x5 => Some(s3x5()),
            SeasonalFilterOption::S3x9 => Some(composite_with_cut_ends(9)),
            SeasonalFilterOption::S3x15 => Some(composite_with_cut_ends(15)),
            SeasonalFilterOption::Stable | SeasonalFilterOption::Msr => None,
        }
    }
}

/// Symmetric `3xN` coefficients: convolution of MA(3) and MA(N), length N+2.
fn composite_3xn(n: usize) -> SymmetricFilter {
    debug_assert!(n % 2 == 1);
    let denom = (3 * n) as f64;
    let len = n + 2;
    let weights = (0..len)
        .map(|i| {
            // Overlap count of the two windows at offset i, capped by the
            // shorter window on both sides.
            let ramp = (i + 1).min(3).min(n).min(len - i) as f64;
            ramp / denom
        })
        .collect();
    SymmetricFilter::new(weights)
}

fn s3x1() -> FilterWithEnds {
    let sym = composite_3xn(1);
    let ends = vec![AsymmetricFilter::new(vec![0.39, 0.61], -1)];
    FilterWithEnds::new(sym, ends)
}

fn s3x3() -> FilterWithEnds {
    let sym = composite_3xn(3);
    let ends = vec![
        AsymmetricFilter::new(
            vec![5.0 / 27.0, 11.0 / 27.0, 11.0 / 27.0], // concurrent
            -2,
        ),
        AsymmetricFilter::new(vec![3.0 / 27.0, 7.0 / 27.0, 10.0 / 27.0, 7.0 / 27.0], -2),
    ];
    FilterWithEnds::new(sym, ends)
}

fn s3x5() -> FilterWithEnds {
    let sym = composite_3xn(5);
    let ends = vec![
        AsymmetricFilter::new(
            vec![9.0 / 60.0, 17.0 / 60.0, 17.0 / 60.0, 17.0 / 60.0], // concurrent
            -3,
        ),
        AsymmetricFilter::new(
            vec![4.0 / 60.0, 11.0 / 60.0, 15.0 / 60.0, 15.0 / 60.0, 15.0 / 60.0],
            -3,
        ),
        AsymmetricFilter::new(
            vec![
                4.0 / 60.0,
                8.0 / 60.0,
                13.0 / 60.0,
                13.0 / 60.0,
                13.0 / 60.0,
                9.0 / 60.0,
            ],
            -3,
        ),
    ];
    FilterWithEnds::new(sym, ends)
}

/// Long seasonal filters: cut the symmetric weights at the boundary and
/// renormalize to sum one.
fn composite_with_cut_ends(n: usize) -> FilterWithEnds {
    let sym = composite_3xn(n);
    let h = sym.half_width();
    let w = sym.weights();
    let ends = (0..h)
        .map(|q| {
            let m = h + 1 + q;
            let sum: f64 = w[..m].iter().sum();
            AsymmetricFilter::new(w[..m].iter().map(|&x| x / sum).collect(), -(h as isize))
        })
        .collect();
    FilterWithEnds::new(sym, ends)
}

/// Per-period filtering strategy resolved from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum FilteringStrategy {
    /// The same `3xN` filter for every calendar position.
    Uniform(SeasonalFilterOption),
    /// One factor per calendar period, no moving window.
    Stable,
    /// A different filter per calendar position (length = frequency).
    Mixed(Vec<SeasonalFilterOption>),
}

impl FilteringStrategy {
    /// Smooth every per-period sub-series of `series`, producing a series on
    /// the same domain. Positions whose sub-series is shorter than the
    /// symmetric filter fall back to the stable (plain average) estimate;
    /// this is a documented policy, not an error.
    pub fn filter_series(&self, series: &TimeSeries) -> TimeSeries {
        let ppy = series.frequency().periods_per_year();
        let mut out = vec![0.0; series.len()];
        for position in 0..ppy {
            let option = match self {
                FilteringStrategy::Uniform(option) => *option,
                FilteringStrategy::Stable => SeasonalFilterOption::Stable,
                FilteringStrategy::Mixed(options) => options[position],
            };
            let indices = series.position_indices(position);
            let values: Vec<f64> = indices.iter().map(|&i| series.get(i)).collect();
            let smoothed = smooth_position(option, &values);
            for (k, &i) in indices.iter().enumerate() {
                out[i] = smoothed[k];
            }
        }
        TimeSeries::new(*series.domain(), out)
    }
}

fn smooth_position(option: SeasonalFilterOption, values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    match option.filter() {
        Some(filter) if values.len() >= filter.symmetric().len() => filter.apply(values),
        _ => {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            vec![mean; values.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::{Domain, Frequency, Period};

    #[test]
    fn test_composite_coefficients() {
        // MA(3) of MA(1) is MA(3) itself.
        let f = composite_3xn(1);
        for &w in f.weights() {
            assert!((w - 1.0 / 3.0).abs() < 1e-15);
        }
        assert!((f.weights().iter().sum::<f64>() - 1.0).abs() < 1e-15);

        let f = composite_3xn(3);
        let expected = [1.0 / 9.0, 2.0 / 9.0, 3.0 / 9.0, 2.0 / 9.0, 1.0 / 9.0];
        for (a, e) in f.weights().iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-15);
        }

        let f = composite_3xn(9);
        assert_eq!(f.len(), 11);
        assert!((f.weights().iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((f.weights()[0] - 1.0 / 27.0).abs() < 1e-15);
        assert!((f.weights()[5] - 3.0 / 27.0).abs() < 1e-15);
    }

    #[test]
    fn test_end_filters_normalized() {
        for option in [
            SeasonalFilterOption::S3x1,
            SeasonalFilterOption::S3x3,
            SeasonalFilterOption::S3x5,
            SeasonalFilterOption::S3x9,
            SeasonalFilterOption::S3x15,
        ] {
            let filter = option.filter().unwrap();
            let h = filter.symmetric().half_width();
            // Exercise the family through a constant input: every position,
            // boundary included, must reproduce the constant.
            let input = vec![2.5; filter.symmetric().len() + 2 * h];
            let out = filter.apply(&input);
            for (t, &v) in out.iter().enumerate() {
                assert!(
                    (v - 2.5).abs() < 1e-12,
                    "{:?} at {}: {} != 2.5",
                    option,
                    t,
                    v
                );
            }
        }
    }

    #[test]
    fn test_span_and_degree() {
        assert_eq!(SeasonalFilterOption::S3x3.span_years(), 5);
        assert_eq!(SeasonalFilterOption::S3x9.degree(), 10);
        assert_eq!(SeasonalFilterOption::S3x15.degree(), 16);
        assert!(SeasonalFilterOption::Stable.filter().is_none());
        assert!(SeasonalFilterOption::Msr.filter().is_none());
    }

    fn quarterly_series(years: usize, f: impl Fn(usize, usize) -> f64) -> TimeSeries {
        let domain = Domain::new(Period::new(2000, 0), years * 4, Frequency::Quarterly);
        let values = (0..years * 4).map(|i| f(i / 4, i % 4)).collect();
        TimeSeries::new(domain, values)
    }

    #[test]
    fn test_stable_strategy_is_per_period_mean() {
        let series = quarterly_series(6, |year, pos| pos as f64 * 10.0 + year as f64);
        let out = FilteringStrategy::Stable.filter_series(&series);
        // Mean over years 0..6 is 2.5 for each position.
        for i in 0..out.len() {
            let expected = (i % 4) as f64 * 10.0 + 2.5;
            assert!((out.get(i) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_uniform_strategy_preserves_fixed_pattern() {
        // A pattern that is constant across years passes through any 3xN
        // filter unchanged.
        let pattern = [1.2, 0.8, 1.1, 0.9];
        let series = quarterly_series(8, |_, pos| pattern[pos]);
        let out =
            FilteringStrategy::Uniform(SeasonalFilterOption::S3x3).filter_series(&series);
        for i in 0..out.len() {
            assert!((out.get(i) - pattern[i % 4]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_short_subseries_falls_back_to_mean() {
        // 4 years cannot support a 3x5 filter (7-year span): the strategy
        // silently degrades to the stable estimate.
        let series = quarterly_series(4, |year, _| year as f64);
        let out =
            FilteringStrategy::Uniform(SeasonalFilterOption::S3x5).filter_series(&series);
        for i in 0..out.len() {
            assert!((out.get(i) - 1.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_mixed_strategy_uses_one_option_per_position() {
        let series = quarterly_series(8, |year, pos| if pos == 0 { year as f64 } else { 1.0 });
        let options = vec![
            SeasonalFilterOption::Stable,
            SeasonalFilterOption::S3x3,
            SeasonalFilterOption::S3x3,
            SeasonalFilterOption::S3x3,
        ];
        let out = FilteringStrategy::Mixed(options).filter_series(&series);
        // Position 0 is stable: the ramp collapses to its mean of 3.5.
        assert!((out.get(0) - 3.5).abs() < 1e-12);
        assert!((out.get(28) - 3.5).abs() < 1e-12);
        // Other positions keep their constant.
        assert!((out.get(1) - 1.0).abs() < 1e-12);
    }
}
