//! Seasonal component estimation, automatic filter selection and
//! normalization.
//!
//! The seasonal computer smooths the seasonal-irregular (SI) series one
//! calendar position at a time with the configured `3xN` filter, where the
//! filter can also be selected automatically from the Moving Seasonality
//! Ratio (MSR). The normalizer then re-centers the estimate so every local
//! year averages to the neutral element of the working arithmetic.

use crate::context::Context;
use crate::error::{Result, X11Error};
use crate::filter::{filter_series_with_ends, AsymmetricFilter, FilterWithEnds, SymmetricFilter};
use crate::henderson::trend_probe_filter;
use crate::seasonal_filters::{FilteringStrategy, SeasonalFilterOption};
use crate::timeseries::TimeSeries;
use crate::variation::mean_abs_variation;

/// Correction applied to the per-period irregular variation when fewer than
/// 6 year-over-year differences are available, indexed by count 2..=5.
const SMALL_SAMPLE_CORRECTION: [f64; 4] = [1.732, 1.342, 1.207, 1.140];

/// Series shorter than this many whole years always use the stable filter.
pub const MIN_YEARS_FOR_MOVING_FILTER: usize = 5;

/// Filters of degree >= 8 (3x9 and longer) need this many whole years.
pub const MIN_YEARS_FOR_LONG_FILTER: usize = 20;

/// Outcome of the automatic MSR filter selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MsrSelection {
    /// Selected filter.
    pub filter: SeasonalFilterOption,
    /// The last global ratio that was computed.
    pub msr: f64,
    /// Whole years of the sub-domain that produced the decision.
    pub years_used: usize,
    /// True when no ratio ever mapped to a filter and 3x5 was assumed.
    pub defaulted: bool,
}

/// Resolved seasonal pass: the component plus the decisions behind it.
#[derive(Debug, Clone)]
pub struct SeasonalEstimate {
    /// Seasonal component on the SI domain, not yet normalized.
    pub seasonal: TimeSeries,
    /// The per-period strategy that was actually applied.
    pub strategy: FilteringStrategy,
    /// Present when an automatic (MSR) option was resolved.
    pub msr: Option<MsrSelection>,
}

/// Map a global MSR to a filter. `None` falls in one of the undecidable
/// bands and asks the caller to drop a year and retry.
fn map_msr(msr: f64) -> Option<SeasonalFilterOption> {
    if msr < 2.5 {
        Some(SeasonalFilterOption::S3x3)
    } else if msr < 3.5 {
        None
    } else if msr < 5.5 {
        Some(SeasonalFilterOption::S3x5)
    } else if msr < 6.5 {
        None
    } else {
        Some(SeasonalFilterOption::S3x9)
    }
}

/// Clamped-window mean of half-width 3: the across-year smoother separating
/// the moving seasonality from the irregular inside one calendar position.
fn smooth_across_years(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    (0..n)
        .map(|t| {
            let lo = t.saturating_sub(3);
            let hi = (t + 4).min(n);
            values[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

/// Global MSR of an SI series: per-period irregular variation over seasonal
/// variation, weighted by the per-period difference counts.
pub fn moving_seasonality_ratio(ctx: &Context, si: &TimeSeries) -> f64 {
    let ppy = ctx.periods_per_year();
    let mut irregular_sum = 0.0;
    let mut seasonal_sum = 0.0;
    for position in 0..ppy {
        let values = si.position_values(position);
        let count = values.len();
        if count < 2 {
            continue;
        }
        let seasonal = smooth_across_years(&values);
        let irregular: Vec<f64> = values
            .iter()
            .zip(seasonal.iter())
            .map(|(&v, &s)| ctx.separate(v, s))
            .collect();
        let mut ivar = mean_abs_variation(ctx, &irregular, 1);
        let svar = mean_abs_variation(ctx, &seasonal, 1);
        if count < 6 {
            ivar *= SMALL_SAMPLE_CORRECTION[count - 2];
        }
        let weight = (count - 1) as f64;
        irregular_sum += weight * ivar;
        seasonal_sum += weight * svar;
    }
    if seasonal_sum > 0.0 {
        irregular_sum / seasonal_sum
    } else {
        f64::INFINITY
    }
}

/// Automatic filter selection: compute the MSR on the largest trailing
/// whole-year sub-domain; when it falls in an undecidable band, drop one
/// more year and retry until fewer than 3 years remain, then default to 3x5.
pub fn select_by_msr(ctx: &Context, si: &TimeSeries) -> MsrSelection {
    let ppy = ctx.periods_per_year();
    let mut last_msr = f64::NAN;
    let mut last_years = 0;
    if let Some(mut domain) = si.domain().trailing_whole_years() {
        while domain.whole_years() >= 3 {
            // The trailing sub-domain is contained in si by construction.
            let sub = si
                .select(&domain)
                .expect("trailing whole-year domain escapes the series");
            let msr = moving_seasonality_ratio(ctx, &sub);
            last_msr = msr;
            last_years = domain.whole_years();
            if let Some(filter) = map_msr(msr) {
                log::debug!(
                    "msr selection: ratio {:.3} over {} years -> {:?}",
                    msr,
                    last_years,
                    filter
                );
                return MsrSelection {
                    filter,
                    msr,
                    years_used: last_years,
                    defaulted: false,
                };
            }
            domain = domain.shrink(ppy, 0);
        }
    }
    log::debug!(
        "msr selection exhausted after {} years (last ratio {:.3}), defaulting to 3x5",
        last_years,
        last_msr
    );
    MsrSelection {
        filter: SeasonalFilterOption::S3x5,
        msr: last_msr,
        years_used: last_years,
        defaulted: true,
    }
}

/// Apply the forced-stable rules to one resolved option.
fn force_stable(option: SeasonalFilterOption, years: usize) -> SeasonalFilterOption {
    if years < MIN_YEARS_FOR_MOVING_FILTER {
        return SeasonalFilterOption::Stable;
    }
    if option.degree() >= 8 && years < MIN_YEARS_FOR_LONG_FILTER {
        return SeasonalFilterOption::Stable;
    }
    option
}

/// Compute the seasonal component of an SI series.
///
/// `options` holds either one filter for every calendar position or one per
/// position; any other count is a configuration error. The automatic (MSR)
/// option is resolved first, then the forced-stable rules are applied: short
/// series always get the stable filter, and the long 3x9/3x15 filters demand
/// at least 20 years.
pub fn compute_seasonal(
    ctx: &Context,
    options: &[SeasonalFilterOption],
    si: &TimeSeries,
) -> Result<SeasonalEstimate> {
    let ppy = ctx.periods_per_year();
    if options.len() != 1 && options.len() != ppy {
        return Err(X11Error::SeasonalFilterCount {
            required: ppy,
            actual: options.len(),
        });
    }

    let years = si.domain().whole_years();
    let mut msr = None;
    let mut resolve = |option: SeasonalFilterOption| -> SeasonalFilterOption {
        let concrete = if option == SeasonalFilterOption::Msr {
            let selection = *msr.get_or_insert_with(|| select_by_msr(ctx, si));
            selection.filter
        } else {
            option
        };
        force_stable(concrete, years)
    };

    let strategy = if options.len() == 1 {
        match resolve(options[0]) {
            SeasonalFilterOption::Stable => FilteringStrategy::Stable,
            concrete => FilteringStrategy::Uniform(concrete),
        }
    } else {
        FilteringStrategy::Mixed(options.iter().map(|&o| resolve(o)).collect())
    };

    let seasonal = strategy.filter_series(si);
    Ok(SeasonalEstimate {
        seasonal,
        strategy,
        msr,
    })
}

/// Centering filter: the `2xN` smoother with cut-and-renormalized ends.
/// Shared with the final-trend bias correction.
pub fn centering_filter(ctx: &Context) -> FilterWithEnds {
    let sym = trend_probe_filter(ctx.frequency());
    let ends = cut_ends(&sym);
    FilterWithEnds::new(sym, ends)
}

fn cut_ends(sym: &SymmetricFilter) -> Vec<AsymmetricFilter> {
    let h = sym.half_width();
    let w = sym.weights();
    (0..h)
        .map(|q| {
            let m = h + 1 + q;
            let sum: f64 = w[..m].iter().sum();
            AsymmetricFilter::new(w[..m].iter().map(|&x| x / sum).collect(), -(h as isize))
        })
        .collect()
}

/// Re-center a seasonal estimate so each local year averages to the neutral
/// element: separate the estimate by its own `2xN` moving average.
pub fn normalize_seasonal(ctx: &Context, seasonal: &TimeSeries) -> TimeSeries {
    normalize_seasonal_mixed(ctx, seasonal, &[])
}

/// Normalizer with the mixed end rule: boundary values of calendar positions
/// filtered with the stable option are copied from the matching period one
/// year inward instead of trusting the shortened centering average.
/// `stable_positions` is empty (no mixed rule) or one flag per position.
pub fn normalize_seasonal_mixed(
    ctx: &Context,
    seasonal: &TimeSeries,
    stable_positions: &[bool],
) -> TimeSeries {
    let filter = centering_filter(ctx);
    let center = filter_series_with_ends(&filter, seasonal);
    let normalized = ctx.separate_series(seasonal, &center);

    if stable_positions.is_empty() {
        return normalized;
    }
    let ppy = ctx.periods_per_year();
    let h = filter.symmetric().half_width();
    let n = normalized.len();
    let mut values = normalized.values().to_vec();
    for i in 0..h.min(n) {
        if stable_positions[normalized.domain().position_at(i)] && i + ppy < n {
            values[i] = values[i + ppy];
        }
        let j = n - 1 - i;
        if stable_positions[normalized.domain().position_at(j)] && j >= ppy {
            values[j] = values[j - ppy];
        }
    }
    TimeSeries::new(*normalized.domain(), values)
}
