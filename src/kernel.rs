//! Decomposition kernel: the staged A-F pipeline over the table registry.
//!
//! A run accepts one series, lets the preprocessor collaborator extend it,
//! then performs three rounds of the trend -> seasonal -> outlier refinement
//! (stages B, C and D) with progressively cleaner inputs. Stage D publishes
//! the final tables (D10 seasonal factors, D11 seasonally adjusted series,
//! D12 trend-cycle, D13 irregular); stage E derives the modified variants;
//! stage F is a reserved extension point with no computation.
//!
//! The kernel itself is sequential and side-effect-free apart from writing
//! into its own registry; independent runs can be parallelized at the call
//! boundary, which is what [`decompose_all`] does.

use crate::context::{Context, DecompositionMode};
use crate::error::{Result, X11Error};
use crate::extreme::{ExtremeValueCorrector, SigmaLimits, SigmaPolicy};
use crate::filter::filter_series_with_ends;
use crate::henderson::validate_henderson_length;
use crate::registry::{Registry, TableId};
use crate::seasonal::{
    centering_filter, compute_seasonal, normalize_seasonal_mixed, MsrSelection, SeasonalEstimate,
};
use crate::seasonal_filters::{FilteringStrategy, SeasonalFilterOption};
use crate::slice_maybe_parallel;
use crate::timeseries::{Domain, Frequency, Period, TimeSeries};
use crate::trend::{compute_trend, trend_probe, TrendEstimate, TrendOption};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// Bias correction applied to the final trend in multiplicative mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BiasCorrection {
    /// Geometric trend from the log-space Henderson pass, uncorrected.
    #[default]
    None,
    /// Skip the log switch entirely and filter the adjusted series directly.
    Legacy,
    /// Rescale the log-space trend so its mean matches the adjusted series.
    Ratio,
    /// Fold the smoothed trend residual back into the trend.
    Smooth,
}

/// Configuration surface of a decomposition run.
#[derive(Debug, Clone, PartialEq)]
pub struct X11Spec {
    /// Decomposition arithmetic.
    pub mode: DecompositionMode,
    /// Annual frequency the input series must match.
    pub frequency: Frequency,
    /// Henderson length: 0 selects automatically, otherwise an odd length
    /// in [1, 101].
    pub henderson_length: usize,
    /// One seasonal filter for all positions, or one per calendar position.
    pub seasonal_filters: Vec<SeasonalFilterOption>,
    /// Extreme-value detection thresholds.
    pub sigma_limits: SigmaLimits,
    /// Standard deviation estimation policy.
    pub sigma_policy: SigmaPolicy,
    /// Forecast horizon: non-negative periods, or negative for whole years.
    pub forecast_horizon: i32,
    /// Backcast horizon, same convention.
    pub backcast_horizon: i32,
    /// Final-trend bias correction policy.
    pub bias_correction: BiasCorrection,
}

impl Default for X11Spec {
    fn default() -> Self {
        Self {
            mode: DecompositionMode::Multiplicative,
            frequency: Frequency::Monthly,
            henderson_length: 0,
            seasonal_filters: vec![SeasonalFilterOption::Msr],
            sigma_limits: SigmaLimits::default(),
            sigma_policy: SigmaPolicy::default(),
            forecast_horizon: 0,
            backcast_horizon: 0,
            bias_correction: BiasCorrection::None,
        }
    }
}

impl X11Spec {
    /// Check every configurable against its documented constraint.
    pub fn validate(&self) -> Result<()> {
        validate_henderson_length(self.henderson_length)?;
        let ppy = self.frequency.periods_per_year();
        if self.seasonal_filters.len() != 1 && self.seasonal_filters.len() != ppy {
            return Err(X11Error::SeasonalFilterCount {
                required: ppy,
                actual: self.seasonal_filters.len(),
            });
        }
        if let SigmaPolicy::Grouped(groups) = &self.sigma_policy {
            if groups.len() != ppy {
                return Err(X11Error::SigmaGroupCount {
                    required: ppy,
                    actual: groups.len(),
                });
            }
            if let Some(position) = groups.iter().position(|&g| g > 1) {
                return Err(X11Error::InvalidSigmaGroupLabel {
                    position,
                    label: groups[position],
                });
            }
        }
        Ok(())
    }

    /// Run context implied by the configuration.
    pub fn context(&self) -> Context {
        Context::new(
            self.mode,
            self.frequency,
            self.forecast_horizon,
            self.backcast_horizon,
        )
    }

    fn trend_option(&self) -> TrendOption {
        if self.henderson_length == 0 {
            TrendOption::Automatic
        } else {
            TrendOption::Fixed(self.henderson_length)
        }
    }
}

/// Forecast/backcast collaborator invoked by stage A.
///
/// The contract: read the input table A1 and publish the working series B1.
/// With zero horizons the input must be copied through unchanged; otherwise
/// B1 carries the extension and the A1a/A1b tables hold the appended parts.
pub trait Preprocessor {
    fn preprocess(&self, ctx: &Context, registry: &mut Registry) -> Result<()>;
}

/// Built-in preprocessor standing in for an external forecasting model.
///
/// Extensions repeat the mean of the last (respectively first) whole year of
/// the input; with zero horizons it degenerates to a plain copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoForecastPreprocessor;

impl Preprocessor for NoForecastPreprocessor {
    fn preprocess(&self, ctx: &Context, registry: &mut Registry) -> Result<()> {
        let a1 = registry.require(TableId::A1)?.clone();
        let forecast = ctx.forecast_horizon();
        let backcast = ctx.backcast_horizon();
        if forecast == 0 && backcast == 0 {
            registry.insert(TableId::B1, a1);
            return Ok(());
        }

        let ppy = ctx.periods_per_year();
        let n = a1.len();
        let first_year_mean = a1.values()[..ppy].iter().sum::<f64>() / ppy as f64;
        let last_year_mean = a1.values()[n - ppy..].iter().sum::<f64>() / ppy as f64;
        let leading = vec![first_year_mean; backcast];
        let trailing = vec![last_year_mean; forecast];

        if backcast > 0 {
            let domain = Domain::new(
                Period::from_id(a1.domain().start_id() - backcast as i64, ctx.frequency()),
                backcast,
                ctx.frequency(),
            );
            registry.insert(TableId::A1b, TimeSeries::new(domain, leading.clone()));
        }
        if forecast > 0 {
            let domain = Domain::new(
                Period::from_id(a1.domain().end_id(), ctx.frequency()),
                forecast,
                ctx.frequency(),
            );
            registry.insert(TableId::A1a, TimeSeries::new(domain, trailing.clone()));
        }
        registry.insert(TableId::B1, a1.extend_with(&leading, &trailing));
        Ok(())
    }
}

/// Published outcome of one decomposition run.
///
/// The component series are sliced back to the input domain and, in
/// log-additive mode, returned on the original scale; the registry keeps
/// every intermediate table for diagnostic access.
#[derive(Debug, Clone)]
pub struct X11Results {
    /// Final trend-cycle (table D12).
    pub trend: TimeSeries,
    /// Final seasonally adjusted series (table D11).
    pub seasonally_adjusted: TimeSeries,
    /// Final seasonal factors (table D10).
    pub seasonal: TimeSeries,
    /// Final irregular component (table D13).
    pub irregular: TimeSeries,
    /// One-year-ahead seasonal factors (table D10a); present when no
    /// explicit forecast horizon was configured.
    pub seasonal_forecast: Option<TimeSeries>,
    /// Henderson length used for the final trend.
    pub henderson_length: usize,
    /// I/C ratio measured for the final trend.
    pub ic_ratio: f64,
    /// MSR selection, when an automatic seasonal filter was resolved.
    pub msr: Option<MsrSelection>,
    /// Every table the run published.
    pub registry: Registry,
}

/// One configured decomposition kernel; reusable across series.
pub struct X11Kernel {
    spec: X11Spec,
    preprocessor: Box<dyn Preprocessor + Send + Sync>,
}

impl X11Kernel {
    /// Build a kernel with the built-in preprocessor. The configuration is
    /// validated eagerly.
    pub fn new(spec: X11Spec) -> Result<Self> {
        Self::with_preprocessor(spec, Box::new(NoForecastPreprocessor))
    }

    /// Build a kernel around an external preprocessor collaborator.
    pub fn with_preprocessor(
        spec: X11Spec,
        preprocessor: Box<dyn Preprocessor + Send + Sync>,
    ) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            preprocessor,
        })
    }

    /// Run the full A-F pipeline on one series.
    pub fn process(&self, series: &TimeSeries) -> Result<X11Results> {
        let ctx = self.spec.context();
        ctx.validate(series)?;
        let log_mode = ctx.mode() == DecompositionMode::LogAdditive;
        let mut registry = Registry::new();

        // Stage A: accept the input and let the preprocessor extend it.
        registry.insert(TableId::A1, series.clone());
        self.preprocessor.preprocess(&ctx, &mut registry)?;
        let b1_published = registry.require(TableId::B1)?.clone();
        let b1 = if log_mode {
            b1_published.map(f64::ln)
        } else {
            b1_published
        };

        // Stage B: first refinement pass on the raw working series.
        let pass = decomposition_pass(&ctx, &self.spec, &b1, &b1)?;
        check_trend_positive(&ctx, TableId::B7, &pass.trend.trend)?;
        let (b13, b17, b20) = irregular_pass(&ctx, &self.spec, &pass.adjusted_final, &pass.trend.trend)?;
        registry.insert(TableId::B2, pass.rough);
        registry.insert(TableId::B3, pass.si);
        registry.insert(TableId::B4, pass.si_corrections);
        registry.insert(TableId::B5, pass.seasonal_initial);
        registry.insert(TableId::B6, pass.adjusted_initial);
        registry.insert(TableId::B7, pass.trend.trend);
        registry.insert(TableId::B8, pass.si_second);
        registry.insert(TableId::B9, pass.si_corrected);
        registry.insert(TableId::B10, pass.seasonal_final);
        registry.insert(TableId::B11, pass.adjusted_final);
        registry.insert(TableId::B13, b13);
        registry.insert(TableId::B17, b17);
        registry.insert(TableId::B20, b20);

        // Stage C: repeat on the extreme-corrected series.
        let c1 = ctx.separate_series(&b1, registry.require(TableId::B20)?);
        let pass = decomposition_pass(&ctx, &self.spec, &c1, &b1)?;
        check_trend_positive(&ctx, TableId::C7, &pass.trend.trend)?;
        let (c13, c17, c20) = irregular_pass(&ctx, &self.spec, &pass.adjusted_final, &pass.trend.trend)?;
        registry.insert(TableId::C1, c1);
        registry.insert(TableId::C2, pass.rough);
        registry.insert(TableId::C4, pass.si);
        registry.insert(TableId::C5, pass.seasonal_initial);
        registry.insert(TableId::C6, pass.adjusted_initial);
        registry.insert(TableId::C7, pass.trend.trend);
        registry.insert(TableId::C9, pass.si_second);
        registry.insert(TableId::C10, pass.seasonal_final);
        registry.insert(TableId::C11, pass.adjusted_final);
        registry.insert(TableId::C13, c13);
        registry.insert(TableId::C17, c17);
        registry.insert(TableId::C20, c20);

        // Stage D: final pass, publishing the decomposition.
        let d1 = ctx.separate_series(&b1, registry.require(TableId::C20)?);
        let pass = decomposition_pass(&ctx, &self.spec, &d1, &b1)?;
        check_trend_positive(&ctx, TableId::D7, &pass.trend.trend)?;
        let d10 = pass.seasonal_final.clone();
        let d11 = pass.adjusted_final.clone();
        let d12 = final_trend(&ctx, &self.spec, &d11)?;
        check_trend_positive(&ctx, TableId::D12, &d12.trend)?;
        let d13 = ctx.separate_series(&d11, &d12.trend);
        let d10a = if ctx.forecast_horizon() == 0 {
            Some(project_seasonal(&ctx, &d10))
        } else {
            None
        };

        let publish = |s: &TimeSeries| -> TimeSeries {
            if log_mode {
                s.map(f64::exp)
            } else {
                s.clone()
            }
        };

        registry.insert(TableId::D1, d1);
        registry.insert(TableId::D2, pass.rough);
        registry.insert(TableId::D4, pass.si);
        registry.insert(TableId::D5, pass.seasonal_initial);
        registry.insert(TableId::D6, pass.adjusted_initial);
        registry.insert(TableId::D7, pass.trend.trend);
        registry.insert(TableId::D8, pass.si_second);
        registry.insert(TableId::D9, pass.si_corrected);
        registry.insert(TableId::D10, publish(&d10));
        if let Some(forecast) = &d10a {
            registry.insert(TableId::D10a, publish(forecast));
        }
        registry.insert(TableId::D11, publish(&d11));
        registry.insert(TableId::D12, publish(&d12.trend));
        registry.insert(TableId::D13, publish(&d13));

        // Stage E: modified series from the final weights, with the context
        // mean as fallback for the extremes.
        let mut final_corrector =
            ExtremeValueCorrector::new(self.spec.sigma_limits, self.spec.sigma_policy.clone());
        final_corrector.analyse(&ctx, &d13)?;
        let weights = final_corrector
            .observation_weights()
            .expect("weights are available after analyse")
            .clone();
        let e1_values: Vec<f64> = (0..b1.len())
            .map(|i| {
                if weights.get(i) < 1.0 {
                    ctx.combine(d12.trend.get(i), d10.get(i))
                } else {
                    b1.get(i)
                }
            })
            .collect();
        let e1 = TimeSeries::new(*b1.domain(), e1_values);
        let e2 = ctx.separate_series(&e1, &d10);
        let e3 = ctx.separate_series(&e2, &d12.trend);
        registry.insert(TableId::E1, publish(&e1));
        registry.insert(TableId::E2, publish(&e2));
        registry.insert(TableId::E3, publish(&e3));

        // Stage F: reserved, no computation.

        let original = *series.domain();
        let slice = |id: TableId| -> Result<TimeSeries> {
            registry
                .require(id)?
                .select(&original)
                .ok_or(X11Error::MissingTable(id))
        };
        let trend = slice(TableId::D12)?;
        let seasonally_adjusted = slice(TableId::D11)?;
        let seasonal = slice(TableId::D10)?;
        let irregular = slice(TableId::D13)?;
        let seasonal_forecast = d10a.as_ref().map(|f| publish(f));
        Ok(X11Results {
            trend,
            seasonally_adjusted,
            seasonal,
            irregular,
            seasonal_forecast,
            henderson_length: d12.henderson_length,
            ic_ratio: d12.ic_ratio,
            msr: pass.msr,
            registry,
        })
    }
}

/// Decompose many series with one configuration. With the `parallel` feature
/// the series are processed concurrently, one registry per call.
pub fn decompose_all(spec: &X11Spec, series: &[TimeSeries]) -> Result<Vec<X11Results>> {
    spec.validate()?;
    slice_maybe_parallel!(series)
        .map(|s| X11Kernel::new(spec.clone()).and_then(|kernel| kernel.process(s)))
        .collect()
}

/// Intermediate results of one B/C/D-shaped refinement pass.
struct Pass {
    rough: TimeSeries,
    si: TimeSeries,
    si_corrections: TimeSeries,
    seasonal_initial: TimeSeries,
    adjusted_initial: TimeSeries,
    trend: TrendEstimate,
    si_second: TimeSeries,
    si_corrected: TimeSeries,
    seasonal_final: TimeSeries,
    adjusted_final: TimeSeries,
    msr: Option<MsrSelection>,
}

/// The two-round trend -> seasonal -> outlier refinement shared by stages
/// B, C and D. `work` is the (possibly extreme-corrected) series the filters
/// run on; `base` is the series the seasonal component is removed from.
fn decomposition_pass(
    ctx: &Context,
    spec: &X11Spec,
    work: &TimeSeries,
    base: &TimeSeries,
) -> Result<Pass> {
    let initial_filter = [SeasonalFilterOption::S3x3];

    // Round one: rough trend, preliminary seasonal, extreme correction of
    // the seasonal-irregular.
    let rough = trend_probe(ctx, work);
    let si = ctx.separate_series(work, &rough);
    let preliminary = compute_seasonal(ctx, &initial_filter, &si)?;
    let preliminary_norm = normalize_estimate(ctx, &preliminary);
    let irregular = ctx.separate_series(&si, &preliminary_norm);
    let mut corrector = ExtremeValueCorrector::new(spec.sigma_limits, spec.sigma_policy.clone());
    corrector.analyse(ctx, &irregular)?;
    let si_corrections = corrector.compute_corrections(&si);
    let si_clean = corrector.apply_corrections(&si, &si_corrections);

    let initial = compute_seasonal(ctx, &initial_filter, &si_clean)?;
    let seasonal_initial = extend_seasonal(&normalize_estimate(ctx, &initial), work.domain());
    let adjusted_initial = ctx.separate_series(work, &seasonal_initial);

    // Round two: Henderson trend on the first-round adjusted series, final
    // seasonal filter on the corrected seasonal-irregular. Both stay on the
    // working series; only the published adjusted series goes back to `base`.
    let trend = compute_trend(ctx, spec.trend_option(), &adjusted_initial)?;
    let si_second = ctx.separate_series(work, &trend.trend);
    let refined = compute_seasonal(ctx, &spec.seasonal_filters, &si_second)?;
    let refined_norm = normalize_estimate(ctx, &refined);
    let irregular2 = ctx.separate_series(&si_second, &refined_norm);
    let mut corrector2 = ExtremeValueCorrector::new(spec.sigma_limits, spec.sigma_policy.clone());
    corrector2.analyse(ctx, &irregular2)?;
    let corrections2 = corrector2.compute_corrections(&si_second);
    let si_corrected = corrector2.apply_corrections(&si_second, &corrections2);

    let fin = compute_seasonal(ctx, &spec.seasonal_filters, &si_corrected)?;
    let msr = fin.msr;
    let seasonal_final = extend_seasonal(&normalize_estimate(ctx, &fin), base.domain());
    let adjusted_final = ctx.separate_series(base, &seasonal_final);

    Ok(Pass {
        rough,
        si,
        si_corrections,
        seasonal_initial,
        adjusted_initial,
        trend,
        si_second,
        si_corrected,
        seasonal_final,
        adjusted_final,
        msr,
    })
}

/// Irregular component plus the observation weights and correction factors
/// it implies.
fn irregular_pass(
    ctx: &Context,
    spec: &X11Spec,
    adjusted: &TimeSeries,
    trend: &TimeSeries,
) -> Result<(TimeSeries, TimeSeries, TimeSeries)> {
    let irregular = ctx.separate_series(adjusted, trend);
    let mut corrector = ExtremeValueCorrector::new(spec.sigma_limits, spec.sigma_policy.clone());
    corrector.analyse(ctx, &irregular)?;
    let weights = corrector
        .observation_weights()
        .expect("weights are available after analyse")
        .clone();
    let factors = corrector.correction_factors(ctx, &irregular);
    Ok((irregular, weights, factors))
}

/// Normalize a seasonal estimate, engaging the mixed end rule when any
/// calendar position was filtered with the stable option.
fn normalize_estimate(ctx: &Context, estimate: &SeasonalEstimate) -> TimeSeries {
    let ppy = ctx.periods_per_year();
    let stable: Vec<bool> = match &estimate.strategy {
        FilteringStrategy::Stable => vec![true; ppy],
        FilteringStrategy::Uniform(_) => vec![false; ppy],
        FilteringStrategy::Mixed(options) => options
            .iter()
            .map(|&o| o == SeasonalFilterOption::Stable)
            .collect(),
    };
    if stable.iter().any(|&s| s) {
        normalize_seasonal_mixed(ctx, &estimate.seasonal, &stable)
    } else {
        normalize_seasonal_mixed(ctx, &estimate.seasonal, &[])
    }
}

/// Spread a seasonal estimate over a larger domain by borrowing the nearest
/// available value of the same calendar position.
fn extend_seasonal(seasonal: &TimeSeries, target: &Domain) -> TimeSeries {
    let ppy = target.frequency().periods_per_year() as i64;
    let start = seasonal.domain().start_id();
    let end = seasonal.domain().end_id();
    let values = (0..target.length())
        .map(|i| {
            let mut id = target.start_id() + i as i64;
            if id < start {
                // Ceiling division; start - id is positive here.
                id += (start - id + ppy - 1) / ppy * ppy;
            } else if id >= end {
                id -= (id - end + ppy) / ppy * ppy;
            }
            seasonal.get((id - start) as usize)
        })
        .collect();
    TimeSeries::new(*target, values)
}

/// Final trend with the multiplicative log switch and bias correction.
fn final_trend(ctx: &Context, spec: &X11Spec, adjusted: &TimeSeries) -> Result<TrendEstimate> {
    if ctx.mode().is_additive_arithmetic() || spec.bias_correction == BiasCorrection::Legacy {
        return compute_trend(ctx, spec.trend_option(), adjusted);
    }

    // Multiplicative: filter in log space, exponentiate back.
    let log_ctx = Context::new(DecompositionMode::Additive, ctx.frequency(), 0, 0);
    let logged = adjusted.map(f64::ln);
    let estimate = compute_trend(&log_ctx, spec.trend_option(), &logged)?;
    let mut trend = estimate.trend.map(f64::exp);

    match spec.bias_correction {
        BiasCorrection::Ratio => {
            let scale = adjusted.average() / trend.average();
            trend = trend.map(|v| v * scale);
        }
        BiasCorrection::Smooth => {
            let residual = ctx.separate_series(adjusted, &trend);
            let smoothed = filter_series_with_ends(&centering_filter(ctx), &residual);
            trend = ctx.combine_series(&trend, &smoothed);
        }
        BiasCorrection::None | BiasCorrection::Legacy => {}
    }

    Ok(TrendEstimate {
        trend,
        henderson_length: estimate.henderson_length,
        ic_ratio: estimate.ic_ratio,
    })
}

/// One-year-ahead seasonal factor projection: each position moves on by
/// half the step it took over the last two years.
fn project_seasonal(ctx: &Context, seasonal: &TimeSeries) -> TimeSeries {
    let ppy = ctx.periods_per_year();
    let n = seasonal.len();
    let domain = Domain::new(
        Period::from_id(seasonal.domain().end_id(), ctx.frequency()),
        ppy,
        ctx.frequency(),
    );
    let values = (0..ppy)
        .map(|i| {
            let last = seasonal.get(n - ppy + i);
            let previous = seasonal.get(n - 2 * ppy + i);
            last + 0.5 * (last - previous)
        })
        .collect();
    TimeSeries::new(domain, values)
}

/// Positivity gate for multiplicative trends.
fn check_trend_positive(ctx: &Context, table: TableId, trend: &TimeSeries) -> Result<()> {
    if ctx.mode().is_additive_arithmetic() {
        return Ok(());
    }
    // NaN must not pass; `v <= 0.0` would let it through.
    if let Some(index) = trend.values().iter().position(|&v| !(v > 0.0)) {
        return Err(X11Error::NonPositiveTrend { table, index });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monthly_series(length: usize, f: impl Fn(usize) -> f64) -> TimeSeries {
        let domain = Domain::new(Period::new(2000, 0), length, Frequency::Monthly);
        TimeSeries::new(domain, (0..length).map(f).collect())
    }

    fn additive_spec() -> X11Spec {
        X11Spec {
            mode: DecompositionMode::Additive,
            seasonal_filters: vec![SeasonalFilterOption::S3x3],
            ..X11Spec::default()
        }
    }

    #[test]
    fn test_spec_validation() {
        assert!(X11Spec::default().validate().is_ok());

        let spec = X11Spec {
            henderson_length: 12,
            ..X11Spec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(X11Error::InvalidHendersonLength(12))
        ));

        let spec = X11Spec {
            seasonal_filters: vec![SeasonalFilterOption::S3x3; 5],
            ..X11Spec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(X11Error::SeasonalFilterCount { .. })
        ));

        let spec = X11Spec {
            sigma_policy: SigmaPolicy::Grouped(vec![0, 1]),
            ..X11Spec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(X11Error::SigmaGroupCount { .. })
        ));

        let mut groups = vec![0; 12];
        groups[7] = 3;
        let spec = X11Spec {
            sigma_policy: SigmaPolicy::Grouped(groups),
            ..X11Spec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(X11Error::InvalidSigmaGroupLabel {
                position: 7,
                label: 3
            })
        ));
    }

    #[test]
    fn test_preprocessor_copies_without_horizons() {
        let ctx = Context::new(DecompositionMode::Additive, Frequency::Monthly, 0, 0);
        let mut registry = Registry::new();
        let series = monthly_series(48, |i| i as f64);
        registry.insert(TableId::A1, series.clone());
        NoForecastPreprocessor.preprocess(&ctx, &mut registry).unwrap();
        assert_eq!(registry.require(TableId::B1).unwrap(), &series);
        assert!(!registry.contains(TableId::A1a));
    }

    #[test]
    fn test_preprocessor_extends_by_year_means() {
        let ctx = Context::new(DecompositionMode::Additive, Frequency::Monthly, 12, -1);
        let mut registry = Registry::new();
        registry.insert(TableId::A1, monthly_series(48, |i| i as f64));
        NoForecastPreprocessor.preprocess(&ctx, &mut registry).unwrap();

        let b1 = registry.require(TableId::B1).unwrap();
        assert_eq!(b1.len(), 48 + 12 + 12);
        assert_eq!(b1.domain().start(), Period::new(1999, 0));
        // First-year mean 5.5, last-year mean 41.5.
        assert_eq!(b1.get(0), 5.5);
        assert_eq!(b1.get(b1.len() - 1), 41.5);
        assert_eq!(registry.require(TableId::A1a).unwrap().len(), 12);
        assert_eq!(registry.require(TableId::A1b).unwrap().len(), 12);
    }

    #[test]
    fn test_extend_seasonal_borrows_same_position() {
        let domain = Domain::new(Period::new(2001, 0), 24, Frequency::Monthly);
        let seasonal = TimeSeries::new(domain, (0..24).map(|i| (i % 12) as f64).collect());
        let target = Domain::new(Period::new(2000, 6), 42, Frequency::Monthly);
        let extended = extend_seasonal(&seasonal, &target);
        assert_eq!(extended.len(), 42);
        // 2000m6 borrows from 2001m6.
        assert_eq!(extended.get(0), 6.0);
        // 2003m11 borrows from 2002m11.
        assert_eq!(extended.get(41), 11.0);
        // Interior values are untouched.
        assert_eq!(
            extended.value_at(Period::new(2001, 3)).unwrap(),
            seasonal.value_at(Period::new(2001, 3)).unwrap()
        );
    }

    #[test]
    fn test_project_seasonal_extrapolates_half_step() {
        let ctx = Context::new(DecompositionMode::Additive, Frequency::Quarterly, 0, 0);
        let domain = Domain::new(Period::new(2000, 0), 12, Frequency::Quarterly);
        // Position values step by 1.0 per year.
        let seasonal = TimeSeries::new(domain, (0..12).map(|i| (i / 4) as f64).collect());
        let forecast = project_seasonal(&ctx, &seasonal);
        assert_eq!(forecast.domain().start(), Period::new(2003, 0));
        assert_eq!(forecast.len(), 4);
        for i in 0..4 {
            assert_eq!(forecast.get(i), 2.5);
        }
    }

    #[test]
    fn test_positivity_gate_rejects_zero_and_nan() {
        let ctx = Context::new(DecompositionMode::Multiplicative, Frequency::Monthly, 0, 0);
        let good = monthly_series(12, |i| 1.0 + i as f64);
        assert!(check_trend_positive(&ctx, TableId::B7, &good).is_ok());

        let zero = monthly_series(12, |i| if i == 5 { 0.0 } else { 1.0 });
        assert!(matches!(
            check_trend_positive(&ctx, TableId::B7, &zero),
            Err(X11Error::NonPositiveTrend { index: 5, .. })
        ));

        let nan = monthly_series(12, |i| if i == 3 { f64::NAN } else { 1.0 });
        assert!(matches!(
            check_trend_positive(&ctx, TableId::B7, &nan),
            Err(X11Error::NonPositiveTrend { index: 3, .. })
        ));

        // Additive runs tolerate any trend sign.
        let add = Context::new(DecompositionMode::Additive, Frequency::Monthly, 0, 0);
        assert!(check_trend_positive(&add, TableId::B7, &zero).is_ok());
    }

    #[test]
    fn test_additive_run_reconstructs_exactly() {
        let pattern: [f64; 12] = [
            5.0, -3.0, 2.0, -1.0, 4.0, -4.0, 1.0, -2.0, 3.0, -5.0, 2.0, -2.0,
        ];
        let series = monthly_series(120, |i| 100.0 + 0.3 * i as f64 + pattern[i % 12]);
        let kernel = X11Kernel::new(additive_spec()).unwrap();
        let results = kernel.process(&series).unwrap();

        assert_eq!(results.seasonally_adjusted.domain(), series.domain());
        for i in 0..series.len() {
            let rebuilt = results.seasonally_adjusted.get(i) + results.seasonal.get(i);
            assert!(
                (rebuilt - series.get(i)).abs() < 1e-9,
                "reconstruction off at {}: {} vs {}",
                i,
                rebuilt,
                series.get(i)
            );
            let rebuilt = results.trend.get(i) + results.irregular.get(i);
            assert!((rebuilt - results.seasonally_adjusted.get(i)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_registry_is_stage_complete() {
        let pattern: [f64; 12] = [
            5.0, -3.0, 2.0, -1.0, 4.0, -4.0, 1.0, -2.0, 3.0, -5.0, 2.0, -2.0,
        ];
        let series = monthly_series(96, |i| 50.0 + 0.1 * i as f64 + pattern[i % 12]);
        let results = X11Kernel::new(additive_spec())
            .unwrap()
            .process(&series)
            .unwrap();
        for id in [
            TableId::A1,
            TableId::B1,
            TableId::B7,
            TableId::B17,
            TableId::B20,
            TableId::C11,
            TableId::C20,
            TableId::D10,
            TableId::D10a,
            TableId::D11,
            TableId::D12,
            TableId::D13,
            TableId::E1,
            TableId::E3,
        ] {
            assert!(results.registry.contains(id), "missing table {}", id);
        }
    }

    #[test]
    fn test_forecast_horizon_suppresses_projection() {
        let pattern: [f64; 12] = [
            5.0, -3.0, 2.0, -1.0, 4.0, -4.0, 1.0, -2.0, 3.0, -5.0, 2.0, -2.0,
        ];
        let series = monthly_series(96, |i| 50.0 + 0.1 * i as f64 + pattern[i % 12]);
        let spec = X11Spec {
            forecast_horizon: 12,
            ..additive_spec()
        };
        let results = X11Kernel::new(spec).unwrap().process(&series).unwrap();
        assert!(results.seasonal_forecast.is_none());
        assert!(!results.registry.contains(TableId::D10a));
        // The working series was extended, the published slice was not.
        assert_eq!(results.registry.require(TableId::B1).unwrap().len(), 108);
        assert_eq!(results.trend.len(), 96);
    }
}
