//! Extreme-value detection and correction.
//!
//! The corrector measures how far each observation of a (usually irregular)
//! series strays from the context mean, expressed in standard deviations, and
//! assigns each observation a weight in `[0, 1]`: 1 for ordinary values, 0
//! for fully extreme ones, linearly interpolated in between. Down-weighted
//! observations can then be replaced by a blend of well-behaved neighbours
//! from the same calendar period.
//!
//! The standard deviation itself can be estimated per calendar period, over
//! sliding 5-year windows, over two user-defined period groups, or chosen
//! between the first two by a Cochran pre-test on the per-period variances.

use crate::context::Context;
use crate::error::{Result, X11Error};
use crate::timeseries::TimeSeries;

/// Detection thresholds in standard deviations.
///
/// Observations beyond `usigma` standard deviations get weight 0; those
/// between `lsigma` and `usigma` are interpolated; the rest keep weight 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmaLimits {
    lsigma: f64,
    usigma: f64,
}

impl SigmaLimits {
    /// Validated constructor: requires `usigma > lsigma > 0.5`.
    pub fn new(lsigma: f64, usigma: f64) -> Result<Self> {
        if lsigma > 0.5 && usigma > lsigma {
            Ok(Self { lsigma, usigma })
        } else {
            Err(X11Error::InvalidSigmaLimits { lsigma, usigma })
        }
    }

    #[inline]
    pub fn lsigma(&self) -> f64 {
        self.lsigma
    }

    #[inline]
    pub fn usigma(&self) -> f64 {
        self.usigma
    }
}

impl Default for SigmaLimits {
    /// The conventional 1.5 / 2.5 limits.
    fn default() -> Self {
        Self {
            lsigma: 1.5,
            usigma: 2.5,
        }
    }
}

/// Standard deviation estimation policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SigmaPolicy {
    /// One standard deviation per calendar position, over all years.
    #[default]
    PerPeriod,
    /// Sliding 5-year windows pooling all positions; a single global
    /// estimate when fewer than 5 whole years are available.
    SlidingWindows,
    /// Two user-defined groups of calendar positions sharing one estimate
    /// each; the vector assigns a group (0 or 1) to every position.
    Grouped(Vec<usize>),
    /// Run a Cochran test on the per-period variances and pick `PerPeriod`
    /// when they differ significantly, `SlidingWindows` otherwise.
    CochranPretest,
}

/// 5% critical values of the Cochran C statistic for k = 4 groups,
/// indexed by degrees of freedom 1..=10.
const COCHRAN_CRITICAL_K4: [f64; 10] = [
    0.9065, 0.7679, 0.6841, 0.6287, 0.5895, 0.5598, 0.5365, 0.5175, 0.5017, 0.4884,
];

/// 5% critical values for k = 12 groups, same indexing.
const COCHRAN_CRITICAL_K12: [f64; 10] = [
    0.5410, 0.3924, 0.3264, 0.2880, 0.2624, 0.2439, 0.2299, 0.2187, 0.2098, 0.2020,
];

/// Outcome of the Cochran test for equality of per-period variances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CochranTest {
    /// The C statistic: largest per-period variance over the variance sum.
    pub statistic: f64,
    /// 5% critical value for the series' frequency and degrees of freedom.
    pub critical_value: f64,
    /// True when the statistic stays at or below the critical value.
    pub equal_variances: bool,
}

/// Cochran test on the per-period variances of the deviations from the
/// context mean. Degrees of freedom beyond 10 use the 10-df critical value.
pub fn cochran_test(ctx: &Context, series: &TimeSeries) -> CochranTest {
    let ppy = ctx.periods_per_year();
    let mean = ctx.mean();
    let mut variances = Vec::with_capacity(ppy);
    let mut min_count = usize::MAX;
    for position in 0..ppy {
        let values = series.position_values(position);
        min_count = min_count.min(values.len());
        let df = values.len().saturating_sub(1).max(1);
        let ss: f64 = values.iter().map(|&x| (x - mean) * (x - mean)).sum();
        variances.push(ss / df as f64);
    }
    let total: f64 = variances.iter().sum();
    let statistic = if total > 0.0 {
        variances.iter().cloned().fold(f64::MIN, f64::max) / total
    } else {
        0.0
    };
    let df = min_count.saturating_sub(1).clamp(1, 10);
    let table = match ppy {
        12 => &COCHRAN_CRITICAL_K12,
        _ => &COCHRAN_CRITICAL_K4,
    };
    let critical_value = table[df - 1];
    CochranTest {
        statistic,
        critical_value,
        equal_variances: statistic <= critical_value,
    }
}

/// Extreme-value corrector: analyse a series once, then read weights and
/// corrections off the stored result.
#[derive(Debug, Clone)]
pub struct ExtremeValueCorrector {
    limits: SigmaLimits,
    policy: SigmaPolicy,
    weights: Option<TimeSeries>,
}

impl ExtremeValueCorrector {
    pub fn new(limits: SigmaLimits, policy: SigmaPolicy) -> Self {
        Self {
            limits,
            policy,
            weights: None,
        }
    }

    /// Detect extreme observations and store one weight per observation.
    /// Returns the number of down-weighted observations.
    ///
    /// When a first pass flags fully extreme values, their deviations are
    /// masked and the standard deviations recomputed once before the weight
    /// pass is redone on the original series. A single gross outlier can
    /// otherwise inflate the estimate enough to hide a second one.
    pub fn analyse(&mut self, ctx: &Context, series: &TimeSeries) -> Result<usize> {
        let mean = ctx.mean();
        let devs: Vec<f64> = series.values().iter().map(|&x| x - mean).collect();
        let policy = self.resolve_policy(ctx, series)?;

        let sigmas = sigma_estimates(&policy, ctx, series, &devs)?;
        let mut weights = self.weight_pass(&devs, &sigmas);
        if weights.iter().any(|&w| w == 0.0) {
            let masked: Vec<f64> = devs
                .iter()
                .zip(weights.iter())
                .map(|(&d, &w)| if w == 0.0 { 0.0 } else { d })
                .collect();
            let sigmas = sigma_estimates(&policy, ctx, series, &masked)?;
            weights = self.weight_pass(&devs, &sigmas);
        }

        let count = weights.iter().filter(|&&w| w < 1.0).count();
        log::debug!(
            "extreme-value analysis: {} of {} observations down-weighted",
            count,
            series.len()
        );
        self.weights = Some(TimeSeries::new(*series.domain(), weights));
        Ok(count)
    }

    /// Weights from the last `analyse` call; `None` before the first call.
    pub fn observation_weights(&self) -> Option<&TimeSeries> {
        self.weights.as_ref()
    }

    /// Replacement values for the down-weighted observations of `series`,
    /// as a sparse series: NaN where no correction applies.
    ///
    /// For an observation with weight `e < 1`, up to two full-weight
    /// observations of the same calendar period are collected on each side;
    /// with exactly four neighbours the replacement is the blend
    /// `(e*x + sum(neighbours)) / (4 + e)`, otherwise the plain average of
    /// that period's full-weight observations (or of all of them when none
    /// has full weight).
    ///
    /// `analyse` must have run first; calling this without weights is a
    /// programming error.
    pub fn compute_corrections(&self, series: &TimeSeries) -> TimeSeries {
        let weights = self
            .weights
            .as_ref()
            .expect("analyse must run before corrections are computed");
        let ppy = series.frequency().periods_per_year();
        let n = series.len();
        let w = weights.values();
        let mut out = vec![f64::NAN; n];
        for i in 0..n {
            let e = w[i];
            if e >= 1.0 {
                continue;
            }
            let mut neighbours = Vec::with_capacity(4);
            let mut j = i;
            while j >= ppy && neighbours.len() < 2 {
                j -= ppy;
                if w[j] == 1.0 {
                    neighbours.push(series.get(j));
                }
            }
            let before = neighbours.len();
            let mut j = i;
            while j + ppy < n && neighbours.len() < before + 2 {
                j += ppy;
                if w[j] == 1.0 {
                    neighbours.push(series.get(j));
                }
            }
            out[i] = if neighbours.len() == 4 {
                (e * series.get(i) + neighbours.iter().sum::<f64>()) / (4.0 + e)
            } else {
                period_average(series, weights, i % ppy)
            };
        }
        TimeSeries::new(*series.domain(), out)
    }

    /// Overlay the sparse corrections onto `series`: corrected values where
    /// present, original values elsewhere.
    pub fn apply_corrections(&self, series: &TimeSeries, corrections: &TimeSeries) -> TimeSeries {
        series
            .pointwise(corrections, |x, c| if c.is_nan() { x } else { c })
            .expect("corrections must cover the series domain")
    }

    /// Correction factors implied by the weights: `x * (1 - w)` in the
    /// additive arithmetic, `x / (1 + w*(x - 1))` in the multiplicative one.
    /// Full-weight observations map to the neutral element.
    pub fn correction_factors(&self, ctx: &Context, series: &TimeSeries) -> TimeSeries {
        let weights = self
            .weights
            .as_ref()
            .expect("analyse must run before correction factors are read");
        let additive = ctx.mode().is_additive_arithmetic();
        series
            .pointwise(weights, |x, w| {
                if additive {
                    x * (1.0 - w)
                } else {
                    x / (1.0 + w * (x - 1.0))
                }
            })
            .expect("weights must cover the series domain")
    }

    fn weight_pass(&self, devs: &[f64], sigmas: &[f64]) -> Vec<f64> {
        let lsigma = self.limits.lsigma();
        let usigma = self.limits.usigma();
        devs.iter()
            .zip(sigmas.iter())
            .map(|(&dev, &sigma)| {
                if sigma <= 0.0 {
                    return 1.0;
                }
                let a = dev.abs();
                if a > usigma * sigma {
                    0.0
                } else if a > lsigma * sigma {
                    (usigma * sigma - a) / ((usigma - lsigma) * sigma)
                } else {
                    1.0
                }
            })
            .collect()
    }

    /// Resolve the Cochran pre-test into a concrete policy, once per call.
    fn resolve_policy(&self, ctx: &Context, series: &TimeSeries) -> Result<SigmaPolicy> {
        match &self.policy {
            SigmaPolicy::CochranPretest => {
                let test = cochran_test(ctx, series);
                log::debug!(
                    "cochran pre-test: C = {:.4}, critical = {:.4}, equal variances = {}",
                    test.statistic,
                    test.critical_value,
                    test.equal_variances
                );
                if test.equal_variances {
                    Ok(SigmaPolicy::SlidingWindows)
                } else {
                    Ok(SigmaPolicy::PerPeriod)
                }
            }
            SigmaPolicy::Grouped(groups) => {
                let ppy = ctx.periods_per_year();
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
                Ok(self.policy.clone())
            }
            other => Ok(other.clone()),
        }
    }
}

/// Average of the full-weight observations of one calendar position, falling
/// back to all of them when every one is down-weighted.
fn period_average(series: &TimeSeries, weights: &TimeSeries, position: usize) -> f64 {
    let indices = series.position_indices(position);
    let w = weights.values();
    let full: Vec<f64> = indices
        .iter()
        .filter(|&&i| w[i] == 1.0)
        .map(|&i| series.get(i))
        .collect();
    if !full.is_empty() {
        full.iter().sum::<f64>() / full.len() as f64
    } else {
        let sum: f64 = indices.iter().map(|&i| series.get(i)).sum();
        sum / indices.len() as f64
    }
}

/// Root mean square of a deviation subset; zero for an empty subset.
fn sigma_of<I: Iterator<Item = f64>>(devs: I) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for d in devs {
        sum += d * d;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}

fn sigma_estimates(
    policy: &SigmaPolicy,
    ctx: &Context,
    series: &TimeSeries,
    devs: &[f64],
) -> Result<Vec<f64>> {
    let ppy = ctx.periods_per_year();
    let n = devs.len();
    let mut sigmas = vec![0.0; n];
    match policy {
        SigmaPolicy::PerPeriod => {
            for position in 0..ppy {
                let indices = series.position_indices(position);
                let sigma = sigma_of(indices.iter().map(|&i| devs[i]));
                for &i in &indices {
                    sigmas[i] = sigma;
                }
            }
        }
        SigmaPolicy::SlidingWindows => {
            let first_year = series.domain().period_at(0).year;
            let last_year = series.domain().period_at(n - 1).year;
            let years = (last_year - first_year + 1) as usize;
            let year_of: Vec<usize> = (0..n)
                .map(|i| (series.domain().period_at(i).year - first_year) as usize)
                .collect();
            if years < 5 {
                let sigma = sigma_of(devs.iter().cloned());
                sigmas.fill(sigma);
            } else {
                for year in 0..years {
                    let center = year.clamp(2, years - 3);
                    let window = center - 2..=center + 2;
                    let sigma = sigma_of(
                        devs.iter()
                            .enumerate()
                            .filter(|(i, _)| window.contains(&year_of[*i]))
                            .map(|(_, &d)| d),
                    );
                    for i in 0..n {
                        if year_of[i] == year {
                            sigmas[i] = sigma;
                        }
                    }
                }
            }
        }
        SigmaPolicy::Grouped(groups) => {
            if groups.len() != ppy {
                return Err(X11Error::SigmaGroupCount {
                    required: ppy,
                    actual: groups.len(),
                });
            }
            // Labels beyond {0, 1} were rejected when the policy resolved.
            for group in 0..2 {
                let sigma = sigma_of(
                    devs.iter()
                        .enumerate()
                        .filter(|(i, _)| groups[series.domain().position_at(*i)] == group)
                        .map(|(_, &d)| d),
                );
                for i in 0..n {
                    if groups[series.domain().position_at(i)] == group {
                        sigmas[i] = sigma;
                    }
                }
            }
        }
        // Resolved before this point.
        SigmaPolicy::CochranPretest => unreachable!("pre-test must be resolved before estimation"),
    }
    Ok(sigmas)
}
