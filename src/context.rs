//! Decomposition mode and run context.
//!
//! [`DecompositionMode`] fixes the two binary operators used throughout the
//! pipeline: `combine` (add or multiply) and `separate` (subtract or divide).
//! [`Context`] bundles the mode with the annual frequency and the
//! forecast/backcast horizons, owns the operator dispatch, and performs the
//! one-time validity check at kernel entry.
//!
//! Log-additive series are worked on in log-space, where the operators are the
//! additive pair; the kernel converts published tables back at defined points.

use crate::error::{Result, X11Error};
use crate::timeseries::{Frequency, TimeSeries};

/// Arithmetic of the decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionMode {
    /// series = trend + seasonal + irregular
    Additive,
    /// series = trend * seasonal * irregular
    #[default]
    Multiplicative,
    /// log(series) = trend + seasonal + irregular; published tables are
    /// exponentiated back to the original scale.
    LogAdditive,
    /// series = trend * (seasonal + irregular - 1); operators behave like the
    /// multiplicative pair.
    PseudoAdditive,
}

impl DecompositionMode {
    /// Whether the working arithmetic is the additive pair.
    ///
    /// Log-additive series are logged at entry, so their working arithmetic
    /// is additive even though the published tables are multiplicative.
    #[inline]
    pub fn is_additive_arithmetic(self) -> bool {
        matches!(
            self,
            DecompositionMode::Additive | DecompositionMode::LogAdditive
        )
    }

    /// Whether the input must be strictly positive.
    #[inline]
    pub fn requires_positive_input(self) -> bool {
        !matches!(self, DecompositionMode::Additive)
    }

    /// Short name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            DecompositionMode::Additive => "additive",
            DecompositionMode::Multiplicative => "multiplicative",
            DecompositionMode::LogAdditive => "log-additive",
            DecompositionMode::PseudoAdditive => "pseudo-additive",
        }
    }
}

/// Minimum amount of data accepted by the kernel, in whole years.
pub const MIN_YEARS: usize = 3;

/// Immutable per-run context: mode, frequency and extension horizons.
///
/// One context is created per decomposition call and passed by reference into
/// each stage; it carries no mutable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Context {
    mode: DecompositionMode,
    frequency: Frequency,
    forecast_horizon: usize,
    backcast_horizon: usize,
}

impl Context {
    /// Build a context. Horizons follow the configuration convention:
    /// a non-negative value counts absolute periods, a negative value counts
    /// years (`-2` = two years = `2 * frequency` periods).
    pub fn new(
        mode: DecompositionMode,
        frequency: Frequency,
        forecast_horizon: i32,
        backcast_horizon: i32,
    ) -> Self {
        Self {
            mode,
            frequency,
            forecast_horizon: resolve_horizon(forecast_horizon, frequency),
            backcast_horizon: resolve_horizon(backcast_horizon, frequency),
        }
    }

    /// Decomposition mode.
    #[inline]
    pub fn mode(&self) -> DecompositionMode {
        self.mode
    }

    /// Annual frequency.
    #[inline]
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Periods per year, as a convenience.
    #[inline]
    pub fn periods_per_year(&self) -> usize {
        self.frequency.periods_per_year()
    }

    /// Forecast horizon in absolute periods.
    #[inline]
    pub fn forecast_horizon(&self) -> usize {
        self.forecast_horizon
    }

    /// Backcast horizon in absolute periods.
    #[inline]
    pub fn backcast_horizon(&self) -> usize {
        self.backcast_horizon
    }

    /// Neutral element of the working arithmetic: 0 additive, 1 otherwise.
    /// Deviations of the irregular are measured around this mean.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.mode.is_additive_arithmetic() {
            0.0
        } else {
            1.0
        }
    }

    /// Scalar `combine`: add or multiply.
    #[inline]
    pub fn combine(&self, x: f64, y: f64) -> f64 {
        if self.mode.is_additive_arithmetic() {
            x + y
        } else {
            x * y
        }
    }

    /// Scalar `separate`: subtract or divide.
    #[inline]
    pub fn separate(&self, x: f64, y: f64) -> f64 {
        if self.mode.is_additive_arithmetic() {
            x - y
        } else {
            x / y
        }
    }

    /// Pointwise `combine` over the intersection of the two series.
    ///
    /// The domains of intermediate tables always overlap by construction;
    /// calling this with disjoint series is a programming error.
    pub fn combine_series(&self, x: &TimeSeries, y: &TimeSeries) -> TimeSeries {
        x.pointwise(y, |a, b| self.combine(a, b))
            .expect("combine: series domains do not overlap")
    }

    /// Pointwise `separate` over the intersection of the two series.
    pub fn separate_series(&self, x: &TimeSeries, y: &TimeSeries) -> TimeSeries {
        x.pointwise(y, |a, b| self.separate(a, b))
            .expect("separate: series domains do not overlap")
    }

    /// Entry validity check: frequency match, at least [`MIN_YEARS`] whole
    /// years of data, no missing values, and all-positive values when the
    /// mode is not additive.
    pub fn validate(&self, series: &TimeSeries) -> Result<()> {
        if series.frequency() != self.frequency {
            return Err(X11Error::FrequencyMismatch {
                spec: self.periods_per_year(),
                series: series.frequency().periods_per_year(),
            });
        }
        let required = MIN_YEARS * self.periods_per_year();
        if series.len() < required {
            return Err(X11Error::InsufficientData {
                required,
                actual: series.len(),
            });
        }
        if let Some(index) = series.first_missing() {
            return Err(X11Error::MissingValue(index));
        }
        if self.mode.requires_positive_input() {
            for (index, &value) in series.values().iter().enumerate() {
                if value <= 0.0 {
                    return Err(X11Error::NonPositiveValue {
                        index,
                        value,
                        mode: self.mode.name(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn resolve_horizon(horizon: i32, frequency: Frequency) -> usize {
    if horizon >= 0 {
        horizon as usize
    } else {
        (-horizon) as usize * frequency.periods_per_year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::{Domain, Period};

    fn series(mode_positive: bool, length: usize) -> TimeSeries {
        let domain = Domain::new(Period::new(2000, 0), length, Frequency::Monthly);
        let base = if mode_positive { 10.0 } else { 0.0 };
        TimeSeries::new(domain, (0..length).map(|i| base + (i % 5) as f64).collect())
    }

    #[test]
    fn test_operator_pairs_invert() {
        for mode in [
            DecompositionMode::Additive,
            DecompositionMode::Multiplicative,
            DecompositionMode::LogAdditive,
            DecompositionMode::PseudoAdditive,
        ] {
            let ctx = Context::new(mode, Frequency::Monthly, 0, 0);
            let (x, y) = (7.25, 1.5);
            let back = ctx.combine(ctx.separate(x, y), y);
            assert!(
                (back - x).abs() < 1e-12,
                "combine(separate(x,y),y) != x for {:?}",
                mode
            );
        }
    }

    #[test]
    fn test_mean_by_mode() {
        let add = Context::new(DecompositionMode::Additive, Frequency::Monthly, 0, 0);
        let mul = Context::new(DecompositionMode::Multiplicative, Frequency::Monthly, 0, 0);
        assert_eq!(add.mean(), 0.0);
        assert_eq!(mul.mean(), 1.0);
        // Log-additive works in log-space: additive arithmetic.
        let log = Context::new(DecompositionMode::LogAdditive, Frequency::Monthly, 0, 0);
        assert_eq!(log.mean(), 0.0);
    }

    #[test]
    fn test_horizon_convention() {
        let ctx = Context::new(DecompositionMode::Additive, Frequency::Monthly, 18, -2);
        assert_eq!(ctx.forecast_horizon(), 18);
        assert_eq!(ctx.backcast_horizon(), 24);

        let ctx = Context::new(DecompositionMode::Additive, Frequency::Quarterly, -1, 0);
        assert_eq!(ctx.forecast_horizon(), 4);
        assert_eq!(ctx.backcast_horizon(), 0);
    }

    #[test]
    fn test_validate_length() {
        let ctx = Context::new(DecompositionMode::Additive, Frequency::Monthly, 0, 0);
        assert!(ctx.validate(&series(true, 36)).is_ok());
        assert!(matches!(
            ctx.validate(&series(true, 35)),
            Err(X11Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_validate_positivity() {
        let mul = Context::new(DecompositionMode::Multiplicative, Frequency::Monthly, 0, 0);
        let add = Context::new(DecompositionMode::Additive, Frequency::Monthly, 0, 0);
        let with_zero = series(false, 36);
        assert!(add.validate(&with_zero).is_ok());
        assert!(matches!(
            mul.validate(&with_zero),
            Err(X11Error::NonPositiveValue { .. })
        ));
    }

    #[test]
    fn test_validate_missing_and_frequency() {
        let ctx = Context::new(DecompositionMode::Additive, Frequency::Monthly, 0, 0);
        let domain = Domain::new(Period::new(2000, 0), 36, Frequency::Monthly);
        let mut values = vec![1.0; 36];
        values[10] = f64::NAN;
        assert_eq!(
            ctx.validate(&TimeSeries::new(domain, values)),
            Err(X11Error::MissingValue(10))
        );

        let quarterly = TimeSeries::new(
            Domain::new(Period::new(2000, 0), 16, Frequency::Quarterly),
            vec![1.0; 16],
        );
        assert!(matches!(
            ctx.validate(&quarterly),
            Err(X11Error::FrequencyMismatch { .. })
        ));
    }
}
