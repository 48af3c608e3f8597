//! Time-series buffer and domain arithmetic.
//!
//! [`TimeSeries`] is an ordered, equally-spaced sequence of real values with a
//! start period, an annual frequency (4 or 12) and a length. Series are
//! immutable by convention: every derived series (filtering, arithmetic,
//! sub-ranging, extension) allocates a new buffer and never mutates its input.
//!
//! [`Domain`] is the (start, length, frequency) triple; it supports sub-range
//! selection by absolute period, extension/truncation at either end, and
//! translation by an integer number of periods. Periods are aligned through an
//! absolute period id (`year * frequency + position`), so two series with the
//! same frequency can always be intersected exactly.

use crate::error::{Result, X11Error};

/// Annual frequency of an equally-spaced series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// 4 periods per year.
    Quarterly,
    /// 12 periods per year.
    Monthly,
}

impl Frequency {
    /// Number of periods per year.
    #[inline]
    pub fn periods_per_year(self) -> usize {
        match self {
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
        }
    }

    /// Build from a period count; anything other than 4 or 12 is a
    /// configuration error.
    pub fn from_periods(periods: usize) -> Result<Self> {
        match periods {
            4 => Ok(Frequency::Quarterly),
            12 => Ok(Frequency::Monthly),
            other => Err(X11Error::UnsupportedFrequency(other)),
        }
    }
}

/// Calendar period: year plus zero-based position within the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    /// Calendar year.
    pub year: i32,
    /// Zero-based position within the year (0..frequency).
    pub position: u32,
}

impl Period {
    /// Create a period; `position` must be < frequency (checked by callers
    /// that know the frequency).
    pub fn new(year: i32, position: u32) -> Self {
        Self { year, position }
    }

    /// Absolute period id for a given frequency. Total order over periods.
    #[inline]
    pub fn id(self, freq: Frequency) -> i64 {
        self.year as i64 * freq.periods_per_year() as i64 + self.position as i64
    }

    /// Inverse of [`Period::id`].
    #[inline]
    pub fn from_id(id: i64, freq: Frequency) -> Self {
        let ppy = freq.periods_per_year() as i64;
        Self {
            year: id.div_euclid(ppy) as i32,
            position: id.rem_euclid(ppy) as u32,
        }
    }
}

/// The (start, length, frequency) triple describing where a series lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    start: Period,
    length: usize,
    frequency: Frequency,
}

impl Domain {
    /// Create a domain starting at `start` with `length` periods.
    pub fn new(start: Period, length: usize, frequency: Frequency) -> Self {
        Self {
            start,
            length,
            frequency,
        }
    }

    /// First period of the domain.
    #[inline]
    pub fn start(&self) -> Period {
        self.start
    }

    /// Number of periods in the domain.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Annual frequency.
    #[inline]
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Absolute id of the first period.
    #[inline]
    pub fn start_id(&self) -> i64 {
        self.start.id(self.frequency)
    }

    /// Absolute id one past the last period.
    #[inline]
    pub fn end_id(&self) -> i64 {
        self.start_id() + self.length as i64
    }

    /// Period at a zero-based index into the domain.
    #[inline]
    pub fn period_at(&self, index: usize) -> Period {
        Period::from_id(self.start_id() + index as i64, self.frequency)
    }

    /// Calendar position (0..frequency) of the observation at `index`.
    #[inline]
    pub fn position_at(&self, index: usize) -> usize {
        ((self.start_id() + index as i64).rem_euclid(self.frequency.periods_per_year() as i64))
            as usize
    }

    /// Index of an absolute period, if it falls inside the domain.
    pub fn index_of(&self, period: Period) -> Option<usize> {
        let id = period.id(self.frequency);
        if id >= self.start_id() && id < self.end_id() {
            Some((id - self.start_id()) as usize)
        } else {
            None
        }
    }

    /// Translate the whole domain by a signed number of periods.
    pub fn translate(&self, offset: i64) -> Domain {
        Domain::new(
            Period::from_id(self.start_id() + offset, self.frequency),
            self.length,
            self.frequency,
        )
    }

    /// Extend the domain by whole-period counts at the leading and trailing end.
    pub fn extend(&self, leading: usize, trailing: usize) -> Domain {
        Domain::new(
            Period::from_id(self.start_id() - leading as i64, self.frequency),
            self.length + leading + trailing,
            self.frequency,
        )
    }

    /// Drop periods at the leading and trailing end. Saturates at an empty
    /// domain anchored at the (possibly shifted) start.
    pub fn shrink(&self, leading: usize, trailing: usize) -> Domain {
        let removed = (leading + trailing).min(self.length);
        let lead = leading.min(self.length);
        Domain::new(
            Period::from_id(self.start_id() + lead as i64, self.frequency),
            self.length - removed,
            self.frequency,
        )
    }

    /// Intersection with another domain of the same frequency.
    pub fn intersection(&self, other: &Domain) -> Option<Domain> {
        if self.frequency != other.frequency {
            return None;
        }
        let start = self.start_id().max(other.start_id());
        let end = self.end_id().min(other.end_id());
        if start >= end {
            return None;
        }
        Some(Domain::new(
            Period::from_id(start, self.frequency),
            (end - start) as usize,
            self.frequency,
        ))
    }

    /// Number of whole years covered, rounded down.
    #[inline]
    pub fn whole_years(&self) -> usize {
        self.length / self.frequency.periods_per_year()
    }

    /// Largest trailing sub-domain made of whole calendar years (ending on the
    /// last complete year of the domain). `None` when not even one whole
    /// calendar year is covered.
    pub fn trailing_whole_years(&self) -> Option<Domain> {
        let ppy = self.frequency.periods_per_year() as i64;
        // Last period with position == frequency - 1.
        let last = self.end_id() - 1;
        let aligned_end = last - (last + 1).rem_euclid(ppy) + 1;
        if aligned_end <= self.start_id() {
            return None;
        }
        let span = aligned_end - self.start_id();
        let years = span / ppy;
        if years == 0 {
            return None;
        }
        Some(Domain::new(
            Period::from_id(aligned_end - years * ppy, self.frequency),
            (years * ppy) as usize,
            self.frequency,
        ))
    }
}

/// Ordered, equally-spaced series of real values over a [`Domain`].
///
/// Immutable by convention: all operations return freshly allocated series.
/// NaN is only ever used as the "no value" sentinel inside sparse correction
/// tables; kernel inputs are checked NaN-free once at entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    domain: Domain,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series over `domain`; `values.len()` must equal the domain
    /// length. Length mismatch is a programming error.
    pub fn new(domain: Domain, values: Vec<f64>) -> Self {
        assert_eq!(
            domain.length(),
            values.len(),
            "series length {} does not match domain length {}",
            values.len(),
            domain.length()
        );
        Self { domain, values }
    }

    /// Constant series over `domain`.
    pub fn constant(domain: Domain, value: f64) -> Self {
        Self {
            values: vec![value; domain.length()],
            domain,
        }
    }

    /// Domain of the series.
    #[inline]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Underlying values in period order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Annual frequency.
    #[inline]
    pub fn frequency(&self) -> Frequency {
        self.domain.frequency()
    }

    /// Value at a zero-based index.
    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Value at an absolute period, if inside the domain.
    pub fn value_at(&self, period: Period) -> Option<f64> {
        self.domain.index_of(period).map(|i| self.values[i])
    }

    /// Index of the first missing (NaN) value, if any.
    pub fn first_missing(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_nan())
    }

    /// Sub-series over a target domain. `None` when the target is not fully
    /// contained in this series.
    pub fn select(&self, target: &Domain) -> Option<TimeSeries> {
        if target.frequency() != self.frequency()
            || target.start_id() < self.domain.start_id()
            || target.end_id() > self.domain.end_id()
        {
            return None;
        }
        let offset = (target.start_id() - self.domain.start_id()) as usize;
        Some(TimeSeries::new(
            *target,
            self.values[offset..offset + target.length()].to_vec(),
        ))
    }

    /// Drop observations at the leading and trailing end.
    pub fn drop_ends(&self, leading: usize, trailing: usize) -> TimeSeries {
        let domain = self.domain.shrink(leading, trailing);
        let lead = leading.min(self.values.len());
        TimeSeries::new(domain, self.values[lead..lead + domain.length()].to_vec())
    }

    /// Extend the series with explicit values at both ends.
    pub fn extend_with(&self, leading: &[f64], trailing: &[f64]) -> TimeSeries {
        let domain = self.domain.extend(leading.len(), trailing.len());
        let mut values = Vec::with_capacity(domain.length());
        values.extend_from_slice(leading);
        values.extend_from_slice(&self.values);
        values.extend_from_slice(trailing);
        TimeSeries::new(domain, values)
    }

    /// Apply a function to every value, keeping the domain.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> TimeSeries {
        TimeSeries::new(self.domain, self.values.iter().map(|&v| f(v)).collect())
    }

    /// Pointwise binary operation over the intersection of the two domains.
    /// `None` when the domains do not overlap.
    pub fn pointwise(&self, other: &TimeSeries, f: impl Fn(f64, f64) -> f64) -> Option<TimeSeries> {
        let domain = self.domain.intersection(other.domain())?;
        let a = self.select(&domain)?;
        let b = other.select(&domain)?;
        Some(TimeSeries::new(
            domain,
            a.values
                .iter()
                .zip(b.values.iter())
                .map(|(&x, &y)| f(x, y))
                .collect(),
        ))
    }

    /// Indices of the observations at a given calendar position, in year order.
    pub fn position_indices(&self, position: usize) -> Vec<usize> {
        let ppy = self.frequency().periods_per_year();
        let first = self.domain.position_at(0);
        let offset = (position + ppy - first) % ppy;
        (offset..self.len()).step_by(ppy).collect()
    }

    /// Values of the observations at a given calendar position, in year order.
    pub fn position_values(&self, position: usize) -> Vec<f64> {
        self.position_indices(position)
            .into_iter()
            .map(|i| self.values[i])
            .collect()
    }

    /// Average of all observations.
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.values.iter().sum::<f64>() / self.len() as f64
    }

    /// Smallest value.
    pub fn min(&self) -> f64 {
        self.values.iter().cloned().fold(f64::INFINITY, f64::min)
    }
}
