//! Linear filter engine: symmetric moving averages and asymmetric end filters.
//!
//! A [`SymmetricFilter`] of half-width `h` turns `n` input values into
//! `n - 2h` output values by convolution; the caller must supply the margin.
//! An [`AsymmetricFilter`] replaces the unavailable symmetric output at the
//! `h` positions nearest a series boundary. End treatment never re-touches
//! interior values already produced by the symmetric pass.

use crate::timeseries::TimeSeries;

/// Centered moving-average filter with an odd coefficient count.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricFilter {
    weights: Vec<f64>,
}

impl SymmetricFilter {
    /// Create from a coefficient vector; the length must be odd.
    ///
    /// An even length is a programming error: all filter factories in this
    /// crate produce odd lengths by construction.
    pub fn new(weights: Vec<f64>) -> Self {
        assert!(
            weights.len() % 2 == 1,
            "symmetric filter length must be odd, got {}",
            weights.len()
        );
        Self { weights }
    }

    /// Coefficients, ordered from most past to most future.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of coefficients.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false: filters have at least one coefficient.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Half-width `h`; the filter spans `2h + 1` observations.
    #[inline]
    pub fn half_width(&self) -> usize {
        self.weights.len() / 2
    }

    /// Convolve with `input`, producing `input.len() - 2h` values.
    ///
    /// Supplying less input than the filter length is a programming error,
    /// not a recoverable failure.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let len = self.weights.len();
        assert!(
            input.len() >= len,
            "symmetric filter of length {} applied to {} values",
            len,
            input.len()
        );
        (0..input.len() - len + 1)
            .map(|start| dot(&self.weights, &input[start..start + len]))
            .collect()
    }
}

/// Boundary filter with explicit leading/trailing offsets around the target.
///
/// `offset` is the position of the first coefficient relative to the target
/// observation; coefficients are ordered from most past to most future. A
/// right-boundary filter with `q` available future points has
/// `offset = -(h as isize)` and `h + 1 + q` coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymmetricFilter {
    weights: Vec<f64>,
    offset: isize,
}

impl AsymmetricFilter {
    /// Create from coefficients and the offset of the first coefficient.
    pub fn new(weights: Vec<f64>, offset: isize) -> Self {
        assert!(!weights.is_empty(), "asymmetric filter must not be empty");
        Self { weights, offset }
    }

    /// Coefficients, ordered from most past to most future.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Offset of the first coefficient relative to the target.
    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    /// Mirror image: a right-end filter becomes the matching left-end filter.
    pub fn mirror(&self) -> AsymmetricFilter {
        let weights: Vec<f64> = self.weights.iter().rev().cloned().collect();
        let offset = -(self.offset + self.weights.len() as isize - 1);
        AsymmetricFilter::new(weights, offset)
    }

    /// Evaluate at target index `t` of `input`. The window must fit; the
    /// end-point machinery guarantees this by construction.
    pub fn apply_at(&self, input: &[f64], t: usize) -> f64 {
        let start = t as isize + self.offset;
        debug_assert!(
            start >= 0 && (start as usize + self.weights.len()) <= input.len(),
            "asymmetric filter window [{}, {}) out of bounds for {} values",
            start,
            start as isize + self.weights.len() as isize,
            input.len()
        );
        let start = start as usize;
        dot(&self.weights, &input[start..start + self.weights.len()])
    }
}

/// A symmetric filter together with its family of boundary filters.
///
/// `right_ends[q]` is applied at the position with exactly `q` future
/// observations available (`q < h`); left boundaries use the mirror images.
#[derive(Debug, Clone)]
pub struct FilterWithEnds {
    sym: SymmetricFilter,
    right_ends: Vec<AsymmetricFilter>,
}

impl FilterWithEnds {
    /// Bundle a symmetric filter with its right-boundary family; the family
    /// must contain exactly `h` filters, indexed by available future points.
    pub fn new(sym: SymmetricFilter, right_ends: Vec<AsymmetricFilter>) -> Self {
        assert_eq!(
            right_ends.len(),
            sym.half_width(),
            "end-filter family must have h = {} members, got {}",
            sym.half_width(),
            right_ends.len()
        );
        Self { sym, right_ends }
    }

    /// The symmetric filter.
    #[inline]
    pub fn symmetric(&self) -> &SymmetricFilter {
        &self.sym
    }

    /// Filter the full input: symmetric pass over the interior, end filters
    /// over the `h` positions at each boundary. Output length equals input
    /// length.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let h = self.sym.half_width();
        let n = input.len();
        assert!(
            n >= self.sym.len(),
            "filter of length {} applied to {} values",
            self.sym.len(),
            n
        );
        let mut out = vec![0.0; n];
        out[h..n - h].copy_from_slice(&self.sym.apply(input));
        self.fill_ends(input, &mut out);
        out
    }

    /// Fill only the `h` boundary positions of `out`, leaving the interior
    /// untouched.
    pub fn fill_ends(&self, input: &[f64], out: &mut [f64]) {
        let h = self.sym.half_width();
        let n = input.len();
        debug_assert_eq!(n, out.len());
        for q in 0..h {
            // Right boundary: q future points available.
            out[n - 1 - q] = self.right_ends[q].apply_at(input, n - 1 - q);
            // Left boundary: mirrored filter, q past points available.
            out[q] = self.right_ends[q].mirror().apply_at(input, q);
        }
    }
}

/// Apply a symmetric filter to a series; the output domain is shrunk by `h`
/// periods at each end.
pub fn filter_series(filter: &SymmetricFilter, series: &TimeSeries) -> TimeSeries {
    let h = filter.half_width();
    let domain = series.domain().shrink(h, h);
    TimeSeries::new(domain, filter.apply(series.values()))
}

/// Apply a symmetric filter with end treatment; the output covers the full
/// input domain.
pub fn filter_series_with_ends(filter: &FilterWithEnds, series: &TimeSeries) -> TimeSeries {
    TimeSeries::new(*series.domain(), filter.apply(series.values()))
}

#[inline]
fn dot(weights: &[f64], window: &[f64]) -> f64 {
    weights
        .iter()
        .zip(window.iter())
        .map(|(&w, &x)| w * x)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::{Domain, Frequency, Period};

    fn ma3() -> SymmetricFilter {
        SymmetricFilter::new(vec![1.0 / 3.0; 3])
    }

    #[test]
    fn test_symmetric_output_length() {
        let f = ma3();
        let input: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let out = f.apply(&input);
        assert_eq!(out.len(), input.len() - 2 * f.half_width());
        // MA(3) of a linear ramp reproduces the ramp interior.
        for (k, &v) in out.iter().enumerate() {
            assert!((v - (k + 1) as f64).abs() < 1e-12, "out[{}] = {}", k, v);
        }
    }

    #[test]
    #[should_panic(expected = "odd")]
    fn test_even_length_rejected() {
        SymmetricFilter::new(vec![0.5, 0.5]);
    }

    #[test]
    fn test_asymmetric_mirror() {
        // Right-end filter for q = 0: covers t-2..=t.
        let f = AsymmetricFilter::new(vec![0.2, 0.3, 0.5], -2);
        let m = f.mirror();
        assert_eq!(m.weights(), &[0.5, 0.3, 0.2]);
        assert_eq!(m.offset(), 0);

        let input = [1.0, 2.0, 3.0, 4.0];
        // Right end at t = 3: 0.2*2 + 0.3*3 + 0.5*4.
        assert!((f.apply_at(&input, 3) - 3.3).abs() < 1e-12);
        // Left end at t = 0: 0.5*1 + 0.3*2 + 0.2*3.
        assert!((m.apply_at(&input, 0) - 1.7).abs() < 1e-12);
    }

    #[test]
    fn test_ends_fill_without_touching_interior() {
        let sym = ma3();
        let ends = vec![AsymmetricFilter::new(vec![0.4, 0.6], -1)];
        let f = FilterWithEnds::new(sym, ends);

        let input: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let out = f.apply(&input);
        assert_eq!(out.len(), input.len());

        // Interior equals the pure symmetric pass.
        let interior = f.symmetric().apply(&input);
        assert_eq!(&out[1..7], &interior[..]);

        // Boundaries come from the end filters.
        assert!((out[7] - (0.4 * 6.0 + 0.6 * 7.0)).abs() < 1e-12);
        assert!((out[0] - (0.6 * 0.0 + 0.4 * 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_filter_series_domains() {
        let domain = Domain::new(Period::new(2000, 0), 24, Frequency::Monthly);
        let series = TimeSeries::new(domain, (0..24).map(|i| i as f64).collect());

        let shrunk = filter_series(&ma3(), &series);
        assert_eq!(shrunk.domain().start(), Period::new(2000, 1));
        assert_eq!(shrunk.len(), 22);

        let full = filter_series_with_ends(
            &FilterWithEnds::new(ma3(), vec![AsymmetricFilter::new(vec![0.5, 0.5], -1)]),
            &series,
        );
        assert_eq!(full.domain(), series.domain());
    }
}
