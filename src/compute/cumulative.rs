//! Accumulated attribute values.

use serde::{Deserialize, Serialize};

/// Accumulator of additive and multiplicative gene contributions.
///
/// Reads as `sum * product`. An accumulator that was never written reads as
/// zero, which [`has_value`](Self::has_value) distinguishes from a written zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativeValue {
    sum: f32,
    product: f32,
    additions: u32,
    multiplications: u32,
}

impl Default for CumulativeValue {
    fn default() -> Self {
        Self {
            sum: 0.0,
            product: 1.0,
            additions: 0,
            multiplications: 0,
        }
    }
}

impl CumulativeValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contribution.
    pub fn add(&mut self, value: f32) {
        self.sum += value;
        self.additions += 1;
    }

    /// Multiply the accumulated value.
    pub fn multiply(&mut self, factor: f32) {
        self.product *= factor;
        self.multiplications += 1;
    }

    /// Apply either kind of contribution.
    pub fn apply(&mut self, value: f32, multiplicative: bool) {
        if multiplicative {
            self.multiply(value);
        } else {
            self.add(value);
        }
    }

    /// Whether any contribution was ever recorded.
    #[inline]
    pub fn has_value(&self) -> bool {
        self.additions + self.multiplications > 0
    }

    /// Accumulated value; zero when unset.
    #[inline]
    pub fn get(&self) -> f32 {
        if self.has_value() {
            self.sum * self.product
        } else {
            0.0
        }
    }

    /// Value if set, otherwise `default`.
    pub fn get_or(&self, default: f32) -> f32 {
        if self.has_value() { self.get() } else { default }
    }

    /// Accumulated value clamped between `min` and `max`. Reversed bounds
    /// are swapped rather than rejected.
    pub fn clamp(&self, min: f32, max: f32) -> f32 {
        clamp_between(self.get(), min, max)
    }

    /// Number of additive contributions.
    pub fn additions(&self) -> u32 {
        self.additions
    }

    /// Number of multiplicative contributions.
    pub fn multiplications(&self) -> u32 {
        self.multiplications
    }
}

/// Clamp `value` between two bounds given in either order. A NaN bound is
/// ignored.
pub(crate) fn clamp_between(value: f32, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    value.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_reads_zero() {
        let value = CumulativeValue::new();
        assert!(!value.has_value());
        assert_eq!(value.get(), 0.0);
        assert_eq!(value.clamp(1.0, 2.0), 1.0);
        assert_eq!(value.get_or(0.5), 0.5);
    }

    #[test]
    fn test_deliberate_zero_is_set() {
        let mut value = CumulativeValue::new();
        value.add(0.0);
        assert!(value.has_value());
        assert_eq!(value.get_or(0.5), 0.0);
    }

    #[test]
    fn test_sum_times_product() {
        let mut value = CumulativeValue::new();
        value.add(1.0);
        value.add(2.0);
        value.multiply(2.0);
        assert_eq!(value.get(), 6.0);
        assert_eq!(value.additions(), 2);
        assert_eq!(value.multiplications(), 1);
    }

    #[test]
    fn test_multiply_only_reads_zero_sum() {
        let mut value = CumulativeValue::new();
        value.apply(3.0, true);
        assert!(value.has_value());
        assert_eq!(value.get(), 0.0);
    }

    #[test]
    fn test_clamp_accepts_reversed_bounds() {
        let mut value = CumulativeValue::new();
        value.add(5.0);
        assert_eq!(value.clamp(2.0, 1.0), 2.0);
        assert_eq!(value.clamp(1.0, 2.0), 2.0);
        assert_eq!(clamp_between(0.5, 0.9, 0.1), 0.5);
        assert_eq!(clamp_between(0.05, 0.9, 0.1), 0.1);
    }
}
