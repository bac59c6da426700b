//! # Stepped Range Validation
//!
//! Calibration parameters live in closed numeric ranges with a fixed step
//! (`low <= v < high`, `(v - low) % step == 0`) and are sent to the printer
//! normalized to register units via `(v - low) / step`.

use crate::error::BrasaError;

/// A closed, stepped numeric range for one named parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub field: &'static str,
    /// Smallest valid value
    pub low: u32,
    /// Smallest invalid value; values must be strictly below
    pub high: u32,
    /// Valid values are `low + k * step`
    pub step: u32,
}

impl Range {
    pub const fn new(field: &'static str, low: u32, high: u32, step: u32) -> Self {
        Range {
            field,
            low,
            high,
            step,
        }
    }

    /// Whether `value` lies in the range on a step boundary.
    pub fn contains(&self, value: u32) -> bool {
        self.low <= value && value < self.high && (value - self.low) % self.step == 0
    }

    /// Validate `value` and normalize it to register units.
    ///
    /// Fails with [`BrasaError::Range`] carrying the field name and bounds.
    pub fn convert(&self, value: u32) -> Result<u16, BrasaError> {
        if !self.contains(value) {
            return Err(BrasaError::Range {
                field: self.field,
                value,
                low: self.low,
                high: self.high,
                step: self.step,
            });
        }
        Ok(((value - self.low) / self.step) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_different_ranges() {
        for &(low, high, step) in &[(1, 10, 1), (2, 5, 2), (15, 50, 3), (2, 10, 1)] {
            let range = Range::new("value", low, high, step);
            let mut v = low;
            while v < high {
                assert!(range.contains(v), "{} in [{}, {}) step {}", v, low, high, step);
                v += step;
            }
            assert!(!range.contains(high));
            assert!(!range.contains(low - 1));
        }
    }

    #[test]
    fn test_rejects_off_step() {
        let range = Range::new("value", 8, 2056, 8);
        assert!(!range.contains(9));
        assert!(!range.contains(12));
        assert!(range.contains(16));
    }

    #[test]
    fn test_value_conversion() {
        let range = Range::new("max_dots", 8, 2048 + 8, 8);
        assert_eq!(range.convert(64).unwrap(), 7);
        assert_eq!(range.convert(8).unwrap(), 0);
        assert_eq!(range.convert(2048).unwrap(), 255);
    }

    #[test]
    fn test_conversion_errors_carry_bounds() {
        let range = Range::new("max_dots", 8, 2056, 8);
        match range.convert(2056) {
            Err(BrasaError::Range {
                field,
                value,
                low,
                high,
                step,
            }) => {
                assert_eq!(field, "max_dots");
                assert_eq!(value, 2056);
                assert_eq!(low, 8);
                assert_eq!(high, 2056);
                assert_eq!(step, 8);
            }
            other => panic!("expected range error, got {:?}", other),
        }
        assert!(range.convert(7).is_err());
    }
}
