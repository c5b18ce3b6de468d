//! # Fractions
//!
//! Exact decimal fractions for policy parameters such as `"0.05"`.
//! Arithmetic is integer-only so every replica computes the same result.

use crate::errors::{CcvError, CcvResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of decimal places accepted when parsing.
const MAX_DECIMALS: u32 = 18;

/// A non-negative exact fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fraction {
    numerator: u64,
    denominator: u64,
}

impl Fraction {
    /// Create a fraction; the denominator must be non-zero.
    pub fn new(numerator: u64, denominator: u64) -> CcvResult<Self> {
        if denominator == 0 {
            return Err(CcvError::InvalidParams(
                "fraction denominator cannot be zero".to_string(),
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Zero.
    pub const fn zero() -> Self {
        Self {
            numerator: 0,
            denominator: 1,
        }
    }

    /// `percent / 100`.
    pub const fn percent(percent: u64) -> Self {
        Self {
            numerator: percent,
            denominator: 100,
        }
    }

    /// True if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// True if `0 < self <= 1`.
    pub fn is_positive_unit(&self) -> bool {
        self.numerator > 0 && self.numerator <= self.denominator
    }

    /// True if `0 <= self <= 1`.
    pub fn is_unit(&self) -> bool {
        self.numerator <= self.denominator
    }

    /// `floor(self * value)`, saturating at the `i64` range.
    pub fn mul_floor(&self, value: i64) -> i64 {
        let product = i128::from(value) * i128::from(self.numerator);
        let quotient = product.div_euclid(i128::from(self.denominator));
        quotient.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

impl FromStr for Fraction {
    type Err = CcvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CcvError::InvalidParams(format!("invalid decimal {s:?}"));
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() || frac_part.len() as u32 > MAX_DECIMALS {
            return Err(invalid());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let denominator = 10u64.pow(frac_part.len() as u32);
        let int_value: u64 = int_part.parse().map_err(|_| invalid())?;
        let frac_value: u64 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid())?
        };
        let numerator = int_value
            .checked_mul(denominator)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(invalid)?;
        Self::new(numerator, denominator)
    }
}

impl TryFrom<String> for Fraction {
    type Error = CcvError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fraction> for String {
    fn from(f: Fraction) -> Self {
        f.to_string()
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int_part = self.numerator / self.denominator;
        let mut rem = self.numerator % self.denominator;
        if rem == 0 {
            return write!(f, "{int_part}");
        }
        write!(f, "{int_part}.")?;
        let mut digits = 0;
        while rem != 0 && digits < MAX_DECIMALS {
            rem *= 10;
            write!(f, "{}", rem / self.denominator)?;
            rem %= self.denominator;
            digits += 1;
        }
        Ok(())
    }
}
