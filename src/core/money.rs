//! Fixed-point monetary amounts
//!
//! Every monetary field (store rent, payment amount, revenue buckets) is an
//! [`Amount`]: an exact base-10 decimal with 4 fractional digits and at most
//! 18 significant digits. No floating-point value ever enters or leaves this
//! type except through its decimal text form.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by every amount
pub const AMOUNT_SCALE: u32 = 4;

/// Total number of digits an amount may carry
pub const AMOUNT_PRECISION: u32 = 18;

/// Smallest magnitude with more integer digits than an amount may carry
const INTEGER_LIMIT: i64 = 10_i64.pow(AMOUNT_PRECISION - AMOUNT_SCALE);

/// Why a piece of text is not a valid amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountFormatError {
    #[error("amount is empty")]
    Empty,

    #[error("amount is not a plain decimal number")]
    Malformed,

    #[error("amount has more than 4 fractional digits")]
    TooManyFractionalDigits,

    #[error("amount has more than 14 integer digits")]
    TooManyIntegerDigits,
}

/// Exact monetary amount with 4 fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

impl Amount {
    /// Exact zero at the ledger scale
    pub fn zero() -> Self {
        Self(Decimal::new(0, AMOUNT_SCALE))
    }

    /// Parse a plain decimal string such as `"2500"`, `"-5"` or `"12.3456"`
    ///
    /// Sign is accepted here; positivity is a separate business rule
    /// checked by the caller (rent must be non-negative, payments positive).
    pub fn parse(text: &str) -> Result<Self, AmountFormatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AmountFormatError::Empty);
        }

        // Decimal's parser also accepts `_` separators, so the shape is
        // checked here first: optional sign, digits, at most one point.
        let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if (integer.is_empty() && fraction.is_empty())
            || !integer.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(AmountFormatError::Malformed);
        }
        if fraction.len() > AMOUNT_SCALE as usize {
            return Err(AmountFormatError::TooManyFractionalDigits);
        }

        // Only overflow is left to fail here
        let value =
            Decimal::from_str_exact(text).map_err(|_| AmountFormatError::TooManyIntegerDigits)?;
        if value.abs() >= Decimal::from(INTEGER_LIMIT) {
            return Err(AmountFormatError::TooManyIntegerDigits);
        }

        Ok(Self::from_decimal_unchecked(value))
    }

    /// Build an amount from whole currency units
    pub fn from_units(units: i64) -> Self {
        Self::from_decimal_unchecked(Decimal::from(units))
    }

    fn from_decimal_unchecked(mut value: Decimal) -> Self {
        value.rescale(AMOUNT_SCALE);
        Self(value)
    }

    /// The underlying decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Exact addition; `None` when the result leaves the decimal range
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self::from_decimal_unchecked)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.to_string()
    }
}
