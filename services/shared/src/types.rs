/// Type-safe wrappers for wagering primitives
///
/// Amounts are whole credits in the wallet's minor unit. The value is signed
/// so a server-reported negative balance can be represented and logged as an
/// anomaly instead of failing to deserialize.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount overflow in operation")]
    Overflow,

    #[error("amount must be positive, got {0}")]
    NotPositive(i64),
}

/// Credit amount with overflow-checked arithmetic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credits(i64);

impl Credits {
    pub const ZERO: Credits = Credits(0);

    pub fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Create a stake or transfer amount, rejecting zero and negatives
    pub fn positive(amount: i64) -> Result<Self, AmountError> {
        if amount <= 0 {
            return Err(AmountError::NotPositive(amount));
        }
        Ok(Self(amount))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(&self, other: Credits) -> Result<Self, AmountError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    pub fn checked_sub(&self, other: Credits) -> Result<Self, AmountError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// Scale by a paytable multiplier, truncating toward zero
    pub fn scaled(&self, multiplier: f64) -> Result<Self, AmountError> {
        let scaled = (self.0 as f64 * multiplier).trunc();
        if !scaled.is_finite() || scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
            return Err(AmountError::Overflow);
        }
        Ok(Self(scaled as i64))
    }
}

impl From<i64> for Credits {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Credits> for i64 {
    fn from(amount: Credits) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Credits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
