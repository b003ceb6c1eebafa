use crate::error::MathError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed per-currency amounts from the caller's point of view.
///
/// Negative means the caller owes the engine, positive means the engine owes
/// the caller.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceDelta {
    amount0: i128,
    amount1: i128,
}

impl BalanceDelta {
    pub const ZERO: BalanceDelta = BalanceDelta {
        amount0: 0,
        amount1: 0,
    };

    #[inline]
    pub const fn new(amount0: i128, amount1: i128) -> Self {
        Self { amount0, amount1 }
    }

    #[inline]
    pub const fn amount0(&self) -> i128 {
        self.amount0
    }

    #[inline]
    pub const fn amount1(&self) -> i128 {
        self.amount1
    }

    pub fn checked_add(self, other: BalanceDelta) -> Result<BalanceDelta, MathError> {
        Ok(BalanceDelta {
            amount0: self
                .amount0
                .checked_add(other.amount0)
                .ok_or(MathError::Overflow)?,
            amount1: self
                .amount1
                .checked_add(other.amount1)
                .ok_or(MathError::Overflow)?,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.amount0 == 0 && self.amount1 == 0
    }
}

impl fmt::Display for BalanceDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.amount0, self.amount1)
    }
}
