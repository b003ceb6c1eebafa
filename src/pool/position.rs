use crate::Q128;
use crate::error::{Error, MathError, PoolError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::{mul_div, to_u128};
use alloy_primitives::{Address, U256};

/// Coordinates of a position inside one pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionKey {
    pub fn new(owner: Address, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            owner,
            tick_lower,
            tick_upper,
        }
    }
}

/// Liquidity owned in a tick range and the fee growth it was last credited at.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub liquidity: u128,
    pub fee_growth_inside_0_last_x128: U256,
    pub fee_growth_inside_1_last_x128: U256,
}

impl Position {
    /// Credits fees earned since the last update, then applies `liquidity_delta`
    /// and snapshots the current fee growth inside the range.
    ///
    /// Returns the fees owed in each currency, rounded down.
    pub fn update(
        &mut self,
        liquidity_delta: i128,
        fee_growth_inside_0_x128: U256,
        fee_growth_inside_1_x128: U256,
    ) -> Result<(u128, u128), Error> {
        let liquidity = self.liquidity;

        if liquidity_delta == 0 && liquidity == 0 {
            return Err(PoolError::CannotUpdateEmptyPosition.into());
        }
        let liquidity_next = add_delta(liquidity, liquidity_delta).map_err(|e| match e {
            MathError::Underflow => Error::PoolError(PoolError::InsufficientLiquidity),
            other => Error::MathError(other),
        })?;

        let fees_owed_0 = to_u128(mul_div(
            fee_growth_inside_0_x128.wrapping_sub(self.fee_growth_inside_0_last_x128),
            U256::from(liquidity),
            Q128,
        )?)?;
        let fees_owed_1 = to_u128(mul_div(
            fee_growth_inside_1_x128.wrapping_sub(self.fee_growth_inside_1_last_x128),
            U256::from(liquidity),
            Q128,
        )?)?;

        self.liquidity = liquidity_next;
        self.fee_growth_inside_0_last_x128 = fee_growth_inside_0_x128;
        self.fee_growth_inside_1_last_x128 = fee_growth_inside_1_x128;

        Ok((fees_owed_0, fees_owed_1))
    }
}
