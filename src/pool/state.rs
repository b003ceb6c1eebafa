use crate::error::{Error, MathError, PoolError, TickError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::mul_div;
use crate::math::sqrt_price_math::{get_amount_0_delta, get_amount_1_delta};
use crate::math::tick_bitmap::{TickBitmap, flip_tick};
use crate::math::tick_math::{MAX_TICK, MIN_TICK, get_sqrt_price_at_tick, get_tick_at_sqrt_price};
use crate::pool::balance_delta::BalanceDelta;
use crate::pool::fees::ProtocolFee;
use crate::pool::key::PoolId;
use crate::pool::position::{Position, PositionKey};
use crate::pool::tick::{
    Ticks, clear_tick, fee_growth_inside, tick_spacing_to_max_liquidity_per_tick, update_tick,
};
use crate::{FastMap, Q128};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Price and fee configuration of a pool.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    /// Greatest tick whose sqrt price is at or below `sqrt_price_x96`.
    pub tick: i32,
    pub protocol_fee: ProtocolFee,
    pub lp_fee: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyLiquidityParams {
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Positive adds liquidity, negative removes it, zero only collects fees.
    pub liquidity_delta: i128,
}

impl ModifyLiquidityParams {
    #[inline]
    pub fn new(tick_lower: i32, tick_upper: i32, liquidity_delta: i128) -> Self {
        Self {
            tick_lower,
            tick_upper,
            liquidity_delta,
        }
    }
}

/// State of a single pool.
///
/// A `PoolState` is created uninitialized by the manager and becomes live
/// after [`PoolState::initialize`]; it is never torn down.
#[derive(Clone, Debug)]
pub struct PoolState {
    pub id: PoolId,
    pub tick_spacing: i32,
    pub slot0: Slot0,
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    /// Liquidity of the positions whose range contains the current tick.
    pub liquidity: u128,
    pub ticks: Ticks,
    pub tick_bitmap: TickBitmap,
    pub positions: FastMap<PositionKey, Position>,
}

fn check_ticks(tick_lower: i32, tick_upper: i32, tick_spacing: i32) -> Result<(), TickError> {
    if tick_lower >= tick_upper {
        return Err(TickError::TicksMisordered {
            lower: tick_lower,
            upper: tick_upper,
        });
    }
    if tick_lower < MIN_TICK {
        return Err(TickError::TickLowerOutOfBounds(tick_lower));
    }
    if tick_upper > MAX_TICK {
        return Err(TickError::TickUpperOutOfBounds(tick_upper));
    }
    for tick in [tick_lower, tick_upper] {
        if tick % tick_spacing != 0 {
            return Err(TickError::TickMisaligned { tick, tick_spacing });
        }
    }
    Ok(())
}

#[inline]
fn to_signed(amount: u128) -> Result<i128, MathError> {
    i128::try_from(amount).map_err(|_| MathError::SafeCastOverflow)
}

impl PoolState {
    pub fn new(id: PoolId, tick_spacing: i32) -> Self {
        Self {
            id,
            tick_spacing,
            slot0: Slot0::default(),
            fee_growth_global_0_x128: U256::ZERO,
            fee_growth_global_1_x128: U256::ZERO,
            liquidity: 0,
            ticks: Ticks::default(),
            tick_bitmap: TickBitmap::default(),
            positions: FastMap::default(),
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        !self.slot0.sqrt_price_x96.is_zero()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<(), PoolError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(PoolError::PoolNotInitialized(self.id))
        }
    }

    /// Sets the starting price and fees; returns the starting tick.
    pub fn initialize(
        &mut self,
        sqrt_price_x96: U256,
        protocol_fee: ProtocolFee,
        lp_fee: u32,
    ) -> Result<i32, Error> {
        if self.is_initialized() {
            return Err(PoolError::PoolAlreadyInitialized(self.id).into());
        }

        let tick = get_tick_at_sqrt_price(sqrt_price_x96)?;
        self.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
            protocol_fee,
            lp_fee,
        };
        Ok(tick)
    }

    pub fn set_protocol_fee(&mut self, protocol_fee: ProtocolFee) -> Result<(), PoolError> {
        self.ensure_initialized()?;
        self.slot0.protocol_fee = protocol_fee;
        Ok(())
    }

    pub fn set_lp_fee(&mut self, lp_fee: u32) -> Result<(), PoolError> {
        self.ensure_initialized()?;
        self.slot0.lp_fee = lp_fee;
        Ok(())
    }

    pub fn position(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> Option<Position> {
        self.positions
            .get(&PositionKey::new(owner, tick_lower, tick_upper))
            .copied()
    }

    /// Adds or removes `owner`'s liquidity in a tick range and credits the
    /// fees the position earned.
    ///
    /// Returns the caller delta (principal plus fees) and the fee part alone.
    pub fn modify_liquidity(
        &mut self,
        owner: Address,
        params: &ModifyLiquidityParams,
    ) -> Result<(BalanceDelta, BalanceDelta), Error> {
        self.ensure_initialized()?;

        let ModifyLiquidityParams {
            tick_lower,
            tick_upper,
            liquidity_delta,
        } = *params;
        check_ticks(tick_lower, tick_upper, self.tick_spacing)?;

        let key = PositionKey::new(owner, tick_lower, tick_upper);
        let held = self.positions.get(&key).map_or(0, |position| position.liquidity);
        if liquidity_delta < 0 && liquidity_delta.unsigned_abs() > held {
            return Err(PoolError::InsufficientLiquidity.into());
        }

        let tick_current = self.slot0.tick;
        let mut flipped_lower = false;
        let mut flipped_upper = false;

        if liquidity_delta != 0 {
            let lower = update_tick(
                &mut self.ticks,
                tick_lower,
                tick_current,
                liquidity_delta,
                self.fee_growth_global_0_x128,
                self.fee_growth_global_1_x128,
                false,
            )?;
            let upper = update_tick(
                &mut self.ticks,
                tick_upper,
                tick_current,
                liquidity_delta,
                self.fee_growth_global_0_x128,
                self.fee_growth_global_1_x128,
                true,
            )?;

            if liquidity_delta > 0 {
                let max_liquidity_per_tick = tick_spacing_to_max_liquidity_per_tick(self.tick_spacing);
                if lower.liquidity_gross_after > max_liquidity_per_tick {
                    return Err(TickError::TickLiquidityOverflow(tick_lower).into());
                }
                if upper.liquidity_gross_after > max_liquidity_per_tick {
                    return Err(TickError::TickLiquidityOverflow(tick_upper).into());
                }
            }

            if lower.flipped() {
                flip_tick(&mut self.tick_bitmap, tick_lower, self.tick_spacing)?;
                flipped_lower = true;
            }
            if upper.flipped() {
                flip_tick(&mut self.tick_bitmap, tick_upper, self.tick_spacing)?;
                flipped_upper = true;
            }
        }

        let (inside_0, inside_1) = fee_growth_inside(
            &self.ticks,
            tick_lower,
            tick_upper,
            tick_current,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
        );

        let mut position = self.positions.get(&key).copied().unwrap_or_default();
        let (fees_owed_0, fees_owed_1) = position.update(liquidity_delta, inside_0, inside_1)?;
        self.positions.insert(key, position);

        if liquidity_delta < 0 {
            if flipped_lower {
                clear_tick(&mut self.ticks, tick_lower);
            }
            if flipped_upper {
                clear_tick(&mut self.ticks, tick_upper);
            }
        }

        let mut principal = BalanceDelta::ZERO;
        if liquidity_delta != 0 {
            let sqrt_price_lower = get_sqrt_price_at_tick(tick_lower)?;
            let sqrt_price_upper = get_sqrt_price_at_tick(tick_upper)?;
            let sqrt_price = self.slot0.sqrt_price_x96;

            // signed amounts owed to the pool: positive when adding
            let (amount0, amount1) = if tick_current < tick_lower {
                (
                    get_amount_0_delta(sqrt_price_lower, sqrt_price_upper, liquidity_delta)?,
                    0,
                )
            } else if tick_current < tick_upper {
                self.liquidity = add_delta(self.liquidity, liquidity_delta)?;
                (
                    get_amount_0_delta(sqrt_price, sqrt_price_upper, liquidity_delta)?,
                    get_amount_1_delta(sqrt_price_lower, sqrt_price, liquidity_delta)?,
                )
            } else {
                (
                    0,
                    get_amount_1_delta(sqrt_price_lower, sqrt_price_upper, liquidity_delta)?,
                )
            };
            principal = BalanceDelta::new(-amount0, -amount1);
        }

        let fees_accrued = BalanceDelta::new(to_signed(fees_owed_0)?, to_signed(fees_owed_1)?);
        let caller_delta = principal.checked_add(fees_accrued)?;
        Ok((caller_delta, fees_accrued))
    }

    /// Credits `amount0`/`amount1` to in-range liquidity as fees.
    ///
    /// Returns the caller delta: the donated amounts as debts.
    pub fn donate(&mut self, amount0: u128, amount1: u128) -> Result<BalanceDelta, Error> {
        self.ensure_initialized()?;
        if self.liquidity == 0 {
            return Err(PoolError::NoLiquidityToReceiveFees.into());
        }

        let delta = BalanceDelta::new(-to_signed(amount0)?, -to_signed(amount1)?);
        let liquidity = U256::from(self.liquidity);
        if amount0 > 0 {
            let growth = mul_div(U256::from(amount0), Q128, liquidity)?;
            self.fee_growth_global_0_x128 = self.fee_growth_global_0_x128.wrapping_add(growth);
        }
        if amount1 > 0 {
            let growth = mul_div(U256::from(amount1), Q128, liquidity)?;
            self.fee_growth_global_1_x128 = self.fee_growth_global_1_x128.wrapping_add(growth);
        }
        Ok(delta)
    }
}
