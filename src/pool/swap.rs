use crate::error::{Error, MathError, PoolError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::{mul_div, to_i128, to_u128};
use crate::math::swap_math::{MAX_SWAP_FEE, compute_swap_step};
use crate::math::tick_bitmap::{has_initialized_tick, next_initialized_tick_within_one_word};
use crate::math::tick_math::{
    MAX_SQRT_PRICE, MAX_TICK, MIN_SQRT_PRICE, MIN_TICK, get_sqrt_price_at_tick,
    get_tick_at_sqrt_price,
};
use crate::pool::balance_delta::BalanceDelta;
use crate::pool::fees::calculate_swap_fee;
use crate::pool::state::PoolState;
use crate::pool::tick::cross_tick;
use crate::{Q128, U256_E6};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    /// Swap direction: `true` for currency0 → currency1.
    pub zero_for_one: bool,
    /// Signed amount being swapped. Positive means “exact in”, negative means “exact out”.
    pub amount_specified: i128,
    /// Sqrt-price limit in Q96 that bounds how far the price is allowed to move.
    pub sqrt_price_limit_x96: U256,
}

impl SwapParams {
    #[inline]
    pub fn new(zero_for_one: bool, amount_specified: i128, sqrt_price_limit_x96: U256) -> Self {
        Self {
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96,
        }
    }
}

/// Result of a swap against one pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Caller delta: the input currency negative, the output currency positive.
    pub delta: BalanceDelta,
    /// Total fee charged in the input currency, protocol share included.
    pub fee_amount: u128,
    /// Protocol share skimmed from the fees, in the input currency.
    pub amount_to_protocol: u128,
    /// Effective fee rate charged, protocol share included.
    pub swap_fee: u32,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
}

// the top level state of the swap, written back to the pool at the end
struct SwapState {
    // the amount remaining to be swapped in (positive) or out (negative)
    amount_specified_remaining: i128,
    // the amount already swapped out (positive) or in (negative)
    amount_calculated: i128,
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
    // global fee growth of the input currency
    fee_growth_global_x128: U256,
    fee_amount: u128,
    amount_to_protocol: u128,
}

#[derive(Default)]
struct StepComputations {
    sqrt_price_start_x96: U256,
    // the next tick to swap to from the current tick in the swap direction
    tick_next: i32,
    initialized: bool,
    sqrt_price_next_x96: U256,
    amount_in: U256,
    amount_out: U256,
    fee_amount: U256,
}

impl PoolState {
    fn check_price_limit(&self, zero_for_one: bool, limit: U256) -> Result<(), PoolError> {
        let current = self.slot0.sqrt_price_x96;
        if zero_for_one {
            if limit >= current {
                return Err(PoolError::PriceLimitAlreadyExceeded { current, limit });
            }
            if limit <= MIN_SQRT_PRICE {
                return Err(PoolError::PriceLimitOutOfBounds(limit));
            }
        } else {
            if limit <= current {
                return Err(PoolError::PriceLimitAlreadyExceeded { current, limit });
            }
            if limit >= MAX_SQRT_PRICE {
                return Err(PoolError::PriceLimitOutOfBounds(limit));
            }
        }
        Ok(())
    }

    /// Executes a swap against this pool, stepping across initialized ticks
    /// until the specified amount is exhausted or the price limit is reached.
    ///
    /// Fee growth, price, tick and active liquidity are written back on
    /// success. The protocol share of each step's fee is skimmed before the
    /// remainder is credited to liquidity providers.
    pub fn swap(&mut self, params: &SwapParams) -> Result<SwapOutcome, Error> {
        self.ensure_initialized()?;

        let amount_specified = params.amount_specified;
        if amount_specified == 0 {
            return Err(PoolError::SwapAmountCannotBeZero.into());
        }

        let zero_for_one = params.zero_for_one;
        let exact_input = amount_specified > 0;

        let protocol_fee_rate = self.slot0.protocol_fee.for_direction(zero_for_one);
        let swap_fee = if protocol_fee_rate == 0 {
            self.slot0.lp_fee
        } else {
            calculate_swap_fee(protocol_fee_rate, self.slot0.lp_fee)
        };
        if !exact_input && swap_fee >= MAX_SWAP_FEE {
            return Err(PoolError::InvalidFeeForExactOut.into());
        }

        let sqrt_price_limit_x96 = params.sqrt_price_limit_x96;
        self.check_price_limit(zero_for_one, sqrt_price_limit_x96)?;

        if self.liquidity == 0
            && !has_initialized_tick(
                &self.tick_bitmap,
                self.slot0.tick,
                self.tick_spacing,
                zero_for_one,
            )
        {
            return Err(PoolError::NoLiquidityToSwap.into());
        }

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: 0,
            sqrt_price_x96: self.slot0.sqrt_price_x96,
            tick: self.slot0.tick,
            liquidity: self.liquidity,
            fee_growth_global_x128: if zero_for_one {
                self.fee_growth_global_0_x128
            } else {
                self.fee_growth_global_1_x128
            },
            fee_amount: 0,
            amount_to_protocol: 0,
        };

        while state.amount_specified_remaining != 0 && state.sqrt_price_x96 != sqrt_price_limit_x96 {
            let mut step = StepComputations {
                sqrt_price_start_x96: state.sqrt_price_x96,
                ..StepComputations::default()
            };

            (step.tick_next, step.initialized) = next_initialized_tick_within_one_word(
                &self.tick_bitmap,
                state.tick,
                self.tick_spacing,
                zero_for_one,
            );

            step.tick_next = step.tick_next.clamp(MIN_TICK, MAX_TICK);

            step.sqrt_price_next_x96 = get_sqrt_price_at_tick(step.tick_next)?;

            let sqrt_price_target_x96 = if zero_for_one {
                step.sqrt_price_next_x96.max(sqrt_price_limit_x96)
            } else {
                step.sqrt_price_next_x96.min(sqrt_price_limit_x96)
            };

            let computed = compute_swap_step(
                state.sqrt_price_x96,
                sqrt_price_target_x96,
                state.liquidity,
                state.amount_specified_remaining,
                swap_fee,
            )?;
            state.sqrt_price_x96 = computed.sqrt_price_next_x96;
            step.amount_in = computed.amount_in;
            step.amount_out = computed.amount_out;
            step.fee_amount = computed.fee_amount;

            let amount_in_with_fee = to_i128(step.amount_in + step.fee_amount)?;
            let amount_out = to_i128(step.amount_out)?;
            if exact_input {
                state.amount_specified_remaining -= amount_in_with_fee;
                state.amount_calculated = state
                    .amount_calculated
                    .checked_add(amount_out)
                    .ok_or(MathError::Overflow)?;
            } else {
                state.amount_specified_remaining += amount_out;
                state.amount_calculated = state
                    .amount_calculated
                    .checked_sub(amount_in_with_fee)
                    .ok_or(MathError::Overflow)?;
            }

            state.fee_amount = state
                .fee_amount
                .checked_add(to_u128(step.fee_amount)?)
                .ok_or(MathError::Overflow)?;

            if protocol_fee_rate > 0 {
                let protocol_share = if swap_fee == protocol_fee_rate {
                    step.fee_amount
                } else {
                    (step.amount_in + step.fee_amount) * U256::from(protocol_fee_rate) / U256_E6
                };
                step.fee_amount -= protocol_share;
                state.amount_to_protocol = state
                    .amount_to_protocol
                    .checked_add(to_u128(protocol_share)?)
                    .ok_or(MathError::Overflow)?;
            }

            if state.liquidity > 0 {
                let growth = mul_div(step.fee_amount, Q128, U256::from(state.liquidity))?;
                state.fee_growth_global_x128 = state.fee_growth_global_x128.wrapping_add(growth);
            }

            if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
                if step.initialized {
                    let (fee_growth_0, fee_growth_1) = if zero_for_one {
                        (state.fee_growth_global_x128, self.fee_growth_global_1_x128)
                    } else {
                        (self.fee_growth_global_0_x128, state.fee_growth_global_x128)
                    };
                    let mut liquidity_net =
                        cross_tick(&mut self.ticks, step.tick_next, fee_growth_0, fee_growth_1);
                    if zero_for_one {
                        liquidity_net = liquidity_net.checked_neg().ok_or(MathError::Overflow)?;
                    }
                    state.liquidity = add_delta(state.liquidity, liquidity_net)?;
                }
                state.tick = if zero_for_one {
                    step.tick_next - 1
                } else {
                    step.tick_next
                };
            } else if state.sqrt_price_x96 != step.sqrt_price_start_x96 {
                state.tick = get_tick_at_sqrt_price(state.sqrt_price_x96)?;
            }

            trace!(
                tick = state.tick,
                sqrt_price_x96 = %state.sqrt_price_x96,
                liquidity = state.liquidity,
                remaining = state.amount_specified_remaining,
                "swap step"
            );
        }

        self.slot0.sqrt_price_x96 = state.sqrt_price_x96;
        self.slot0.tick = state.tick;
        self.liquidity = state.liquidity;
        if zero_for_one {
            self.fee_growth_global_0_x128 = state.fee_growth_global_x128;
        } else {
            self.fee_growth_global_1_x128 = state.fee_growth_global_x128;
        }

        let specified_delta = -(amount_specified - state.amount_specified_remaining);
        let delta = if zero_for_one == exact_input {
            BalanceDelta::new(specified_delta, state.amount_calculated)
        } else {
            BalanceDelta::new(state.amount_calculated, specified_delta)
        };

        Ok(SwapOutcome {
            delta,
            fee_amount: state.fee_amount,
            amount_to_protocol: state.amount_to_protocol,
            swap_fee,
            sqrt_price_x96: state.sqrt_price_x96,
            tick: state.tick,
            liquidity: state.liquidity,
        })
    }
}
