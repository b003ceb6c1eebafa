use crate::math::math_helpers::{mul_div, mul_div_rounding_up};
use crate::math::sqrt_price_math::{
    get_amount_0_delta_base, get_amount_1_delta_base, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use crate::{U256_E6, error::Error};
use alloy_primitives::U256;

/// Fee denominator: fees are expressed in hundredths of a basis point.
pub const MAX_SWAP_FEE: u32 = 1_000_000;

/// Result of a single step of a swap, within one initialized-tick range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapStep {
    /// Price after the step; equals the target when the target was reached.
    pub sqrt_price_next_x96: U256,
    pub amount_in: U256,
    pub amount_out: U256,
    /// Fee taken on top of `amount_in`, in the input token.
    pub fee_amount: U256,
}

/// Computes the price reached and the amounts swapped when moving from
/// `sqrt_price_current_x96` towards `sqrt_price_target_x96`.
///
/// `amount_remaining` follows the swap sign convention: positive is exact
/// input, negative is exact output. The direction is implied by the order of
/// the two prices. On exact input the fee is taken from `amount_remaining`;
/// when the target is not reached the whole remainder not consumed as input
/// becomes fee. A fee of `MAX_SWAP_FEE` on exact output divides by zero, so
/// callers reject it beforehand.
pub fn compute_swap_step(
    sqrt_price_current_x96: U256,
    sqrt_price_target_x96: U256,
    liquidity: u128,
    amount_remaining: i128,
    fee_pips: u32,
) -> Result<SwapStep, Error> {
    let zero_for_one = sqrt_price_current_x96 >= sqrt_price_target_x96;
    let fee = U256::from(fee_pips);
    let fee_complement = U256_E6 - fee;

    let mut step = SwapStep::default();

    if amount_remaining > 0 {
        let amount_remaining = U256::from(amount_remaining.unsigned_abs());
        let amount_remaining_less_fee = mul_div(amount_remaining, fee_complement, U256_E6)?;

        let amount_in_to_target = if zero_for_one {
            get_amount_0_delta_base(sqrt_price_target_x96, sqrt_price_current_x96, liquidity, true)?
        } else {
            get_amount_1_delta_base(sqrt_price_current_x96, sqrt_price_target_x96, liquidity, true)?
        };

        if amount_remaining_less_fee >= amount_in_to_target {
            step.sqrt_price_next_x96 = sqrt_price_target_x96;
            step.amount_in = amount_in_to_target;
            step.fee_amount = if fee_pips == MAX_SWAP_FEE {
                amount_in_to_target
            } else {
                mul_div_rounding_up(amount_in_to_target, fee, fee_complement)?
            };
        } else {
            step.amount_in = amount_remaining_less_fee;
            step.sqrt_price_next_x96 = get_next_sqrt_price_from_input(
                sqrt_price_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?;
            // the target was not reached, so the remainder is all fee
            step.fee_amount = amount_remaining - amount_remaining_less_fee;
        }

        step.amount_out = if zero_for_one {
            get_amount_1_delta_base(step.sqrt_price_next_x96, sqrt_price_current_x96, liquidity, false)?
        } else {
            get_amount_0_delta_base(sqrt_price_current_x96, step.sqrt_price_next_x96, liquidity, false)?
        };
    } else {
        let amount_wanted = U256::from(amount_remaining.unsigned_abs());

        let amount_out_to_target = if zero_for_one {
            get_amount_1_delta_base(sqrt_price_target_x96, sqrt_price_current_x96, liquidity, false)?
        } else {
            get_amount_0_delta_base(sqrt_price_current_x96, sqrt_price_target_x96, liquidity, false)?
        };

        if amount_wanted >= amount_out_to_target {
            step.sqrt_price_next_x96 = sqrt_price_target_x96;
            step.amount_out = amount_out_to_target;
        } else {
            step.amount_out = amount_wanted;
            step.sqrt_price_next_x96 = get_next_sqrt_price_from_output(
                sqrt_price_current_x96,
                liquidity,
                amount_wanted,
                zero_for_one,
            )?;
        }

        step.amount_in = if zero_for_one {
            get_amount_0_delta_base(step.sqrt_price_next_x96, sqrt_price_current_x96, liquidity, true)?
        } else {
            get_amount_1_delta_base(sqrt_price_current_x96, step.sqrt_price_next_x96, liquidity, true)?
        };
        step.fee_amount = mul_div_rounding_up(step.amount_in, fee, fee_complement)?;
    }

    Ok(step)
}
