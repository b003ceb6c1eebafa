use crate::math::math_helpers::{div_rounding_up, mul_div, mul_div_rounding_up, to_i128};
use crate::{
    Q96, RESOLUTION, U160_MAX,
    error::{Error, MathError, PriceError},
};
use alloy_primitives::U256;

/// Which side of a trade receives a rounding unit.
///
/// `Up` is used for amounts the pool receives (rounds in the pool's favour),
/// `Down` for amounts the pool pays out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rounding {
    Up,
    Down,
}

impl Rounding {
    #[inline]
    fn is_up(self) -> bool {
        matches!(self, Rounding::Up)
    }
}

/// Next sqrt price after adding (`add = true`) or removing `amount` of
/// token0, always rounding the price up.
///
/// Rounding up keeps the price on the pool's side: for an input the price
/// moves less than exact, for an output it moves more than exact.
pub fn get_next_sqrt_price_from_amount_0_rounding_up(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    if amount.is_zero() {
        return Ok(sqrt_price_x96);
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let product = amount.wrapping_mul(sqrt_price_x96);
    let product_fits = product / amount == sqrt_price_x96;

    if add {
        if product_fits {
            if let Some(denominator) = numerator1.checked_add(product) {
                return Ok(mul_div_rounding_up(
                    numerator1,
                    sqrt_price_x96,
                    denominator,
                )?);
            }
        }
        // liquidity / (liquidity / sqrt_price + amount), always safe
        let denominator = (numerator1 / sqrt_price_x96)
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        Ok(div_rounding_up(numerator1, denominator)?)
    } else {
        if !product_fits || numerator1 <= product {
            return Err(PriceError::InsufficientReserves.into());
        }
        let next = mul_div_rounding_up(numerator1, sqrt_price_x96, numerator1 - product)?;
        if next > U160_MAX {
            return Err(MathError::Overflow.into());
        }
        Ok(next)
    }
}

/// Next sqrt price after adding or removing `amount` of token1, always
/// rounding the price down.
pub fn get_next_sqrt_price_from_amount_1_rounding_down(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    let liquidity = U256::from(liquidity);

    if add {
        let quotient = if amount <= U160_MAX {
            (amount << RESOLUTION) / liquidity
        } else {
            mul_div(amount, Q96, liquidity)?
        };
        match sqrt_price_x96.checked_add(quotient) {
            Some(next) if next <= U160_MAX => Ok(next),
            _ => Err(MathError::Overflow.into()),
        }
    } else {
        let quotient = if amount <= U160_MAX {
            div_rounding_up(amount << RESOLUTION, liquidity)?
        } else {
            mul_div_rounding_up(amount, Q96, liquidity)?
        };
        if sqrt_price_x96 <= quotient {
            return Err(PriceError::InsufficientReserves.into());
        }
        Ok(sqrt_price_x96 - quotient)
    }
}

/// Next sqrt price after the pool receives `amount_in` of the input token.
pub fn get_next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    if sqrt_price_x96.is_zero() {
        return Err(PriceError::SqrtPriceIsZero.into());
    }
    if liquidity == 0 {
        return Err(PriceError::LiquidityIsZero.into());
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_price_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Next sqrt price after the pool pays out `amount_out` of the output token.
pub fn get_next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    if sqrt_price_x96.is_zero() {
        return Err(PriceError::SqrtPriceIsZero.into());
    }
    if liquidity == 0 {
        return Err(PriceError::LiquidityIsZero.into());
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_price_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_price_x96, liquidity, amount_out, false)
    }
}

/// Token0 amount between two sqrt prices at constant liquidity:
/// `liquidity * (sqrt_b - sqrt_a) / (sqrt_a * sqrt_b)`.
///
/// The prices may be given in either order.
pub fn get_amount_0_delta_base(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    let (lower, upper) = if sqrt_price_a_x96 > sqrt_price_b_x96 {
        (sqrt_price_b_x96, sqrt_price_a_x96)
    } else {
        (sqrt_price_a_x96, sqrt_price_b_x96)
    };
    if lower.is_zero() {
        return Err(PriceError::SqrtPriceIsZero.into());
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = upper - lower;

    if round_up {
        Ok(div_rounding_up(
            mul_div_rounding_up(numerator1, numerator2, upper)?,
            lower,
        )?)
    } else {
        Ok(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// Token1 amount between two sqrt prices at constant liquidity:
/// `liquidity * (sqrt_b - sqrt_a)`.
pub fn get_amount_1_delta_base(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    let range = sqrt_price_a_x96.abs_diff(sqrt_price_b_x96);
    let liquidity = U256::from(liquidity);

    if round_up {
        mul_div_rounding_up(liquidity, range, Q96)
    } else {
        mul_div(liquidity, range, Q96)
    }
}

/// Signed token0 delta for a signed liquidity change.
///
/// Adding liquidity yields a positive amount rounded up (owed to the pool);
/// removing yields a negative amount rounded down (paid by the pool).
pub fn get_amount_0_delta(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: i128,
) -> Result<i128, Error> {
    let magnitude = liquidity.unsigned_abs();
    if liquidity < 0 {
        let amount = get_amount_0_delta_base(sqrt_price_a_x96, sqrt_price_b_x96, magnitude, false)?;
        Ok(-to_i128(amount)?)
    } else {
        let amount = get_amount_0_delta_base(sqrt_price_a_x96, sqrt_price_b_x96, magnitude, true)?;
        Ok(to_i128(amount)?)
    }
}

/// Signed token1 delta for a signed liquidity change, rounded like
/// [`get_amount_0_delta`].
pub fn get_amount_1_delta(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: i128,
) -> Result<i128, Error> {
    let magnitude = liquidity.unsigned_abs();
    if liquidity < 0 {
        let amount = get_amount_1_delta_base(sqrt_price_a_x96, sqrt_price_b_x96, magnitude, false)?;
        Ok(-to_i128(amount)?)
    } else {
        let amount = get_amount_1_delta_base(sqrt_price_a_x96, sqrt_price_b_x96, magnitude, true)?;
        Ok(to_i128(amount)?)
    }
}

/// Both token amounts exchanged when the price moves from `sqrt_price_start_x96`
/// to `sqrt_price_target_x96` at constant `liquidity`.
///
/// One amount flows into the pool and the other out of it; the caller picks
/// the rounding for the side it is computing.
pub fn amounts_for_price_move(
    sqrt_price_start_x96: U256,
    sqrt_price_target_x96: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<(U256, U256), Error> {
    let round_up = rounding.is_up();
    let amount0 = get_amount_0_delta_base(
        sqrt_price_start_x96,
        sqrt_price_target_x96,
        liquidity,
        round_up,
    )?;
    let amount1 = get_amount_1_delta_base(
        sqrt_price_start_x96,
        sqrt_price_target_x96,
        liquidity,
        round_up,
    )?;
    Ok((amount0, amount1))
}
