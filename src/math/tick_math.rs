use crate::error::PriceError;
use alloy_primitives::{uint, I256, U256};

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = -MIN_TICK;

/// Sqrt price at `MIN_TICK` (Q64.96).
pub const MIN_SQRT_PRICE: U256 = uint!(4295128739_U256);
/// Sqrt price at `MAX_TICK` (Q64.96). Valid prices are strictly below it.
pub const MAX_SQRT_PRICE: U256 = uint!(0xfffd8963efd1fc6a506488495d951d5263988d26_U256);

// 1 / sqrt(1.0001)^(2^i) in Q128.128, for bits 1..=19 of |tick|
const RATIO_TICK_ODD: U256 = uint!(0xfffcb933bd6fad37aa2d162d1a594001_U256);
const RATIO_MULTIPLIERS: [U256; 19] = [
    uint!(0xfff97272373d413259a46990580e213a_U256),
    uint!(0xfff2e50f5f656932ef12357cf3c7fdcc_U256),
    uint!(0xffe5caca7e10e4e61c3624eaa0941cd0_U256),
    uint!(0xffcb9843d60f6159c9db58835c926644_U256),
    uint!(0xff973b41fa98c081472e6896dfb254c0_U256),
    uint!(0xff2ea16466c96a3843ec78b326b52861_U256),
    uint!(0xfe5dee046a99a2a811c461f1969c3053_U256),
    uint!(0xfcbe86c7900a88aedcffc83b479aa3a4_U256),
    uint!(0xf987a7253ac413176f2b074cf7815e54_U256),
    uint!(0xf3392b0822b70005940c7a398e4b70f3_U256),
    uint!(0xe7159475a2c29b7443b29c7fa6e889d9_U256),
    uint!(0xd097f3bdfd2022b8845ad8f792aa5825_U256),
    uint!(0xa9f746462d870fdf8a65dc1f90e061e5_U256),
    uint!(0x70d869a156d2a1b890bb3df62baf32f7_U256),
    uint!(0x31be135f97d08fd981231505542fcfa6_U256),
    uint!(0x9aa508b5b7a84e1c677de54f3e99bc9_U256),
    uint!(0x5d6af8dedb81196699c329225ee604_U256),
    uint!(0x2216e584f5fa1ea926041bedfe98_U256),
    uint!(0x48a170391f7dc42444e8fa2_U256),
];

// log_sqrt(1.0001)(2) in Q64.64 (as a Q128.128 multiplier) and the error bounds
// of the log approximation, both in Q128.128
const LOG_SQRT_10001: I256 = I256::from_raw(uint!(255738958999603826347141_U256));
const TICK_LOW_ERROR: I256 = I256::from_raw(uint!(3402992956809132418596140100660247210_U256));
const TICK_HIGH_ERROR: I256 =
    I256::from_raw(uint!(291339464771989622907027621153398088495_U256));

/// Returns `sqrt(1.0001^tick) * 2^96`, rounded up, for a tick in
/// `[MIN_TICK, MAX_TICK]`.
///
/// Fails with `PriceError::TickOutOfRange` outside the bounds. The result
/// is bit-identical to the on-chain `TickMath.getSqrtPriceAtTick`.
pub fn get_sqrt_price_at_tick(tick: i32) -> Result<U256, PriceError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(PriceError::TickOutOfRange(tick));
    }

    let mut ratio = if abs_tick & 1 != 0 {
        RATIO_TICK_ODD
    } else {
        U256::ONE << 128
    };
    for (i, multiplier) in RATIO_MULTIPLIERS.iter().enumerate() {
        if abs_tick & (2 << i) != 0 {
            ratio = ratio.wrapping_mul(*multiplier) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up so that get_tick_at_sqrt_price stays consistent
    let round_up = !(ratio & U256::from(u32::MAX)).is_zero();
    Ok((ratio >> 32) + U256::from(round_up as u8))
}

/// Index of the most significant set bit of a non-zero value.
#[inline]
fn most_significant_bit(value: U256) -> usize {
    255 - value.leading_zeros()
}

/// Returns the greatest tick whose sqrt price is `<= sqrt_price_x96`.
///
/// Fails with `PriceError::PriceOutOfRange` unless
/// `MIN_SQRT_PRICE <= sqrt_price_x96 < MAX_SQRT_PRICE`. For every valid tick
/// `t`, `get_tick_at_sqrt_price(get_sqrt_price_at_tick(t)) == t`.
pub fn get_tick_at_sqrt_price(sqrt_price_x96: U256) -> Result<i32, PriceError> {
    if sqrt_price_x96 < MIN_SQRT_PRICE || sqrt_price_x96 >= MAX_SQRT_PRICE {
        return Err(PriceError::PriceOutOfRange(sqrt_price_x96));
    }

    let ratio = sqrt_price_x96 << 32;
    let msb = most_significant_bit(ratio);

    // normalise so that bit 127 is the leading bit
    let mut r = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    let mut log_2: I256 =
        (I256::from_raw(U256::from(msb)) - I256::from_raw(U256::from(128u8))) << 64usize;

    // fourteen fractional bits of log2 by repeated squaring
    for shift in (50..=63usize).rev() {
        r = r.wrapping_mul(r) >> 127;
        let f: U256 = r >> 128usize;
        log_2 |= I256::from_raw(f << shift);
        if !f.is_zero() {
            r >>= 1;
        }
    }

    let log_sqrt10001 = log_2.wrapping_mul(LOG_SQRT_10001);
    let tick_low = to_tick(log_sqrt10001.wrapping_sub(TICK_LOW_ERROR).asr(128), sqrt_price_x96)?;
    let tick_high = to_tick(log_sqrt10001.wrapping_add(TICK_HIGH_ERROR).asr(128), sqrt_price_x96)?;

    if tick_low == tick_high {
        return Ok(tick_low);
    }
    if get_sqrt_price_at_tick(tick_high)? <= sqrt_price_x96 {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}

#[inline]
fn to_tick(value: I256, sqrt_price_x96: U256) -> Result<i32, PriceError> {
    i32::try_from(value).map_err(|_| PriceError::PriceOutOfRange(sqrt_price_x96))
}
