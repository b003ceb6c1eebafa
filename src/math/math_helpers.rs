use crate::error::MathError;
use alloy_primitives::U256;

const U256_TWO: U256 = U256::from_limbs([2, 0, 0, 0]);
const U256_THREE: U256 = U256::from_limbs([3, 0, 0, 0]);

/// Returns the full 512‑bit product `a * b` as `(low, high)` words.
///
/// The high word is recovered from `a * b mod (2^256 - 1)` and the
/// wrapping product via the Chinese remainder theorem.
#[inline]
fn full_mul(a: U256, b: U256) -> (U256, U256) {
    let low = a.wrapping_mul(b);
    let mm = a.mul_mod(b, U256::MAX);
    let (mut high, borrow) = mm.overflowing_sub(low);
    if borrow {
        high = high.wrapping_sub(U256::ONE);
    }
    (low, high)
}

/// Multiplicative inverse of an odd `denominator` modulo `2^256`.
///
/// Seeded correct to four bits, each Newton–Raphson round doubles the
/// number of correct bits, so six rounds reach 256.
#[inline]
fn inverse_mod_2_256(denominator: U256) -> U256 {
    let mut inv = U256_THREE.wrapping_mul(denominator) ^ U256_TWO;
    for _ in 0..6 {
        inv = inv.wrapping_mul(U256_TWO.wrapping_sub(denominator.wrapping_mul(inv)));
    }
    inv
}

/// Computes `a * b / denominator` rounded down with a full 512‑bit
/// intermediate product.
///
/// Fails with `DivisionByZero` for a zero denominator and `Overflow`
/// when the quotient does not fit in 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    let (mut low, mut high) = full_mul(a, b);

    if high.is_zero() {
        return Ok(low / denominator);
    }
    if denominator <= high {
        return Err(MathError::Overflow);
    }

    // make the 512-bit numerator divisible by the denominator
    let remainder = a.mul_mod(b, denominator);
    if remainder > low {
        high = high.wrapping_sub(U256::ONE);
    }
    low = low.wrapping_sub(remainder);

    // factor out the largest power of two dividing the denominator
    let twos = denominator & denominator.wrapping_neg();
    let denominator = denominator / twos;
    low /= twos;

    // shift the high word's bits into the low word
    let flip = twos.wrapping_neg() / twos + U256::ONE;
    low |= high.wrapping_mul(flip);

    Ok(low.wrapping_mul(inverse_mod_2_256(denominator)))
}

/// Like [`mul_div`], but rounds the result up when `a * b` is not an
/// exact multiple of `denominator`.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    let result = mul_div(a, b, denominator)?;

    if a.mul_mod(b, denominator).is_zero() {
        return Ok(result);
    }
    result.checked_add(U256::ONE).ok_or(MathError::Overflow)
}

/// Divides `a` by `b`, rounding up on a non‑zero remainder.
///
/// Fails with `DivisionByZero` when `b` is zero.
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::ONE)
    }
}

/// Narrows a `U256` to `u128`.
#[inline]
pub fn to_u128(value: U256) -> Result<u128, MathError> {
    u128::try_from(value).map_err(|_| MathError::SafeCastOverflow)
}

/// Narrows a `U256` to a non‑negative `i128`.
#[inline]
pub fn to_i128(value: U256) -> Result<i128, MathError> {
    i128::try_from(to_u128(value)?).map_err(|_| MathError::SafeCastOverflow)
}
