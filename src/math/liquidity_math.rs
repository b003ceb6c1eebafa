use crate::error::MathError;

/// Applies a signed liquidity delta to an unsigned liquidity value.
///
/// Fails with `Underflow` when removing more than `x` and `Overflow` when
/// the sum exceeds `u128::MAX`.
#[inline]
pub fn add_delta(x: u128, y: i128) -> Result<u128, MathError> {
    if y < 0 {
        x.checked_sub(y.unsigned_abs()).ok_or(MathError::Underflow)
    } else {
        x.checked_add(y as u128).ok_or(MathError::Overflow)
    }
}
