use crate::FastMap;
use crate::error::{Error, MathError};
use crate::math::liquidity_math::add_delta;
use crate::math::tick_math::{MAX_TICK, MIN_TICK};
use alloy_primitives::U256;

/// Liquidity and fee-growth bookkeeping of one initialized tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickInfo {
    /// Total position liquidity referencing this tick; zero means uninitialized.
    pub liquidity_gross: u128,
    /// Liquidity added when the price crosses this tick left to right.
    pub liquidity_net: i128,
    /// Fee growth on the other side of this tick from the current tick (Q128).
    pub fee_growth_outside_0_x128: U256,
    pub fee_growth_outside_1_x128: U256,
}

pub type Ticks = FastMap<i32, TickInfo>;

/// What changed when a tick was updated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickUpdate {
    /// Gross liquidity went from zero to non-zero.
    pub initialized: bool,
    /// Gross liquidity went from non-zero to zero.
    pub cleared: bool,
    pub liquidity_gross_after: u128,
}

impl TickUpdate {
    /// Whether the tick's bit in the bitmap must be flipped.
    #[inline]
    pub fn flipped(&self) -> bool {
        self.initialized || self.cleared
    }
}

/// Maximum gross liquidity a single tick may reference so that the sum over
/// every usable tick fits in a `u128`.
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = (MIN_TICK / tick_spacing) * tick_spacing;
    let max_tick = (MAX_TICK / tick_spacing) * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}

/// Applies `liquidity_delta` to `tick` on behalf of a position boundary.
///
/// `upper` selects the sign applied to `liquidity_net`. A tick initialized at
/// or below the current tick assumes all prior fee growth happened below it.
pub fn update_tick(
    ticks: &mut Ticks,
    tick: i32,
    tick_current: i32,
    liquidity_delta: i128,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
    upper: bool,
) -> Result<TickUpdate, Error> {
    let mut info = ticks.get(&tick).copied().unwrap_or_default();

    let liquidity_gross_before = info.liquidity_gross;
    let liquidity_gross_after = add_delta(liquidity_gross_before, liquidity_delta)?;

    if liquidity_gross_before == 0 && tick <= tick_current {
        info.fee_growth_outside_0_x128 = fee_growth_global_0_x128;
        info.fee_growth_outside_1_x128 = fee_growth_global_1_x128;
    }

    info.liquidity_gross = liquidity_gross_after;
    info.liquidity_net = if upper {
        info.liquidity_net.checked_sub(liquidity_delta)
    } else {
        info.liquidity_net.checked_add(liquidity_delta)
    }
    .ok_or(MathError::Overflow)?;

    ticks.insert(tick, info);

    Ok(TickUpdate {
        initialized: liquidity_gross_before == 0 && liquidity_gross_after != 0,
        cleared: liquidity_gross_before != 0 && liquidity_gross_after == 0,
        liquidity_gross_after,
    })
}

/// Flips the fee-growth-outside values of `tick` as the price crosses it and
/// returns its `liquidity_net`.
pub fn cross_tick(
    ticks: &mut Ticks,
    tick: i32,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> i128 {
    match ticks.get_mut(&tick) {
        Some(info) => {
            info.fee_growth_outside_0_x128 =
                fee_growth_global_0_x128.wrapping_sub(info.fee_growth_outside_0_x128);
            info.fee_growth_outside_1_x128 =
                fee_growth_global_1_x128.wrapping_sub(info.fee_growth_outside_1_x128);
            info.liquidity_net
        }
        None => 0,
    }
}

pub fn clear_tick(ticks: &mut Ticks, tick: i32) {
    ticks.remove(&tick);
}

/// Fee growth per unit of liquidity accumulated inside `[tick_lower, tick_upper)`.
///
/// All arithmetic wraps; only differences of the result are meaningful.
pub fn fee_growth_inside(
    ticks: &Ticks,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> (U256, U256) {
    let lower = ticks.get(&tick_lower).copied().unwrap_or_default();
    let upper = ticks.get(&tick_upper).copied().unwrap_or_default();

    if tick_current < tick_lower {
        (
            lower
                .fee_growth_outside_0_x128
                .wrapping_sub(upper.fee_growth_outside_0_x128),
            lower
                .fee_growth_outside_1_x128
                .wrapping_sub(upper.fee_growth_outside_1_x128),
        )
    } else if tick_current >= tick_upper {
        (
            upper
                .fee_growth_outside_0_x128
                .wrapping_sub(lower.fee_growth_outside_0_x128),
            upper
                .fee_growth_outside_1_x128
                .wrapping_sub(lower.fee_growth_outside_1_x128),
        )
    } else {
        (
            fee_growth_global_0_x128
                .wrapping_sub(lower.fee_growth_outside_0_x128)
                .wrapping_sub(upper.fee_growth_outside_0_x128),
            fee_growth_global_1_x128
                .wrapping_sub(lower.fee_growth_outside_1_x128)
                .wrapping_sub(upper.fee_growth_outside_1_x128),
        )
    }
}
