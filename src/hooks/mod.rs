//! Extension callbacks around pool operations.
//!
//! Which callbacks an extension receives is fixed by the low byte of the
//! address it is registered under, so the capabilities of a pool are visible
//! from its key alone.

mod dispatch;

use crate::error::{Error, HookError};
use crate::manager::PoolManager;
use crate::pool::fees::is_dynamic_fee;
use crate::pool::{BalanceDelta, ModifyLiquidityParams, PoolKey, SwapParams};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

pub const BEFORE_INITIALIZE_FLAG: u8 = 1 << 7;
pub const AFTER_INITIALIZE_FLAG: u8 = 1 << 6;
pub const BEFORE_MODIFY_LIQUIDITY_FLAG: u8 = 1 << 5;
pub const AFTER_MODIFY_LIQUIDITY_FLAG: u8 = 1 << 4;
pub const BEFORE_SWAP_FLAG: u8 = 1 << 3;
pub const AFTER_SWAP_FLAG: u8 = 1 << 2;
pub const BEFORE_DONATE_FLAG: u8 = 1 << 1;
pub const AFTER_DONATE_FLAG: u8 = 1;

#[inline]
fn flag_byte(hooks: Address) -> u8 {
    hooks.0[19]
}

#[inline]
pub fn has_permission(hooks: Address, flag: u8) -> bool {
    flag_byte(hooks) & flag != 0
}

/// A zero hook address is valid only for a static fee; any other address must
/// declare a callback or use the dynamic fee.
pub fn is_valid_hook_address(hooks: Address, fee: u32) -> bool {
    if hooks == Address::ZERO {
        !is_dynamic_fee(fee)
    } else {
        flag_byte(hooks) != 0 || is_dynamic_fee(fee)
    }
}

/// Which callbacks an extension implements.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookPermissions {
    pub before_initialize: bool,
    pub after_initialize: bool,
    pub before_modify_liquidity: bool,
    pub after_modify_liquidity: bool,
    pub before_swap: bool,
    pub after_swap: bool,
    pub before_donate: bool,
    pub after_donate: bool,
}

impl HookPermissions {
    pub fn from_address(hooks: Address) -> Self {
        Self {
            before_initialize: has_permission(hooks, BEFORE_INITIALIZE_FLAG),
            after_initialize: has_permission(hooks, AFTER_INITIALIZE_FLAG),
            before_modify_liquidity: has_permission(hooks, BEFORE_MODIFY_LIQUIDITY_FLAG),
            after_modify_liquidity: has_permission(hooks, AFTER_MODIFY_LIQUIDITY_FLAG),
            before_swap: has_permission(hooks, BEFORE_SWAP_FLAG),
            after_swap: has_permission(hooks, AFTER_SWAP_FLAG),
            before_donate: has_permission(hooks, BEFORE_DONATE_FLAG),
            after_donate: has_permission(hooks, AFTER_DONATE_FLAG),
        }
    }

    /// The flag byte an address must end with to carry these permissions.
    pub fn flags(&self) -> u8 {
        [
            (self.before_initialize, BEFORE_INITIALIZE_FLAG),
            (self.after_initialize, AFTER_INITIALIZE_FLAG),
            (self.before_modify_liquidity, BEFORE_MODIFY_LIQUIDITY_FLAG),
            (self.after_modify_liquidity, AFTER_MODIFY_LIQUIDITY_FLAG),
            (self.before_swap, BEFORE_SWAP_FLAG),
            (self.after_swap, AFTER_SWAP_FLAG),
            (self.before_donate, BEFORE_DONATE_FLAG),
            (self.after_donate, AFTER_DONATE_FLAG),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(0, |acc, (_, flag)| acc | flag)
    }
}

/// Checks that `hooks` declares exactly the callbacks in `permissions`.
pub fn validate_hook_permissions(
    hooks: Address,
    permissions: HookPermissions,
) -> Result<(), HookError> {
    if flag_byte(hooks) != permissions.flags() {
        return Err(HookError::HookAddressNotValid(hooks));
    }
    Ok(())
}

/// Response every callback must echo back to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HookSelector {
    BeforeInitialize,
    AfterInitialize,
    BeforeModifyLiquidity,
    AfterModifyLiquidity,
    BeforeSwap,
    AfterSwap,
    BeforeDonate,
    AfterDonate,
}

/// Extension logic run around pool operations.
///
/// Each callback receives the engine mutably and may re-enter it, for
/// instance to swap in another pool or to update a dynamic fee. Returning an
/// error aborts the whole operation. Only callbacks declared by the hook
/// address are ever invoked; the defaults fail with `HookNotImplemented`.
#[allow(unused_variables)]
pub trait Hooks {
    fn before_initialize(
        &self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        sqrt_price_x96: U256,
    ) -> Result<HookSelector, Error> {
        Err(HookError::HookNotImplemented.into())
    }

    fn after_initialize(
        &self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        sqrt_price_x96: U256,
        tick: i32,
    ) -> Result<HookSelector, Error> {
        Err(HookError::HookNotImplemented.into())
    }

    fn before_modify_liquidity(
        &self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        params: &ModifyLiquidityParams,
    ) -> Result<HookSelector, Error> {
        Err(HookError::HookNotImplemented.into())
    }

    fn after_modify_liquidity(
        &self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        params: &ModifyLiquidityParams,
        delta: BalanceDelta,
        fees_accrued: BalanceDelta,
    ) -> Result<HookSelector, Error> {
        Err(HookError::HookNotImplemented.into())
    }

    fn before_swap(
        &self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        params: &SwapParams,
    ) -> Result<HookSelector, Error> {
        Err(HookError::HookNotImplemented.into())
    }

    fn after_swap(
        &self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        params: &SwapParams,
        delta: BalanceDelta,
    ) -> Result<HookSelector, Error> {
        Err(HookError::HookNotImplemented.into())
    }

    fn before_donate(
        &self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        amount0: u128,
        amount1: u128,
    ) -> Result<HookSelector, Error> {
        Err(HookError::HookNotImplemented.into())
    }

    fn after_donate(
        &self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        amount0: u128,
        amount1: u128,
    ) -> Result<HookSelector, Error> {
        Err(HookError::HookNotImplemented.into())
    }
}
