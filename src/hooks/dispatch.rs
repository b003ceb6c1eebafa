use super::{
    AFTER_DONATE_FLAG, AFTER_INITIALIZE_FLAG, AFTER_MODIFY_LIQUIDITY_FLAG, AFTER_SWAP_FLAG,
    BEFORE_DONATE_FLAG, BEFORE_INITIALIZE_FLAG, BEFORE_MODIFY_LIQUIDITY_FLAG, BEFORE_SWAP_FLAG,
    HookSelector, Hooks, has_permission,
};
use crate::error::{Error, HookError};
use crate::manager::PoolManager;
use crate::pool::{BalanceDelta, ModifyLiquidityParams, PoolKey, SwapParams};
use alloy_primitives::{Address, U256};
use tracing::trace;

impl PoolManager {
    /// Invokes one callback of the pool's extension if its address declares
    /// `flag`, and checks the echoed selector.
    ///
    /// Calls made by the extension itself are not dispatched back to it.
    fn call_hook<F>(
        &mut self,
        sender: Address,
        key: &PoolKey,
        flag: u8,
        expected: HookSelector,
        call: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&dyn Hooks, &mut PoolManager) -> Result<HookSelector, Error>,
    {
        let hooks = key.hooks;
        if !has_permission(hooks, flag) || sender == hooks {
            return Ok(());
        }

        let extension = self
            .extensions
            .get(&hooks)
            .cloned()
            .ok_or(HookError::ExtensionNotRegistered(hooks))?;

        trace!(hook = %hooks, callback = ?expected, "dispatching hook");
        self.call_stack.push(hooks);
        let response = call(extension.as_ref(), self);
        self.call_stack.pop();

        let received = response?;
        if received != expected {
            return Err(HookError::InvalidHookResponse { expected, received }.into());
        }
        Ok(())
    }

    pub(crate) fn before_initialize_hook(
        &mut self,
        sender: Address,
        key: &PoolKey,
        sqrt_price_x96: U256,
    ) -> Result<(), Error> {
        self.call_hook(
            sender,
            key,
            BEFORE_INITIALIZE_FLAG,
            HookSelector::BeforeInitialize,
            |hook, manager| hook.before_initialize(manager, sender, key, sqrt_price_x96),
        )
    }

    pub(crate) fn after_initialize_hook(
        &mut self,
        sender: Address,
        key: &PoolKey,
        sqrt_price_x96: U256,
        tick: i32,
    ) -> Result<(), Error> {
        self.call_hook(
            sender,
            key,
            AFTER_INITIALIZE_FLAG,
            HookSelector::AfterInitialize,
            |hook, manager| hook.after_initialize(manager, sender, key, sqrt_price_x96, tick),
        )
    }

    pub(crate) fn before_modify_liquidity_hook(
        &mut self,
        sender: Address,
        key: &PoolKey,
        params: &ModifyLiquidityParams,
    ) -> Result<(), Error> {
        self.call_hook(
            sender,
            key,
            BEFORE_MODIFY_LIQUIDITY_FLAG,
            HookSelector::BeforeModifyLiquidity,
            |hook, manager| hook.before_modify_liquidity(manager, sender, key, params),
        )
    }

    pub(crate) fn after_modify_liquidity_hook(
        &mut self,
        sender: Address,
        key: &PoolKey,
        params: &ModifyLiquidityParams,
        delta: BalanceDelta,
        fees_accrued: BalanceDelta,
    ) -> Result<(), Error> {
        self.call_hook(
            sender,
            key,
            AFTER_MODIFY_LIQUIDITY_FLAG,
            HookSelector::AfterModifyLiquidity,
            |hook, manager| {
                hook.after_modify_liquidity(manager, sender, key, params, delta, fees_accrued)
            },
        )
    }

    pub(crate) fn before_swap_hook(
        &mut self,
        sender: Address,
        key: &PoolKey,
        params: &SwapParams,
    ) -> Result<(), Error> {
        self.call_hook(
            sender,
            key,
            BEFORE_SWAP_FLAG,
            HookSelector::BeforeSwap,
            |hook, manager| hook.before_swap(manager, sender, key, params),
        )
    }

    pub(crate) fn after_swap_hook(
        &mut self,
        sender: Address,
        key: &PoolKey,
        params: &SwapParams,
        delta: BalanceDelta,
    ) -> Result<(), Error> {
        self.call_hook(
            sender,
            key,
            AFTER_SWAP_FLAG,
            HookSelector::AfterSwap,
            |hook, manager| hook.after_swap(manager, sender, key, params, delta),
        )
    }

    pub(crate) fn before_donate_hook(
        &mut self,
        sender: Address,
        key: &PoolKey,
        amount0: u128,
        amount1: u128,
    ) -> Result<(), Error> {
        self.call_hook(
            sender,
            key,
            BEFORE_DONATE_FLAG,
            HookSelector::BeforeDonate,
            |hook, manager| hook.before_donate(manager, sender, key, amount0, amount1),
        )
    }

    pub(crate) fn after_donate_hook(
        &mut self,
        sender: Address,
        key: &PoolKey,
        amount0: u128,
        amount1: u128,
    ) -> Result<(), Error> {
        self.call_hook(
            sender,
            key,
            AFTER_DONATE_FLAG,
            HookSelector::AfterDonate,
            |hook, manager| hook.after_donate(manager, sender, key, amount0, amount1),
        )
    }
}
