//! The singleton engine.
//!
//! [`PoolManager`] owns every pool, the session ledger, protocol fee accrual,
//! the extension registry and the protocol fee controller. Every mutating
//! operation either completes or leaves the engine exactly as it found it.

use crate::FastMap;
use crate::config::ManagerConfig;
use crate::error::{Error, HookError, MathError, PoolError, SessionError};
use crate::hooks::{Hooks, is_valid_hook_address};
use crate::math::tick_bitmap::get_word;
use crate::pool::fees::{initial_lp_fee, is_dynamic_fee, is_valid_lp_fee};
use crate::pool::{
    BalanceDelta, Currency, ModifyLiquidityParams, PoolId, PoolKey, PoolState, Position,
    ProtocolFee, Slot0, SwapParams, TickInfo,
};
use crate::session::SessionLock;
use alloy_primitives::{Address, U256};
use std::rc::Rc;
use tracing::{debug, trace, warn};

#[cfg(test)]
mod tests;

/// Source of per-pool protocol fees.
///
/// The answer is a packed [`ProtocolFee`] value; anything that does not
/// decode to a valid fee is rejected.
pub trait ProtocolFeeController {
    fn protocol_fee_for_pool(&self, key: &PoolKey) -> Result<u32, Error>;
}

#[derive(Debug, Default)]
struct EngineState {
    pools: FastMap<PoolId, PoolState>,
    protocol_fees_accrued: FastMap<Currency, u128>,
    session: SessionLock,
}

/// Undo record of one atomic operation.
///
/// Pools are saved lazily, the first time the operation touches them; `None`
/// marks a pool that did not exist yet.
#[derive(Debug)]
struct Checkpoint {
    pools: FastMap<PoolId, Option<PoolState>>,
    protocol_fees_accrued: FastMap<Currency, u128>,
    session: SessionLock,
}

pub struct PoolManager {
    owner: Address,
    protocol_fee_controller: Option<Address>,
    fee_controller: Option<Rc<dyn ProtocolFeeController>>,
    state: EngineState,
    // one checkpoint per atomic operation in progress, innermost last
    journal: Vec<Checkpoint>,
    pub(crate) extensions: FastMap<Address, Rc<dyn Hooks>>,
    // extensions currently executing a callback, innermost last
    pub(crate) call_stack: Vec<Address>,
}

#[inline]
fn to_signed(amount: u128) -> Result<i128, MathError> {
    i128::try_from(amount).map_err(|_| MathError::SafeCastOverflow)
}

impl PoolManager {
    pub fn new(config: ManagerConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            owner: config.owner,
            protocol_fee_controller: config.protocol_fee_controller,
            fee_controller: None,
            state: EngineState::default(),
            journal: Vec::new(),
            extensions: FastMap::default(),
            call_stack: Vec::new(),
        })
    }

    /// Attaches the controller consulted for protocol fees.
    pub fn with_protocol_fee_controller(
        mut self,
        address: Address,
        controller: Rc<dyn ProtocolFeeController>,
    ) -> Self {
        self.protocol_fee_controller = Some(address);
        self.fee_controller = Some(controller);
        self
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn protocol_fee_controller(&self) -> Option<Address> {
        self.protocol_fee_controller
    }

    /// Replaces the protocol fee controller. Owner only.
    pub fn set_protocol_fee_controller(
        &mut self,
        caller: Address,
        address: Address,
        controller: Rc<dyn ProtocolFeeController>,
    ) -> Result<(), Error> {
        if caller != self.owner {
            return Err(PoolError::InvalidCaller(caller).into());
        }
        self.protocol_fee_controller = Some(address);
        self.fee_controller = Some(controller);
        debug!(controller = %address, "protocol fee controller updated");
        Ok(())
    }

    /// Makes `extension` the code run for pools whose key names `address`.
    pub fn register_extension(&mut self, address: Address, extension: Rc<dyn Hooks>) {
        trace!(hook = %address, "extension registered");
        self.extensions.insert(address, extension);
    }

    /// Runs `operation` under a checkpoint and rolls back everything it
    /// touched if it fails.
    ///
    /// Only pools reached through [`Self::pool_mut`] or [`Self::insert_pool`]
    /// are saved. On success the saved pools move to the enclosing checkpoint,
    /// so an outer failure still undoes nested operations.
    fn atomically<T, F>(&mut self, operation: F) -> Result<T, Error>
    where
        F: FnOnce(&mut PoolManager) -> Result<T, Error>,
    {
        self.journal.push(Checkpoint {
            pools: FastMap::default(),
            protocol_fees_accrued: self.state.protocol_fees_accrued.clone(),
            session: self.state.session.clone(),
        });
        let result = operation(self);
        let Some(checkpoint) = self.journal.pop() else {
            return result;
        };

        if result.is_ok() {
            if let Some(parent) = self.journal.last_mut() {
                for (id, saved) in checkpoint.pools {
                    parent.pools.entry(id).or_insert(saved);
                }
            }
        } else {
            for (id, saved) in checkpoint.pools {
                match saved {
                    Some(pool) => {
                        self.state.pools.insert(id, pool);
                    }
                    None => {
                        self.state.pools.remove(&id);
                    }
                }
            }
            self.state.protocol_fees_accrued = checkpoint.protocol_fees_accrued;
            self.state.session = checkpoint.session;
        }
        result
    }

    // saves the pre-image of a pool in the innermost checkpoint, once
    fn record_pool(&mut self, id: PoolId) {
        if let Some(checkpoint) = self.journal.last_mut() {
            if !checkpoint.pools.contains_key(&id) {
                checkpoint.pools.insert(id, self.state.pools.get(&id).cloned());
            }
        }
    }

    // the account a session operation acts for: the extension currently
    // running a callback, otherwise the locker
    fn session_sender(&self) -> Result<Address, SessionError> {
        let locker = self
            .state
            .session
            .locker()
            .ok_or(SessionError::SessionNotActive)?;
        Ok(self.call_stack.last().copied().unwrap_or(locker))
    }

    fn pool_mut(&mut self, id: PoolId) -> Result<&mut PoolState, PoolError> {
        self.ensure_pool(id)?;
        self.record_pool(id);
        self.state
            .pools
            .get_mut(&id)
            .ok_or(PoolError::PoolNotInitialized(id))
    }

    fn insert_pool(&mut self, pool: PoolState) -> Result<(), PoolError> {
        let id = pool.id;
        self.ensure_absent(id)?;
        self.record_pool(id);
        self.state.pools.insert(id, pool);
        Ok(())
    }

    fn ensure_absent(&self, id: PoolId) -> Result<(), PoolError> {
        if self.state.pools.contains_key(&id) {
            Err(PoolError::PoolAlreadyInitialized(id))
        } else {
            Ok(())
        }
    }

    fn ensure_pool(&self, id: PoolId) -> Result<(), PoolError> {
        if self.state.pools.contains_key(&id) {
            Ok(())
        } else {
            Err(PoolError::PoolNotInitialized(id))
        }
    }

    fn account_pool_balance_delta(&mut self, key: &PoolKey, delta: BalanceDelta) -> Result<(), Error> {
        self.state.session.account(key.currency0, delta.amount0())?;
        self.state.session.account(key.currency1, delta.amount1())?;
        Ok(())
    }

    fn fetch_protocol_fee(&self, key: &PoolKey) -> Result<ProtocolFee, Error> {
        let Some(controller) = &self.fee_controller else {
            return Ok(ProtocolFee::ZERO);
        };
        let raw = controller.protocol_fee_for_pool(key)?;
        let fee = ProtocolFee::from_raw(raw);
        if !fee.is_valid() {
            return Err(PoolError::ProtocolFeeTooLarge(raw).into());
        }
        Ok(fee)
    }

    /// Creates the pool described by `key` at `sqrt_price_x96` and returns
    /// its starting tick.
    ///
    /// Needs no session. A controller that fails or answers with an invalid
    /// fee leaves the pool without a protocol fee.
    pub fn initialize(
        &mut self,
        sender: Address,
        key: &PoolKey,
        sqrt_price_x96: U256,
    ) -> Result<i32, Error> {
        self.atomically(|manager| {
            key.validate()?;
            if !is_valid_hook_address(key.hooks, key.fee) {
                return Err(HookError::HookAddressNotValid(key.hooks).into());
            }
            let id = key.id();
            manager.ensure_absent(id)?;

            manager.before_initialize_hook(sender, key, sqrt_price_x96)?;

            let protocol_fee = manager.fetch_protocol_fee(key).unwrap_or_else(|error| {
                warn!(pool = %id, %error, "protocol fee controller rejected, using no protocol fee");
                ProtocolFee::ZERO
            });
            let lp_fee = initial_lp_fee(key.fee);

            let mut pool = PoolState::new(id, key.tick_spacing);
            let tick = pool.initialize(sqrt_price_x96, protocol_fee, lp_fee)?;
            // the before hook may have created the pool by re-entering
            manager.insert_pool(pool)?;

            debug!(
                pool = %id,
                currency0 = %key.currency0,
                currency1 = %key.currency1,
                fee = key.fee,
                tick_spacing = key.tick_spacing,
                hooks = %key.hooks,
                sqrt_price_x96 = %sqrt_price_x96,
                tick,
                "pool initialized"
            );

            manager.after_initialize_hook(sender, key, sqrt_price_x96, tick)?;
            Ok(tick)
        })
    }

    /// Adds, removes or pokes a position owned by the session sender.
    ///
    /// Returns the caller delta (principal plus fees) and the fees alone.
    pub fn modify_liquidity(
        &mut self,
        key: &PoolKey,
        params: ModifyLiquidityParams,
    ) -> Result<(BalanceDelta, BalanceDelta), Error> {
        self.atomically(|manager| {
            let sender = manager.session_sender()?;
            let id = key.id();
            manager.ensure_pool(id)?;

            manager.before_modify_liquidity_hook(sender, key, &params)?;

            let (delta, fees_accrued) = manager.pool_mut(id)?.modify_liquidity(sender, &params)?;

            debug!(
                pool = %id,
                owner = %sender,
                tick_lower = params.tick_lower,
                tick_upper = params.tick_upper,
                liquidity_delta = params.liquidity_delta,
                amount0 = delta.amount0(),
                amount1 = delta.amount1(),
                "liquidity modified"
            );

            manager.after_modify_liquidity_hook(sender, key, &params, delta, fees_accrued)?;
            manager.account_pool_balance_delta(key, delta)?;
            Ok((delta, fees_accrued))
        })
    }

    /// Swaps against the pool and records the resulting delta in the session.
    pub fn swap(&mut self, key: &PoolKey, params: SwapParams) -> Result<BalanceDelta, Error> {
        self.atomically(|manager| {
            let sender = manager.session_sender()?;
            let id = key.id();
            manager.ensure_pool(id)?;

            manager.before_swap_hook(sender, key, &params)?;

            let outcome = manager.pool_mut(id)?.swap(&params)?;

            if outcome.amount_to_protocol > 0 {
                let currency = if params.zero_for_one {
                    key.currency0
                } else {
                    key.currency1
                };
                let accrued = manager
                    .state
                    .protocol_fees_accrued
                    .entry(currency)
                    .or_insert(0);
                *accrued = accrued
                    .checked_add(outcome.amount_to_protocol)
                    .ok_or(MathError::Overflow)?;
            }

            debug!(
                pool = %id,
                sender = %sender,
                zero_for_one = params.zero_for_one,
                amount_specified = params.amount_specified,
                amount0 = outcome.delta.amount0(),
                amount1 = outcome.delta.amount1(),
                tick = outcome.tick,
                liquidity = outcome.liquidity,
                swap_fee = outcome.swap_fee,
                "swap"
            );

            manager.after_swap_hook(sender, key, &params, outcome.delta)?;
            manager.account_pool_balance_delta(key, outcome.delta)?;
            Ok(outcome.delta)
        })
    }

    /// Gives `amount0`/`amount1` to the pool's in-range liquidity providers.
    pub fn donate(
        &mut self,
        key: &PoolKey,
        amount0: u128,
        amount1: u128,
    ) -> Result<BalanceDelta, Error> {
        self.atomically(|manager| {
            let sender = manager.session_sender()?;
            let id = key.id();
            manager.ensure_pool(id)?;

            manager.before_donate_hook(sender, key, amount0, amount1)?;

            let delta = manager.pool_mut(id)?.donate(amount0, amount1)?;
            debug!(pool = %id, sender = %sender, amount0, amount1, "donation");

            manager.after_donate_hook(sender, key, amount0, amount1)?;
            manager.account_pool_balance_delta(key, delta)?;
            Ok(delta)
        })
    }

    /// Opens a session for `locker`, runs `callback` and closes the session.
    ///
    /// Every currency delta must be back to zero when the callback returns.
    /// On any failure the engine is restored to its state before the call.
    pub fn unlock<T, F>(&mut self, locker: Address, callback: F) -> Result<T, Error>
    where
        F: FnOnce(&mut PoolManager) -> Result<T, Error>,
    {
        if self.state.session.is_active() {
            return Err(SessionError::SessionAlreadyActive.into());
        }

        let result = self.atomically(|manager| {
            manager.state.session.begin(locker)?;
            trace!(locker = %locker, "session opened");
            let value = callback(manager)?;
            manager.state.session.end()?;
            trace!(locker = %locker, "session closed");
            Ok(value)
        });

        if let Err(error) = &result {
            warn!(locker = %locker, %error, "session reverted");
        }
        result
    }

    /// Records a payment of `amount` into the engine.
    pub fn settle(&mut self, currency: Currency, amount: u128) -> Result<(), Error> {
        self.session_sender()?;
        let delta = self.state.session.account(currency, to_signed(amount)?)?;
        trace!(currency = %currency, amount, delta, "settle");
        Ok(())
    }

    /// Records a withdrawal of `amount` out of the engine.
    pub fn take(&mut self, currency: Currency, amount: u128) -> Result<(), Error> {
        self.session_sender()?;
        let delta = self.state.session.account(currency, -to_signed(amount)?)?;
        trace!(currency = %currency, amount, delta, "take");
        Ok(())
    }

    /// Forfeits a positive delta; `amount` must equal it exactly.
    pub fn clear(&mut self, currency: Currency, amount: u128) -> Result<(), Error> {
        self.session_sender()?;
        let current = self.state.session.currency_delta(currency);
        let signed = to_signed(amount)?;
        if current != signed {
            return Err(SessionError::ClearNotEqual {
                amount,
                delta: current,
            }
            .into());
        }
        self.state.session.account(currency, -signed)?;
        trace!(currency = %currency, amount, "clear");
        Ok(())
    }

    /// Re-reads the protocol fee of an existing pool from the controller.
    pub fn set_protocol_fee(&mut self, key: &PoolKey) -> Result<ProtocolFee, Error> {
        let id = key.id();
        self.ensure_pool(id)?;
        let fee = self.fetch_protocol_fee(key)?;
        self.pool_mut(id)?.set_protocol_fee(fee)?;
        debug!(pool = %id, protocol_fee = fee.raw(), "protocol fee updated");
        Ok(fee)
    }

    /// Sets the LP fee of a dynamic-fee pool.
    ///
    /// Accepted only from the pool's hook while one of its callbacks is
    /// running.
    pub fn update_dynamic_lp_fee(
        &mut self,
        caller: Address,
        key: &PoolKey,
        new_fee: u32,
    ) -> Result<(), Error> {
        let running = self.call_stack.last() == Some(&key.hooks);
        if !is_dynamic_fee(key.fee) || caller != key.hooks || !running {
            return Err(PoolError::UnauthorizedDynamicLpFeeUpdate.into());
        }
        if !is_valid_lp_fee(new_fee) {
            return Err(PoolError::FeeTooLarge(new_fee).into());
        }
        let id = key.id();
        self.pool_mut(id)?.set_lp_fee(new_fee)?;
        debug!(pool = %id, lp_fee = new_fee, "dynamic lp fee updated");
        Ok(())
    }

    /// Withdraws accrued protocol fees. `amount == 0` collects everything.
    ///
    /// Returns the amount collected. Only the owner or the protocol fee
    /// controller may collect.
    pub fn collect_protocol_fees(
        &mut self,
        caller: Address,
        recipient: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<u128, Error> {
        if caller != self.owner && Some(caller) != self.protocol_fee_controller {
            return Err(PoolError::InvalidCaller(caller).into());
        }

        let accrued = self.protocol_fees_accrued(currency);
        let collected = if amount == 0 { accrued } else { amount };
        if collected > accrued {
            return Err(PoolError::ProtocolFeeCollectTooLarge {
                currency,
                requested: amount,
                accrued,
            }
            .into());
        }

        let remaining = accrued - collected;
        if remaining == 0 {
            self.state.protocol_fees_accrued.remove(&currency);
        } else {
            self.state.protocol_fees_accrued.insert(currency, remaining);
        }
        debug!(currency = %currency, recipient = %recipient, collected, "protocol fees collected");
        Ok(collected)
    }

    pub fn pool_state(&self, id: &PoolId) -> Option<&PoolState> {
        self.state.pools.get(id)
    }

    pub fn slot0(&self, id: &PoolId) -> Option<Slot0> {
        self.pool_state(id).map(|pool| pool.slot0)
    }

    pub fn liquidity(&self, id: &PoolId) -> Option<u128> {
        self.pool_state(id).map(|pool| pool.liquidity)
    }

    pub fn fee_growth_globals(&self, id: &PoolId) -> Option<(U256, U256)> {
        self.pool_state(id)
            .map(|pool| (pool.fee_growth_global_0_x128, pool.fee_growth_global_1_x128))
    }

    pub fn tick_info(&self, id: &PoolId, tick: i32) -> Option<TickInfo> {
        self.pool_state(id)
            .and_then(|pool| pool.ticks.get(&tick).copied())
    }

    pub fn tick_bitmap_word(&self, id: &PoolId, word: i16) -> U256 {
        self.pool_state(id)
            .map(|pool| get_word(&pool.tick_bitmap, word))
            .unwrap_or(U256::ZERO)
    }

    pub fn position(
        &self,
        id: &PoolId,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Option<Position> {
        self.pool_state(id)
            .and_then(|pool| pool.position(owner, tick_lower, tick_upper))
    }

    pub fn protocol_fees_accrued(&self, currency: Currency) -> u128 {
        self.state
            .protocol_fees_accrued
            .get(&currency)
            .copied()
            .unwrap_or(0)
    }

    pub fn currency_delta(&self, currency: Currency) -> i128 {
        self.state.session.currency_delta(currency)
    }

    pub fn nonzero_delta_count(&self) -> usize {
        self.state.session.nonzero_delta_count()
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.session.is_active()
    }

    pub fn locker(&self) -> Option<Address> {
        self.state.session.locker()
    }
}
