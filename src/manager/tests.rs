use super::*;
use crate::config::ManagerConfig;
use crate::error::{ConfigError, TickError};
use crate::hooks::{
    AFTER_SWAP_FLAG, BEFORE_INITIALIZE_FLAG, BEFORE_MODIFY_LIQUIDITY_FLAG, BEFORE_SWAP_FLAG,
    HookSelector,
};
use crate::math::tick_math::{MAX_SQRT_PRICE, MIN_SQRT_PRICE};
use crate::pool::fees::{DYNAMIC_FEE_FLAG, MAX_LP_FEE};
use crate::SQRT_PRICE_1_1;
use std::cell::{Cell, RefCell};

const LIQUIDITY: i128 = 1_000_000_000_000_000_000;

fn owner() -> Address {
    Address::with_last_byte(0xaa)
}

fn locker() -> Address {
    Address::with_last_byte(0xbb)
}

fn hook_address(flags: u8) -> Address {
    let mut address = Address::repeat_byte(0x11);
    address.0[19] = flags;
    address
}

fn pool_key(fee: u32, hooks: Address) -> PoolKey {
    PoolKey::new(
        Currency::from(Address::with_last_byte(1)),
        Currency::from(Address::with_last_byte(2)),
        fee,
        60,
        hooks,
    )
}

fn manager() -> PoolManager {
    PoolManager::new(ManagerConfig::new(owner())).unwrap()
}

fn min_limit() -> U256 {
    MIN_SQRT_PRICE + U256::from(1)
}

fn settle_all(manager: &mut PoolManager, key: &PoolKey) -> Result<(), Error> {
    for currency in [key.currency0, key.currency1] {
        let delta = manager.currency_delta(currency);
        if delta < 0 {
            manager.settle(currency, delta.unsigned_abs())?;
        } else if delta > 0 {
            manager.take(currency, delta.unsigned_abs())?;
        }
    }
    Ok(())
}

fn add_liquidity(manager: &mut PoolManager, key: &PoolKey) {
    manager
        .unlock(locker(), |m| {
            m.modify_liquidity(key, ModifyLiquidityParams::new(-120, 120, LIQUIDITY))?;
            settle_all(m, key)
        })
        .unwrap();
}

struct FixedFeeController {
    fee: Cell<u32>,
}

impl ProtocolFeeController for FixedFeeController {
    fn protocol_fee_for_pool(&self, _key: &PoolKey) -> Result<u32, Error> {
        Ok(self.fee.get())
    }
}

struct FailingController;

impl ProtocolFeeController for FailingController {
    fn protocol_fee_for_pool(&self, _key: &PoolKey) -> Result<u32, Error> {
        Err(PoolError::InvalidCaller(Address::ZERO).into())
    }
}

#[derive(Default)]
struct RecordingHook {
    calls: RefCell<Vec<(HookSelector, Address)>>,
}

impl Hooks for RecordingHook {
    fn before_modify_liquidity(
        &self,
        _manager: &mut PoolManager,
        sender: Address,
        _key: &PoolKey,
        _params: &ModifyLiquidityParams,
    ) -> Result<HookSelector, Error> {
        self.calls
            .borrow_mut()
            .push((HookSelector::BeforeModifyLiquidity, sender));
        Ok(HookSelector::BeforeModifyLiquidity)
    }

    fn before_swap(
        &self,
        _manager: &mut PoolManager,
        sender: Address,
        _key: &PoolKey,
        _params: &SwapParams,
    ) -> Result<HookSelector, Error> {
        self.calls.borrow_mut().push((HookSelector::BeforeSwap, sender));
        Ok(HookSelector::BeforeSwap)
    }

    fn after_swap(
        &self,
        _manager: &mut PoolManager,
        sender: Address,
        _key: &PoolKey,
        _params: &SwapParams,
        _delta: BalanceDelta,
    ) -> Result<HookSelector, Error> {
        self.calls.borrow_mut().push((HookSelector::AfterSwap, sender));
        Ok(HookSelector::AfterSwap)
    }
}

struct WrongSelectorHook;

impl Hooks for WrongSelectorHook {
    fn before_swap(
        &self,
        _manager: &mut PoolManager,
        _sender: Address,
        _key: &PoolKey,
        _params: &SwapParams,
    ) -> Result<HookSelector, Error> {
        Ok(HookSelector::AfterSwap)
    }
}

// sets a dynamic fee and adds its own liquidity before every swap
struct DynamicFeeHook {
    address: Address,
    fee: u32,
    calls: RefCell<Vec<HookSelector>>,
}

impl Hooks for DynamicFeeHook {
    fn before_modify_liquidity(
        &self,
        _manager: &mut PoolManager,
        _sender: Address,
        _key: &PoolKey,
        _params: &ModifyLiquidityParams,
    ) -> Result<HookSelector, Error> {
        self.calls
            .borrow_mut()
            .push(HookSelector::BeforeModifyLiquidity);
        Ok(HookSelector::BeforeModifyLiquidity)
    }

    fn before_swap(
        &self,
        manager: &mut PoolManager,
        _sender: Address,
        key: &PoolKey,
        _params: &SwapParams,
    ) -> Result<HookSelector, Error> {
        self.calls.borrow_mut().push(HookSelector::BeforeSwap);
        manager.update_dynamic_lp_fee(self.address, key, self.fee)?;
        manager.modify_liquidity(key, ModifyLiquidityParams::new(-60, 60, 1_000))?;
        Ok(HookSelector::BeforeSwap)
    }
}

// creates the pool it is asked to initialize and funds it, before the outer
// initialize gets to write the pool
struct ReinitializingHook;

impl Hooks for ReinitializingHook {
    fn before_initialize(
        &self,
        manager: &mut PoolManager,
        _sender: Address,
        key: &PoolKey,
        sqrt_price_x96: U256,
    ) -> Result<HookSelector, Error> {
        manager.initialize(key.hooks, key, sqrt_price_x96)?;
        manager.unlock(key.hooks, |m| {
            m.modify_liquidity(key, ModifyLiquidityParams::new(-120, 120, LIQUIDITY))?;
            settle_all(m, key)
        })?;
        Ok(HookSelector::BeforeInitialize)
    }
}

// adds liquidity to another pool, then answers with the wrong selector
struct SideEffectHook {
    other: PoolKey,
}

impl Hooks for SideEffectHook {
    fn before_swap(
        &self,
        manager: &mut PoolManager,
        _sender: Address,
        _key: &PoolKey,
        _params: &SwapParams,
    ) -> Result<HookSelector, Error> {
        manager.modify_liquidity(&self.other, ModifyLiquidityParams::new(-120, 120, LIQUIDITY))?;
        Ok(HookSelector::AfterSwap)
    }
}

#[test]
fn new_rejects_zero_owner() {
    let result = PoolManager::new(ManagerConfig::new(Address::ZERO));
    assert!(matches!(
        result,
        Err(Error::ConfigError(ConfigError::ZeroOwner))
    ));
}

#[test]
fn initialize_creates_pool() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    let tick = manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    assert_eq!(tick, 0);

    let slot0 = manager.slot0(&key.id()).unwrap();
    assert_eq!(slot0.sqrt_price_x96, SQRT_PRICE_1_1);
    assert_eq!(slot0.tick, 0);
    assert_eq!(slot0.lp_fee, 3000);
    assert_eq!(slot0.protocol_fee, ProtocolFee::ZERO);
    assert_eq!(manager.liquidity(&key.id()), Some(0));
    assert!(!manager.is_unlocked());
}

#[test]
fn initialize_failures_leave_no_pool() {
    let mut manager = manager();

    let reversed = PoolKey::new(
        Currency::from(Address::with_last_byte(2)),
        Currency::from(Address::with_last_byte(1)),
        3000,
        60,
        Address::ZERO,
    );
    assert_eq!(
        manager.initialize(owner(), &reversed, SQRT_PRICE_1_1),
        Err(PoolError::CurrenciesOutOfOrder(reversed.currency0, reversed.currency1).into())
    );

    let no_flags = pool_key(3000, hook_address(0));
    assert_eq!(
        manager.initialize(owner(), &no_flags, SQRT_PRICE_1_1),
        Err(HookError::HookAddressNotValid(no_flags.hooks).into())
    );

    let unregistered = pool_key(3000, hook_address(BEFORE_INITIALIZE_FLAG));
    assert_eq!(
        manager.initialize(owner(), &unregistered, SQRT_PRICE_1_1),
        Err(HookError::ExtensionNotRegistered(unregistered.hooks).into())
    );
    assert!(manager.pool_state(&unregistered.id()).is_none());

    let key = pool_key(3000, Address::ZERO);
    assert!(manager.initialize(owner(), &key, MAX_SQRT_PRICE).is_err());
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    assert_eq!(
        manager.initialize(owner(), &key, SQRT_PRICE_1_1),
        Err(PoolError::PoolAlreadyInitialized(key.id()).into())
    );
}

#[test]
fn operations_require_a_session() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();

    let not_active: Error = SessionError::SessionNotActive.into();
    assert_eq!(
        manager
            .modify_liquidity(&key, ModifyLiquidityParams::new(-60, 60, 1))
            .unwrap_err(),
        not_active
    );
    assert_eq!(
        manager
            .swap(&key, SwapParams::new(true, 1, min_limit()))
            .unwrap_err(),
        not_active
    );
    assert_eq!(manager.donate(&key, 1, 1).unwrap_err(), not_active);
    assert_eq!(manager.settle(key.currency0, 1).unwrap_err(), not_active);
    assert_eq!(manager.take(key.currency0, 1).unwrap_err(), not_active);
    assert_eq!(manager.clear(key.currency0, 0).unwrap_err(), not_active);
}

#[test]
fn unknown_pool_is_rejected_inside_a_session() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    let result = manager.unlock(locker(), |m| {
        m.swap(&key, SwapParams::new(true, 1, min_limit()))
    });
    assert_eq!(result, Err(PoolError::PoolNotInitialized(key.id()).into()));
}

#[test]
fn liquidity_and_swap_round_trip_through_a_session() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    let id = key.id();
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();

    let added = manager
        .unlock(locker(), |m| {
            let (delta, fees) =
                m.modify_liquidity(&key, ModifyLiquidityParams::new(-120, 120, LIQUIDITY))?;
            assert_eq!(fees, BalanceDelta::ZERO);
            assert_eq!(m.nonzero_delta_count(), 2);
            assert_eq!(m.locker(), Some(locker()));
            settle_all(m, &key)?;
            Ok(delta)
        })
        .unwrap();
    assert_eq!(
        added,
        BalanceDelta::new(-5_981_737_760_509_663, -5_981_737_760_509_663)
    );
    assert_eq!(manager.liquidity(&id), Some(LIQUIDITY as u128));
    assert_ne!(manager.tick_bitmap_word(&id, -1), U256::ZERO);
    assert_ne!(manager.tick_bitmap_word(&id, 0), U256::ZERO);
    assert_eq!(
        manager.tick_info(&id, -120).map(|info| info.liquidity_net),
        Some(LIQUIDITY)
    );

    let delta = manager
        .unlock(locker(), |m| {
            let delta = m.swap(&key, SwapParams::new(true, 1_000_000_000_000_000, min_limit()))?;
            settle_all(m, &key)?;
            Ok(delta)
        })
        .unwrap();
    assert_eq!(
        delta,
        BalanceDelta::new(-1_000_000_000_000_000, 996_006_981_039_903)
    );

    let slot0 = manager.slot0(&id).unwrap();
    assert_eq!(slot0.tick, -20);
    assert_eq!(
        slot0.sqrt_price_x96,
        U256::from(79_149_250_711_305_166_342_700_278_159_u128)
    );
    assert_eq!(
        manager.fee_growth_globals(&id),
        Some((
            U256::from(1_020_847_100_762_815_390_390_123_822_295_304_u128),
            U256::ZERO
        ))
    );
    assert_eq!(manager.currency_delta(key.currency0), 0);
    assert!(!manager.is_unlocked());
}

#[test]
fn exact_output_swap_delivers_the_requested_amount() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);

    let delta = manager
        .unlock(locker(), |m| {
            let delta = m.swap(&key, SwapParams::new(true, -1_000_000_000_000_000, min_limit()))?;
            settle_all(m, &key)?;
            Ok(delta)
        })
        .unwrap();
    assert_eq!(delta.amount1(), 1_000_000_000_000_000);
    assert!(delta.amount0() < -1_000_000_000_000_000);
}

#[test]
fn removing_liquidity_returns_principal_and_fees_without_creating_value() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);

    manager
        .unlock(locker(), |m| {
            m.swap(&key, SwapParams::new(true, 1_000_000_000_000_000, min_limit()))?;
            settle_all(m, &key)
        })
        .unwrap();

    let (delta, fees) = manager
        .unlock(locker(), |m| {
            let result =
                m.modify_liquidity(&key, ModifyLiquidityParams::new(-120, 120, -LIQUIDITY))?;
            settle_all(m, &key)?;
            Ok(result)
        })
        .unwrap();
    assert_eq!(fees, BalanceDelta::new(2_999_999_999_999, 0));
    assert_eq!(
        delta,
        BalanceDelta::new(6_981_737_760_509_661, 4_985_730_779_469_759)
    );

    // paid in: 5_981_737_760_509_663 + 1e15 of token0, 5_981_737_760_509_663 of token1
    // paid out: 996_006_981_039_903 of token1 to the swapper
    let in0: i128 = 5_981_737_760_509_663 + 1_000_000_000_000_000;
    let in1: i128 = 5_981_737_760_509_663 - 996_006_981_039_903;
    assert!(delta.amount0() <= in0);
    assert!(delta.amount1() <= in1);

    let id = key.id();
    assert_eq!(manager.liquidity(&id), Some(0));
    assert_eq!(manager.tick_info(&id, -120), None);
    assert_eq!(manager.tick_bitmap_word(&id, -1), U256::ZERO);
    let position = manager.position(&id, locker(), -120, 120).unwrap();
    assert_eq!(position.liquidity, 0);
}

#[test]
fn withdrawing_more_than_the_position_holds_fails() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);

    let result = manager.unlock(locker(), |m| {
        m.modify_liquidity(&key, ModifyLiquidityParams::new(-120, 120, -2 * LIQUIDITY))
    });
    assert_eq!(result, Err(PoolError::InsufficientLiquidity.into()));

    let id = key.id();
    assert_eq!(manager.liquidity(&id), Some(LIQUIDITY as u128));
    assert_eq!(
        manager.position(&id, locker(), -120, 120).map(|p| p.liquidity),
        Some(LIQUIDITY as u128)
    );
}

#[test]
fn unsettled_session_is_rolled_back() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();

    let result = manager.unlock(locker(), |m| {
        m.modify_liquidity(&key, ModifyLiquidityParams::new(-120, 120, LIQUIDITY))?;
        Ok(())
    });
    assert_eq!(result, Err(SessionError::CurrencyNotSettled(2).into()));

    let id = key.id();
    assert_eq!(manager.liquidity(&id), Some(0));
    assert!(manager.position(&id, locker(), -120, 120).is_none());
    assert_eq!(manager.tick_info(&id, -120), None);
    assert_eq!(manager.currency_delta(key.currency0), 0);
    assert_eq!(manager.nonzero_delta_count(), 0);
    assert!(!manager.is_unlocked());

    // the engine is usable again afterwards
    add_liquidity(&mut manager, &key);
    assert_eq!(manager.liquidity(&id), Some(LIQUIDITY as u128));
}

#[test]
fn failed_operation_inside_a_session_changes_nothing() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();

    manager
        .unlock(locker(), |m| {
            let misaligned = m.modify_liquidity(&key, ModifyLiquidityParams::new(-100, 120, 1));
            assert_eq!(
                misaligned,
                Err(TickError::TickMisaligned {
                    tick: -100,
                    tick_spacing: 60
                }
                .into())
            );
            assert_eq!(m.nonzero_delta_count(), 0);
            Ok(())
        })
        .unwrap();
}

#[test]
fn nested_unlock_is_rejected() {
    let mut manager = manager();
    manager
        .unlock(locker(), |m| {
            let nested = m.unlock(owner(), |_| Ok(()));
            assert_eq!(nested, Err(SessionError::SessionAlreadyActive.into()));
            assert_eq!(m.locker(), Some(locker()));
            Ok(())
        })
        .unwrap();
    assert!(!manager.is_unlocked());
}

#[test]
fn settle_and_take_balance_out() {
    let mut manager = manager();
    let currency = Currency::from(Address::with_last_byte(9));
    manager
        .unlock(locker(), |m| {
            m.take(currency, 50)?;
            assert_eq!(m.currency_delta(currency), -50);
            m.settle(currency, 50)?;
            assert_eq!(m.currency_delta(currency), 0);
            assert_eq!(m.nonzero_delta_count(), 0);
            Ok(())
        })
        .unwrap();

    let result = manager.unlock(locker(), |m| m.settle(currency, u128::MAX));
    assert_eq!(result, Err(MathError::SafeCastOverflow.into()));
}

#[test]
fn clear_forfeits_exact_positive_deltas() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);

    manager
        .unlock(locker(), |m| {
            let delta = m.swap(&key, SwapParams::new(true, 1_000, min_limit()))?;
            let owed = delta.amount1();
            assert!(owed > 0);

            assert_eq!(
                m.clear(key.currency1, owed as u128 - 1),
                Err(SessionError::ClearNotEqual {
                    amount: owed as u128 - 1,
                    delta: owed
                }
                .into())
            );
            m.clear(key.currency1, owed as u128)?;
            assert_eq!(m.currency_delta(key.currency1), 0);
            m.settle(key.currency0, delta.amount0().unsigned_abs())
        })
        .unwrap();
}

#[test]
fn donate_requires_in_range_liquidity() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    let id = key.id();
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();

    let result = manager.unlock(locker(), |m| m.donate(&key, 100, 200));
    assert_eq!(result, Err(PoolError::NoLiquidityToReceiveFees.into()));

    add_liquidity(&mut manager, &key);
    let delta = manager
        .unlock(locker(), |m| {
            let delta = m.donate(&key, 1_000_000, 0)?;
            settle_all(m, &key)?;
            Ok(delta)
        })
        .unwrap();
    assert_eq!(delta, BalanceDelta::new(-1_000_000, 0));

    let (growth0, growth1) = manager.fee_growth_globals(&id).unwrap();
    assert_eq!(
        growth0,
        U256::from(1_000_000u64) * crate::Q128 / U256::from(LIQUIDITY as u128)
    );
    assert_eq!(growth1, U256::ZERO);
}

#[test]
fn poking_an_empty_position_fails_and_zero_delta_changes_nothing() {
    let mut manager = manager();
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();

    let result = manager.unlock(locker(), |m| {
        m.modify_liquidity(&key, ModifyLiquidityParams::new(-120, 120, 0))
    });
    assert_eq!(result, Err(PoolError::CannotUpdateEmptyPosition.into()));

    add_liquidity(&mut manager, &key);
    let id = key.id();
    let before = manager.pool_state(&id).unwrap().clone();
    let poked = manager
        .unlock(locker(), |m| {
            m.modify_liquidity(&key, ModifyLiquidityParams::new(-120, 120, 0))
        })
        .unwrap();
    assert_eq!(poked, (BalanceDelta::ZERO, BalanceDelta::ZERO));

    let after = manager.pool_state(&id).unwrap();
    assert_eq!(after.slot0, before.slot0);
    assert_eq!(after.liquidity, before.liquidity);
    assert_eq!(
        after.position(locker(), -120, 120),
        before.position(locker(), -120, 120)
    );
}

#[test]
fn protocol_fee_accrues_and_is_collected() {
    let controller_address = Address::with_last_byte(0xcc);
    let controller = Rc::new(FixedFeeController {
        fee: Cell::new(ProtocolFee::new(1000, 1000).raw()),
    });
    let mut manager = manager().with_protocol_fee_controller(controller_address, controller);
    let key = pool_key(3000, Address::ZERO);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    assert_eq!(
        manager.slot0(&key.id()).unwrap().protocol_fee,
        ProtocolFee::new(1000, 1000)
    );
    add_liquidity(&mut manager, &key);

    let delta = manager
        .unlock(locker(), |m| {
            let delta = m.swap(&key, SwapParams::new(true, 7_000, min_limit()))?;
            settle_all(m, &key)?;
            Ok(delta)
        })
        .unwrap();
    assert_eq!(delta, BalanceDelta::new(-7_000, 6_971));
    assert_eq!(manager.protocol_fees_accrued(key.currency0), 7);
    assert_eq!(manager.protocol_fees_accrued(key.currency1), 0);

    let stranger = Address::with_last_byte(0xdd);
    assert_eq!(
        manager.collect_protocol_fees(stranger, stranger, key.currency0, 0),
        Err(PoolError::InvalidCaller(stranger).into())
    );
    assert_eq!(
        manager.collect_protocol_fees(owner(), owner(), key.currency0, 8),
        Err(PoolError::ProtocolFeeCollectTooLarge {
            currency: key.currency0,
            requested: 8,
            accrued: 7
        }
        .into())
    );
    assert_eq!(
        manager.collect_protocol_fees(controller_address, owner(), key.currency0, 2),
        Ok(2)
    );
    assert_eq!(
        manager.collect_protocol_fees(owner(), owner(), key.currency0, 0),
        Ok(5)
    );
    assert_eq!(
        manager.collect_protocol_fees(owner(), owner(), key.currency0, 0),
        Ok(0)
    );
}

#[test]
fn controller_failures_fall_back_to_no_protocol_fee() {
    let key = pool_key(3000, Address::ZERO);

    let mut manager =
        manager().with_protocol_fee_controller(Address::with_last_byte(0xcc), Rc::new(FailingController));
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    assert_eq!(manager.slot0(&key.id()).unwrap().protocol_fee, ProtocolFee::ZERO);

    let controller = Rc::new(FixedFeeController {
        fee: Cell::new(1001),
    });
    let mut manager = self::manager()
        .with_protocol_fee_controller(Address::with_last_byte(0xcc), controller.clone());
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    assert_eq!(manager.slot0(&key.id()).unwrap().protocol_fee, ProtocolFee::ZERO);

    // an explicit update surfaces the invalid answer
    assert_eq!(
        manager.set_protocol_fee(&key),
        Err(PoolError::ProtocolFeeTooLarge(1001).into())
    );

    controller.fee.set(ProtocolFee::new(500, 0).raw());
    assert_eq!(manager.set_protocol_fee(&key), Ok(ProtocolFee::new(500, 0)));
    assert_eq!(
        manager.slot0(&key.id()).unwrap().protocol_fee,
        ProtocolFee::new(500, 0)
    );
}

#[test]
fn only_owner_replaces_the_controller() {
    let mut manager = manager();
    let stranger = Address::with_last_byte(0xdd);
    let controller = Rc::new(FixedFeeController { fee: Cell::new(0) });

    assert_eq!(
        manager.set_protocol_fee_controller(stranger, stranger, controller.clone()),
        Err(PoolError::InvalidCaller(stranger).into())
    );
    assert_eq!(manager.protocol_fee_controller(), None);

    let address = Address::with_last_byte(0xcc);
    manager
        .set_protocol_fee_controller(owner(), address, controller)
        .unwrap();
    assert_eq!(manager.protocol_fee_controller(), Some(address));
    assert_eq!(manager.owner(), owner());
}

#[test]
fn hooks_run_only_for_declared_callbacks() {
    let mut manager = manager();
    let hooks = hook_address(BEFORE_SWAP_FLAG | AFTER_SWAP_FLAG);
    let hook = Rc::new(RecordingHook::default());
    manager.register_extension(hooks, hook.clone());

    let key = pool_key(3000, hooks);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);
    assert!(hook.calls.borrow().is_empty());

    manager
        .unlock(locker(), |m| {
            m.swap(&key, SwapParams::new(true, 1_000, min_limit()))?;
            settle_all(m, &key)
        })
        .unwrap();
    assert_eq!(
        *hook.calls.borrow(),
        vec![
            (HookSelector::BeforeSwap, locker()),
            (HookSelector::AfterSwap, locker())
        ]
    );
}

#[test]
fn after_swap_is_skipped_when_only_before_swap_is_declared() {
    let mut manager = manager();
    let hooks = hook_address(BEFORE_SWAP_FLAG);
    let hook = Rc::new(RecordingHook::default());
    manager.register_extension(hooks, hook.clone());

    let key = pool_key(3000, hooks);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);

    manager
        .unlock(locker(), |m| {
            m.swap(&key, SwapParams::new(true, 1_000, min_limit()))?;
            settle_all(m, &key)
        })
        .unwrap();
    assert_eq!(*hook.calls.borrow(), vec![(HookSelector::BeforeSwap, locker())]);
    let after_swaps = hook
        .calls
        .borrow()
        .iter()
        .filter(|(selector, _)| *selector == HookSelector::AfterSwap)
        .count();
    assert_eq!(after_swaps, 0);
}

#[test]
fn wrong_hook_response_aborts_the_session() {
    let mut manager = manager();
    let hooks = hook_address(BEFORE_SWAP_FLAG);
    manager.register_extension(hooks, Rc::new(WrongSelectorHook));

    let key = pool_key(3000, hooks);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);
    let before = manager.slot0(&key.id()).unwrap();

    let result = manager.unlock(locker(), |m| {
        m.swap(&key, SwapParams::new(true, 1_000, min_limit()))?;
        settle_all(m, &key)
    });
    assert_eq!(
        result,
        Err(HookError::InvalidHookResponse {
            expected: HookSelector::BeforeSwap,
            received: HookSelector::AfterSwap
        }
        .into())
    );
    assert_eq!(manager.slot0(&key.id()).unwrap(), before);
    assert_eq!(manager.nonzero_delta_count(), 0);
    assert!(!manager.is_unlocked());
}

#[test]
fn unimplemented_callback_fails() {
    let mut manager = manager();
    let hooks = hook_address(BEFORE_INITIALIZE_FLAG);
    manager.register_extension(hooks, Rc::new(WrongSelectorHook));

    let key = pool_key(3000, hooks);
    assert_eq!(
        manager.initialize(owner(), &key, SQRT_PRICE_1_1),
        Err(HookError::HookNotImplemented.into())
    );
    assert!(manager.pool_state(&key.id()).is_none());
}

#[test]
fn hook_cannot_initialize_the_pool_it_guards() {
    let mut manager = manager();
    let hooks = hook_address(BEFORE_INITIALIZE_FLAG);
    manager.register_extension(hooks, Rc::new(ReinitializingHook));

    let key = pool_key(3000, hooks);
    assert_eq!(
        manager.initialize(owner(), &key, SQRT_PRICE_1_1),
        Err(PoolError::PoolAlreadyInitialized(key.id()).into())
    );
    // the hook's pool and its liquidity go with the failed initialize
    assert!(manager.pool_state(&key.id()).is_none());
    assert_eq!(manager.nonzero_delta_count(), 0);
    assert!(!manager.is_unlocked());
    assert!(manager.journal.is_empty());
}

#[test]
fn hook_side_effects_on_other_pools_are_undone_with_the_operation() {
    let mut manager = manager();
    let other = pool_key(500, Address::ZERO);
    let hooks = hook_address(BEFORE_SWAP_FLAG);
    manager.register_extension(hooks, Rc::new(SideEffectHook { other }));

    let key = pool_key(3000, hooks);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    manager.initialize(owner(), &other, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);
    let before = manager.slot0(&key.id()).unwrap();

    manager
        .unlock(locker(), |m| {
            let result = m.swap(&key, SwapParams::new(true, 1_000, min_limit()));
            assert_eq!(
                result,
                Err(HookError::InvalidHookResponse {
                    expected: HookSelector::BeforeSwap,
                    received: HookSelector::AfterSwap
                }
                .into())
            );
            assert_eq!(m.liquidity(&other.id()), Some(0));
            assert_eq!(m.nonzero_delta_count(), 0);
            // only the session's own checkpoint is open
            assert_eq!(m.journal.len(), 1);
            Ok(())
        })
        .unwrap();
    assert_eq!(manager.slot0(&key.id()).unwrap(), before);
    assert!(manager.position(&other.id(), hooks, -120, 120).is_none());
    assert!(manager.journal.is_empty());
}

#[test]
fn checkpoints_save_only_the_pools_an_operation_touches() {
    let mut manager = manager();
    let touched = pool_key(3000, Address::ZERO);
    let untouched = pool_key(500, Address::ZERO);
    manager.initialize(owner(), &touched, SQRT_PRICE_1_1).unwrap();
    manager.initialize(owner(), &untouched, SQRT_PRICE_1_1).unwrap();

    let result: Result<(), Error> = manager.atomically(|m| {
        m.pool_mut(touched.id())?.slot0.tick = 42;
        m.pool_mut(touched.id())?.liquidity = 7;
        let checkpoint = m.journal.last().unwrap();
        assert_eq!(checkpoint.pools.len(), 1);
        assert!(checkpoint.pools.contains_key(&touched.id()));
        Err(PoolError::NoLiquidityToSwap.into())
    });
    assert_eq!(result, Err(PoolError::NoLiquidityToSwap.into()));
    assert_eq!(manager.slot0(&touched.id()).unwrap().tick, 0);
    assert_eq!(manager.liquidity(&touched.id()), Some(0));
    assert!(manager.journal.is_empty());
}

#[test]
fn hook_reenters_to_set_dynamic_fee_and_provide_liquidity() {
    let mut manager = manager();
    let hooks = hook_address(BEFORE_SWAP_FLAG | BEFORE_MODIFY_LIQUIDITY_FLAG);
    let hook = Rc::new(DynamicFeeHook {
        address: hooks,
        fee: 10_000,
        calls: RefCell::new(Vec::new()),
    });
    manager.register_extension(hooks, hook.clone());

    let key = pool_key(DYNAMIC_FEE_FLAG, hooks);
    let id = key.id();
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    assert_eq!(manager.slot0(&id).unwrap().lp_fee, 0);

    let stranger = Address::with_last_byte(0xdd);
    assert_eq!(
        manager.update_dynamic_lp_fee(stranger, &key, 500),
        Err(PoolError::UnauthorizedDynamicLpFeeUpdate.into())
    );
    // naming the hook is not enough outside its own callback
    assert_eq!(
        manager.update_dynamic_lp_fee(hooks, &key, 500),
        Err(PoolError::UnauthorizedDynamicLpFeeUpdate.into())
    );

    add_liquidity(&mut manager, &key);
    manager
        .unlock(locker(), |m| {
            m.swap(&key, SwapParams::new(true, 1_000, min_limit()))?;
            settle_all(m, &key)
        })
        .unwrap();

    // the hook's own modify_liquidity is not dispatched back to it
    assert_eq!(
        *hook.calls.borrow(),
        vec![HookSelector::BeforeModifyLiquidity, HookSelector::BeforeSwap]
    );
    assert_eq!(manager.slot0(&id).unwrap().lp_fee, 10_000);
    let position = manager.position(&id, hooks, -60, 60).unwrap();
    assert_eq!(position.liquidity, 1_000);
}

#[test]
fn dynamic_fee_above_the_cap_aborts_the_swap() {
    let mut manager = manager();
    let mut hooks = Address::repeat_byte(0x22);
    hooks.0[19] = BEFORE_SWAP_FLAG;
    manager.register_extension(
        hooks,
        Rc::new(DynamicFeeHook {
            address: hooks,
            fee: MAX_LP_FEE + 1,
            calls: RefCell::new(Vec::new()),
        }),
    );

    let key = pool_key(DYNAMIC_FEE_FLAG, hooks);
    manager.initialize(owner(), &key, SQRT_PRICE_1_1).unwrap();
    add_liquidity(&mut manager, &key);

    let result = manager.unlock(locker(), |m| {
        m.swap(&key, SwapParams::new(true, 1_000, min_limit()))?;
        settle_all(m, &key)
    });
    assert_eq!(result, Err(PoolError::FeeTooLarge(MAX_LP_FEE + 1).into()));
    assert_eq!(manager.slot0(&key.id()).unwrap().lp_fee, 0);
}

#[test]
fn static_fee_pools_reject_dynamic_updates() {
    let mut manager = manager();
    let hooks = hook_address(BEFORE_SWAP_FLAG);
    let key = pool_key(3000, hooks);
    assert_eq!(
        manager.update_dynamic_lp_fee(hooks, &key, 500),
        Err(PoolError::UnauthorizedDynamicLpFeeUpdate.into())
    );
}
