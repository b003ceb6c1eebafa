//! Singleton concentrated-liquidity pool engine in pure Rust.
//!
//! This crate exposes:
//! - Low‑level math primitives (`math::*`) for ticks, Q64.96 prices, amount deltas
//!   and the tick bitmap.
//! - Per‑pool state (`pool::*`): tick records, positions and the swap / liquidity
//!   engine of a single pool.
//! - Extension hooks (`hooks`) gated by capability bits in the hook address.
//! - A session ledger (`session`) that defers settlement to the end of a batch.
//! - [`PoolManager`], the engine object that owns all of the above.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use clmm_pool_manager::{math::tick_math, RESOLUTION, U256};
//!
//! let sqrt_price = tick_math::get_sqrt_price_at_tick(0).unwrap();
//! assert!(sqrt_price > U256::ZERO);
//! assert_eq!(RESOLUTION, 96);
//! ```
//!
//! ## Batching pool operations in one session
//! ```no_run
//! use clmm_pool_manager::{
//!     Address, Currency, ManagerConfig, ModifyLiquidityParams, PoolKey, PoolManager,
//!     SwapParams, SQRT_PRICE_1_1,
//!     math::tick_math::MIN_SQRT_PRICE,
//! };
//!
//! let owner = Address::with_last_byte(0xaa);
//! let mut manager = PoolManager::new(ManagerConfig::new(owner)).unwrap();
//!
//! let key = PoolKey::new(
//!     Currency::from(Address::with_last_byte(1)),
//!     Currency::from(Address::with_last_byte(2)),
//!     3000,
//!     60,
//!     Address::ZERO,
//! );
//! manager.initialize(owner, &key, SQRT_PRICE_1_1).unwrap();
//!
//! let trader = Address::with_last_byte(0xbb);
//! manager
//!     .unlock(trader, |m| {
//!         m.modify_liquidity(&key, ModifyLiquidityParams::new(-120, 120, 1_000_000_000))?;
//!         let delta = m.swap(&key, SwapParams::new(true, 1_000, MIN_SQRT_PRICE + clmm_pool_manager::U256::ONE))?;
//!         println!("amount0: {}, amount1: {}", delta.amount0(), delta.amount1());
//!         // settle / take every currency before the session ends
//!         for currency in [key.currency0, key.currency1] {
//!             let owed = m.currency_delta(currency);
//!             if owed < 0 {
//!                 m.settle(currency, owed.unsigned_abs())?;
//!             } else if owed > 0 {
//!                 m.take(currency, owed as u128)?;
//!             }
//!         }
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

pub use alloy_primitives::{Address, B256, I256, U256};

pub mod config;
pub mod error;
mod hash;
pub mod hooks;
pub mod manager;
pub mod math;
pub mod pool;
pub mod session;

pub use config::ManagerConfig;
pub use error::Error;
pub use hash::FastMap;
pub use hooks::{HookPermissions, HookSelector, Hooks};
pub use manager::{PoolManager, ProtocolFeeController};
pub use pool::{
    BalanceDelta, Currency, ModifyLiquidityParams, PoolId, PoolKey, ProtocolFee, SwapParams,
};

const U256_1: U256 = U256::from_limbs([1, 0, 0, 0]);

const U160_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, 4294967295, 0]);
const U256_E6: U256 = U256::from_limbs([1000000, 0, 0, 0]);

pub const RESOLUTION: u8 = 96;
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);

/// Sqrt price of a 1:1 pool in Q64.96 (exactly `2^96`).
pub const SQRT_PRICE_1_1: U256 = Q96;
