use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::hooks::HookSelector;
use crate::pool::{Currency, PoolId};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("Math error - value does not fit the target integer type")]
    SafeCastOverflow,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price error - tick {0} out of range")]
    TickOutOfRange(i32),
    #[error("Price error - sqrt price {0} out of range")]
    PriceOutOfRange(U256),
    #[error("Price error - sqrt price is 0")]
    SqrtPriceIsZero,
    #[error("Price error - liquidity is 0")]
    LiquidityIsZero,
    #[error("Price error - requested output exceeds available reserves")]
    InsufficientReserves,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TickError {
    #[error("Tick error - lower tick {lower} is not below upper tick {upper}")]
    TicksMisordered { lower: i32, upper: i32 },
    #[error("Tick error - lower tick {0} below MIN_TICK")]
    TickLowerOutOfBounds(i32),
    #[error("Tick error - upper tick {0} above MAX_TICK")]
    TickUpperOutOfBounds(i32),
    #[error("Tick error - tick {tick} is not a multiple of spacing {tick_spacing}")]
    TickMisaligned { tick: i32, tick_spacing: i32 },
    #[error("Tick error - liquidity at tick {0} exceeds the per-tick maximum")]
    TickLiquidityOverflow(i32),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool error - currencies out of order: {0} >= {1}")]
    CurrenciesOutOfOrder(Currency, Currency),
    #[error("Pool error - tick spacing {0} too large")]
    TickSpacingTooLarge(i32),
    #[error("Pool error - tick spacing {0} too small")]
    TickSpacingTooSmall(i32),
    #[error("Pool error - fee {0} too large")]
    FeeTooLarge(u32),
    #[error("Pool error - pool {0} not initialized")]
    PoolNotInitialized(PoolId),
    #[error("Pool error - pool {0} already initialized")]
    PoolAlreadyInitialized(PoolId),
    #[error("Pool error - swap amount cannot be zero")]
    SwapAmountCannotBeZero,
    #[error("Pool error - price limit {limit} already exceeded by current price {current}")]
    PriceLimitAlreadyExceeded { current: U256, limit: U256 },
    #[error("Pool error - price limit {0} out of bounds")]
    PriceLimitOutOfBounds(U256),
    #[error("Pool error - no liquidity to swap")]
    NoLiquidityToSwap,
    #[error("Pool error - no liquidity to receive fees")]
    NoLiquidityToReceiveFees,
    #[error("Pool error - a 100% fee cannot be used for exact output swaps")]
    InvalidFeeForExactOut,
    #[error("Pool error - insufficient position liquidity")]
    InsufficientLiquidity,
    #[error("Pool error - cannot poke an empty position")]
    CannotUpdateEmptyPosition,
    #[error("Pool error - protocol fee {0:#x} too large")]
    ProtocolFeeTooLarge(u32),
    #[error("Pool error - cannot collect {requested} of {currency}, only {accrued} accrued")]
    ProtocolFeeCollectTooLarge {
        currency: Currency,
        requested: u128,
        accrued: u128,
    },
    #[error("Pool error - caller {0} is not allowed to perform this operation")]
    InvalidCaller(Address),
    #[error("Pool error - dynamic LP fee updates are only accepted from the pool's hook")]
    UnauthorizedDynamicLpFeeUpdate,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HookError {
    #[error("Hook error - hook address {0} not valid for this pool")]
    HookAddressNotValid(Address),
    #[error("Hook error - expected {expected:?} response, got {received:?}")]
    InvalidHookResponse {
        expected: HookSelector,
        received: HookSelector,
    },
    #[error("Hook error - callback not implemented")]
    HookNotImplemented,
    #[error("Hook error - no extension registered at {0}")]
    ExtensionNotRegistered(Address),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session error - a session is already active")]
    SessionAlreadyActive,
    #[error("Session error - no active session")]
    SessionNotActive,
    #[error("Session error - {0} currencies left unsettled")]
    CurrencyNotSettled(usize),
    #[error("Session error - running delta for {0} overflowed")]
    DeltaOverflow(Currency),
    #[error("Session error - clear amount {amount} does not match delta {delta}")]
    ClearNotEqual { amount: u128, delta: i128 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config error - owner must be a nonzero address")]
    ZeroOwner,
    #[error("Config error - {0}")]
    Parse(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] MathError),

    #[error(transparent)]
    PriceError(#[from] PriceError),

    #[error(transparent)]
    TickError(#[from] TickError),

    #[error(transparent)]
    PoolError(#[from] PoolError),

    #[error(transparent)]
    HookError(#[from] HookError),

    #[error(transparent)]
    SessionError(#[from] SessionError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),
}
