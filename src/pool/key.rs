use crate::error::PoolError;
use crate::pool::fees::{MAX_LP_FEE, is_dynamic_fee};
use alloy_primitives::{Address, B256, U256, keccak256};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_TICK_SPACING: i32 = 1;
pub const MAX_TICK_SPACING: i32 = i16::MAX as i32;

/// A token tracked by the engine, identified by its address.
///
/// The zero address denotes the native asset. Ordering is by numeric value
/// of the address.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Currency(Address);

impl Currency {
    pub const NATIVE: Currency = Currency(Address::ZERO);

    #[inline]
    pub const fn address(&self) -> Address {
        self.0
    }

    #[inline]
    pub fn is_native(&self) -> bool {
        self.0 == Address::ZERO
    }
}

impl From<Address> for Currency {
    fn from(address: Address) -> Self {
        Currency(address)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a pool: keccak-256 of its ABI-encoded key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(B256);

impl PoolId {
    #[inline]
    pub const fn as_b256(&self) -> B256 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything that identifies a pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    /// Lower currency of the pair; must sort strictly below `currency1`.
    pub currency0: Currency,
    pub currency1: Currency,
    /// Static LP fee in pips, or [`crate::pool::fees::DYNAMIC_FEE_FLAG`].
    pub fee: u32,
    pub tick_spacing: i32,
    /// Extension address; its low byte carries the callback flags.
    pub hooks: Address,
}

impl PoolKey {
    #[inline]
    pub fn new(
        currency0: Currency,
        currency1: Currency,
        fee: u32,
        tick_spacing: i32,
        hooks: Address,
    ) -> Self {
        Self {
            currency0,
            currency1,
            fee,
            tick_spacing,
            hooks,
        }
    }

    /// Five 32-byte big-endian words: both currencies and the hook address
    /// left-padded, the fee zero-extended and the tick spacing sign-extended.
    pub(crate) fn abi_encode(&self) -> [u8; 160] {
        let mut out = [0u8; 160];
        out[..32].copy_from_slice(self.currency0.address().into_word().as_slice());
        out[32..64].copy_from_slice(self.currency1.address().into_word().as_slice());
        out[64..96].copy_from_slice(&U256::from(self.fee).to_be_bytes::<32>());
        if self.tick_spacing < 0 {
            out[96..124].fill(0xff);
        }
        out[124..128].copy_from_slice(&self.tick_spacing.to_be_bytes());
        out[128..].copy_from_slice(self.hooks.into_word().as_slice());
        out
    }

    pub fn id(&self) -> PoolId {
        PoolId(keccak256(self.abi_encode()))
    }

    /// Checks currency ordering, tick spacing bounds and the static fee cap.
    ///
    /// Hook address validity is checked separately since it depends on the
    /// extension flags.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.currency0 >= self.currency1 {
            return Err(PoolError::CurrenciesOutOfOrder(
                self.currency0,
                self.currency1,
            ));
        }
        if self.tick_spacing > MAX_TICK_SPACING {
            return Err(PoolError::TickSpacingTooLarge(self.tick_spacing));
        }
        if self.tick_spacing < MIN_TICK_SPACING {
            return Err(PoolError::TickSpacingTooSmall(self.tick_spacing));
        }
        if !is_dynamic_fee(self.fee) && self.fee > MAX_LP_FEE {
            return Err(PoolError::FeeTooLarge(self.fee));
        }
        Ok(())
    }
}
