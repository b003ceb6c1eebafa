//! LP and protocol fee encodings.
//!
//! All fees are in pips: hundredths of a basis point, so `1_000_000` is 100%.

use serde::{Deserialize, Serialize};

/// Marker value in [`crate::PoolKey::fee`] for pools whose LP fee is set by their hook.
pub const DYNAMIC_FEE_FLAG: u32 = 0x800000;
pub const MAX_LP_FEE: u32 = 1_000_000;
/// Cap on each direction of the protocol fee (0.1%).
pub const MAX_PROTOCOL_FEE: u32 = 1000;
const PIPS_DENOMINATOR: u64 = 1_000_000;

#[inline]
pub fn is_dynamic_fee(fee: u32) -> bool {
    fee == DYNAMIC_FEE_FLAG
}

#[inline]
pub fn is_valid_lp_fee(fee: u32) -> bool {
    fee <= MAX_LP_FEE
}

/// LP fee a freshly initialized pool starts with: dynamic pools start at zero
/// until their hook sets a fee.
#[inline]
pub fn initial_lp_fee(fee: u32) -> u32 {
    if is_dynamic_fee(fee) { 0 } else { fee }
}

/// Two 12-bit protocol fee rates packed in 24 bits.
///
/// The low 12 bits apply to zero-for-one swaps, the high 12 bits to
/// one-for-zero swaps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolFee(u32);

impl ProtocolFee {
    pub const ZERO: ProtocolFee = ProtocolFee(0);

    pub fn new(zero_for_one: u32, one_for_zero: u32) -> Self {
        ProtocolFee((zero_for_one & 0xfff) | ((one_for_zero & 0xfff) << 12))
    }

    /// Wraps a raw packed value without checking it; see [`ProtocolFee::is_valid`].
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ProtocolFee(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn zero_for_one(&self) -> u32 {
        self.0 & 0xfff
    }

    #[inline]
    pub fn one_for_zero(&self) -> u32 {
        (self.0 >> 12) & 0xfff
    }

    #[inline]
    pub fn for_direction(&self, zero_for_one: bool) -> u32 {
        if zero_for_one {
            self.zero_for_one()
        } else {
            self.one_for_zero()
        }
    }

    /// The value fits in 24 bits and both directions are at most `MAX_PROTOCOL_FEE`.
    pub fn is_valid(&self) -> bool {
        self.0 >> 24 == 0
            && self.zero_for_one() <= MAX_PROTOCOL_FEE
            && self.one_for_zero() <= MAX_PROTOCOL_FEE
    }
}

/// Total fee charged on a swap when a protocol rate is skimmed ahead of the
/// LP fee: `protocol + lp - protocol * lp / 1e6`.
pub fn calculate_swap_fee(protocol_fee_rate: u32, lp_fee: u32) -> u32 {
    let protocol = u64::from(protocol_fee_rate);
    let lp = u64::from(lp_fee);
    (protocol + lp - protocol * lp / PIPS_DENOMINATOR) as u32
}
