use crate::FastMap;
use crate::U256_1;
use crate::error::TickError;
use alloy_primitives::U256;

/// Sparse map from word index to a 256-bit word of initialized flags.
pub type TickBitmap = FastMap<i16, U256>;

/// Computes the bitmap word index and bit position for a compressed tick.
pub fn position(tick: i32) -> (i16, u8) {
    ((tick >> 8) as i16, (tick & 0xff) as u8)
}

/// Returns the bitmap word stored at `word`, or zero if absent.
pub fn get_word(bitmap: &TickBitmap, word: i16) -> U256 {
    bitmap.get(&word).copied().unwrap_or(U256::ZERO)
}

#[inline]
fn most_significant_bit(x: U256) -> u8 {
    (255 - x.leading_zeros()) as u8
}

#[inline]
fn least_significant_bit(x: U256) -> u8 {
    x.trailing_zeros() as u8
}

/// Floor division of `tick` by `tick_spacing`.
#[inline]
fn compress(tick: i32, tick_spacing: i32) -> i32 {
    let mut compressed = tick / tick_spacing;
    if tick < 0 && tick % tick_spacing != 0 {
        compressed -= 1;
    }
    compressed
}

/// Toggles the initialized status of a tick in the bitmap.
///
/// `tick` must be a multiple of `tick_spacing`. Words that become empty are
/// dropped from the map.
pub fn flip_tick(bitmap: &mut TickBitmap, tick: i32, tick_spacing: i32) -> Result<(), TickError> {
    if tick % tick_spacing != 0 {
        return Err(TickError::TickMisaligned { tick, tick_spacing });
    }

    let (word_pos, bit_pos) = position(tick / tick_spacing);
    let word = get_word(bitmap, word_pos) ^ (U256_1 << bit_pos);
    if word.is_zero() {
        bitmap.remove(&word_pos);
    } else {
        bitmap.insert(word_pos, word);
    }
    Ok(())
}

/// Searches the 256-bit word containing `tick` for the next initialized tick
/// to the left (`lte`, inclusive) or to the right (exclusive).
///
/// Returns the tick found and whether it is initialized. When nothing is
/// initialized in the word, the word boundary in the search direction is
/// returned with `false` so that a swap step never spans more than one word.
pub fn next_initialized_tick_within_one_word(
    bitmap: &TickBitmap,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> (i32, bool) {
    let compressed = compress(tick, tick_spacing);

    if lte {
        let (word_pos, bit_pos) = position(compressed);
        // all bits at or to the right of bit_pos
        let mask = (U256_1 << bit_pos) - U256_1 + (U256_1 << bit_pos);
        let masked = get_word(bitmap, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            (compressed - i32::from(bit_pos - most_significant_bit(masked))) * tick_spacing
        } else {
            (compressed - i32::from(bit_pos)) * tick_spacing
        };
        (next, initialized)
    } else {
        let (word_pos, bit_pos) = position(compressed + 1);
        // all bits at or to the left of bit_pos
        let mask = !((U256_1 << bit_pos) - U256_1);
        let masked = get_word(bitmap, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            (compressed + 1 + i32::from(least_significant_bit(masked) - bit_pos)) * tick_spacing
        } else {
            (compressed + 1 + i32::from(u8::MAX - bit_pos)) * tick_spacing
        };
        (next, initialized)
    }
}

/// Whether any tick is initialized in the search direction of a swap
/// starting at `tick`: at or below it for `lte`, strictly above otherwise.
///
/// Only the stored words are visited.
pub fn has_initialized_tick(bitmap: &TickBitmap, tick: i32, tick_spacing: i32, lte: bool) -> bool {
    let compressed = compress(tick, tick_spacing);
    let (word_pos, bit_pos) = if lte {
        position(compressed)
    } else {
        position(compressed + 1)
    };

    bitmap.iter().any(|(&word, &bits)| {
        match word.cmp(&word_pos) {
            std::cmp::Ordering::Less => lte,
            std::cmp::Ordering::Greater => !lte,
            std::cmp::Ordering::Equal => {
                let mask = if lte {
                    (U256_1 << bit_pos) - U256_1 + (U256_1 << bit_pos)
                } else {
                    !((U256_1 << bit_pos) - U256_1)
                };
                !(bits & mask).is_zero()
            }
        }
    })
}
