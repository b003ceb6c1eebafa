//! Hash map backend used for every per-pool and per-engine table.
//!
//! `rustc-hash` and `ahash` are opt-in; with neither (or with `std-hash`, or both)
//! the std SipHash map is used.

#[cfg(all(feature = "rustc-hash", not(feature = "ahash"), not(feature = "std-hash")))]
pub type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(all(feature = "ahash", not(feature = "rustc-hash"), not(feature = "std-hash")))]
pub type FastMap<K, V> = ahash::AHashMap<K, V>;

#[cfg(any(
    feature = "std-hash",
    all(feature = "rustc-hash", feature = "ahash"),
    all(not(feature = "rustc-hash"), not(feature = "ahash")),
))]
pub type FastMap<K, V> = std::collections::HashMap<K, V>;
