//! Optimized collection types for rowskin.
//!
//! Layout passes run many times per second, so every map or set on the hot
//! path uses AHash instead of SipHash.

// Re-export optimized hash collections
pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};
