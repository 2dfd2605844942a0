//! Optimized allocation and collection types for Resonar.
//!
//! This module provides:
//! - Re-exports of optimized hash collections using AHash
//! - A generational [`slab::Slab`] whose slots stay valid until removed

pub mod slab;

// Re-export optimized hash collections
pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};
