//! Core traits for pattern matching

use std::fmt::Debug;

/// Trait for string pattern matchers
///
/// Implementations are immutable after construction and safe to share across
/// threads without synchronization.
pub trait StringMatcher: Debug + Send + Sync {
    /// Match a string value against this pattern
    fn string_match(&self, value: &str) -> bool;
}
