//! Cache Entry Module
//!
//! Defines stored entries and the absolute expiry instant attached to each.

use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Expiry ==
/// Absolute expiry instant in Unix nanoseconds.
///
/// `Expiry::NEVER` (the maximum representable instant) marks entries
/// written with a zero TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Expiry(i64);

impl Expiry {
    /// Sentinel for entries that never expire.
    pub const NEVER: Expiry = Expiry(i64::MAX);

    /// Wraps a raw Unix nanosecond timestamp.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// The current wall-clock instant.
    pub fn now() -> Self {
        Self(current_timestamp_ns())
    }

    /// Expiry for a write performed now with the given TTL.
    ///
    /// A zero TTL yields `Expiry::NEVER`.
    pub fn after(ttl: Duration) -> Self {
        Self::now().offset(ttl)
    }

    /// Expiry `ttl` after this instant. A zero TTL yields `Expiry::NEVER`.
    pub fn offset(self, ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Self::NEVER;
        }
        let ttl_ns = i64::try_from(ttl.as_nanos()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(ttl_ns))
    }

    /// Raw Unix nanoseconds.
    pub fn as_nanos(self) -> i64 {
        self.0
    }

    pub fn is_never(self) -> bool {
        self == Self::NEVER
    }

    // == Is Expired ==
    /// True once `now` has reached this instant.
    ///
    /// An entry is live while `now < expires_at`, so the boundary itself
    /// counts as expired.
    pub fn is_expired_at(self, now: Expiry) -> bool {
        !self.is_never() && now >= self
    }
}

// == Cache Entry ==
/// A stored value plus its absolute expiry instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The stored value
    pub value: Bytes,
    /// When the entry stops being readable
    pub expires_at: Expiry,
}

impl Entry {
    // == Constructor ==
    /// Creates an entry whose expiry is `ttl` from now (zero = never).
    pub fn new(value: Bytes, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Expiry::after(ttl),
        }
    }

    pub fn with_expiry(value: Bytes, expires_at: Expiry) -> Self {
        Self { value, expires_at }
    }

    pub fn is_expired_at(&self, now: Expiry) -> bool {
        self.expires_at.is_expired_at(now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Expiry::now())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in nanoseconds.
pub fn current_timestamp_ns() -> i64 {
    // Out of range only after the year 2262.
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX - 1)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = Entry::new(Bytes::from_static(b"test_value"), Duration::ZERO);

        assert_eq!(entry.value, Bytes::from_static(b"test_value"));
        assert!(entry.expires_at.is_never());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = Entry::new(Bytes::from_static(b"v"), Duration::from_secs(60));

        assert!(!entry.expires_at.is_never());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = Entry::new(Bytes::from_static(b"v"), Duration::from_millis(50));

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(80));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Expiry::now();
        let entry = Entry::with_expiry(Bytes::new(), now);

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(Expiry::from_nanos(now.as_nanos() - 1)));
    }

    #[test]
    fn test_never_is_never_expired() {
        assert!(!Expiry::NEVER.is_expired_at(Expiry::NEVER));
        assert_eq!(Expiry::now().offset(Duration::ZERO), Expiry::NEVER);
    }

    #[test]
    fn test_offset_saturates() {
        let far = Expiry::from_nanos(i64::MAX - 10).offset(Duration::from_secs(1));
        assert_eq!(far.as_nanos(), i64::MAX);
    }
}
