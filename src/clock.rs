//! Clock seam consulted by the claims validator and nonce policy.
//!
//! The only externally observable resource in this crate is wall-clock
//! time; isolating it behind a trait lets tests exercise leeway/nonce
//! edge cases deterministically instead of sleeping real seconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// A source of the current Unix timestamp, in whole seconds.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch, UTC.
    fn now_unix(&self) -> i64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A clock fixed to a caller-chosen instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}
