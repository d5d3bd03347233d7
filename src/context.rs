// src/context.rs
// =============================================================================
// The capabilities a pass needs from the outside world besides the network.
//
// Right now that is only the clock. It is handed to the scheduler explicitly
// instead of calling the system time from deep inside, so tests can supply
// predictable timestamps. Logging goes through `tracing`, whose subscriber is
// installed by the caller (main, or a test).
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Layout of every timestamp we persist, e.g. `2023-03-13 14:00:00.100001`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A point in time as stored in the results file.
///
/// Kept as the literal string so values written by older runs (or by hand)
/// survive a load/save cycle byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(value: impl Into<String>) -> Self {
        Timestamp(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string())
    }
}

/// Everything threaded through a pass that is not plain data.
#[derive(Clone)]
pub struct Context {
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Context { clock }
    }

    /// Production wiring: real time.
    pub fn system() -> Self {
        Context::new(Arc::new(SystemClock))
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn system_clock_uses_persisted_layout() {
        let now = SystemClock.now();
        let parsed = NaiveDateTime::parse_from_str(now.as_str(), TIMESTAMP_FORMAT);
        assert!(parsed.is_ok(), "unexpected timestamp: {}", now);
        // six fractional digits, always
        assert_eq!(now.as_str().rsplit('.').next().map(str::len), Some(6));
    }

    #[test]
    fn ticking_clock_counts_up() {
        let ctx = ticking_context();
        assert_eq!(ctx.now().as_str(), "2023-03-13 14:00:00.100001");
        assert_eq!(ctx.now().as_str(), "2023-03-13 14:00:00.100002");
    }
}
