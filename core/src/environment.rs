//! Injected dependencies for the engine's services.
//!
//! Time is the only ambient input the core consumes; abstracting it behind
//! [`Clock`] keeps refund math and closing-policy checks deterministic under
//! test (`tripdesk-testing` provides the fixed and adjustable clocks).

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
