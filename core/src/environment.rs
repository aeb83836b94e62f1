//! Injected dependencies shared by every engine.
//!
//! Time is the only ambient capability the core reaches for on its own;
//! everything else (storage, gateways) arrives as an explicit trait
//! object. Deadlines - the check-in tolerance window and the redemption
//! validation window - are always evaluated lazily against the injected
//! clock at operation time; there is no background timer anywhere in the
//! core.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
