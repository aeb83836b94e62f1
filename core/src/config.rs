//! Engine configuration.
//!
//! Two durations drive every deadline in the core: the check-in tolerance
//! window and the redemption validation window. Both have fixed product
//! defaults and can be overridden from the environment for staging setups.

use chrono::Duration;
use std::env;

/// Default check-in grace period after the scheduled start, in minutes
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 10;

/// Default redemption validation window, in hours
pub const DEFAULT_REDEMPTION_TTL_HOURS: i64 = 24;

/// Tunables shared by the lifecycle engine and the loyalty ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Grace period after the scheduled start during which check-in is
    /// unconditionally honored. Stamped onto online appointments at
    /// creation time; immutable afterwards.
    pub tolerance: Duration,
    /// How long an issued redemption code stays validatable
    pub redemption_ttl: Duration,
}

impl EngineConfig {
    /// Loads the configuration from environment variables, falling back
    /// to the product defaults.
    ///
    /// - `NAVALHA_TOLERANCE_MINUTES` - check-in grace period
    /// - `NAVALHA_REDEMPTION_TTL_HOURS` - redemption code lifetime
    #[must_use]
    pub fn from_env() -> Self {
        let tolerance_minutes = env::var("NAVALHA_TOLERANCE_MINUTES")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_TOLERANCE_MINUTES);
        let ttl_hours = env::var("NAVALHA_REDEMPTION_TTL_HOURS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_REDEMPTION_TTL_HOURS);

        Self {
            tolerance: Duration::minutes(tolerance_minutes),
            redemption_ttl: Duration::hours(ttl_hours),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: Duration::minutes(DEFAULT_TOLERANCE_MINUTES),
            redemption_ttl: Duration::hours(DEFAULT_REDEMPTION_TTL_HOURS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_product_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.tolerance, Duration::minutes(10));
        assert_eq!(config.redemption_ttl, Duration::hours(24));
    }
}
