//! Engine configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunable parameters of the escrow/matchmaking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Smallest stake a join may escrow.
    pub min_stake: Decimal,
    /// Largest stake a join may escrow.
    pub max_stake: Decimal,
    /// Balance newly opened accounts start with.
    pub starting_balance: Decimal,
    /// Disconnect-to-abandonment grace window, in milliseconds.
    pub grace_period_ms: u64,
    /// Abandonment sweeper interval, in milliseconds.
    pub sweep_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_stake: Decimal::new(1, 2),       // 0.01
            max_stake: Decimal::new(10_000, 0),  // 10000.00
            starting_balance: Decimal::ZERO,
            grace_period_ms: constants::DEFAULT_GRACE_PERIOD_MS,
            sweep_interval_ms: constants::DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl EngineConfig {
    /// Read configuration from `RACKUP_*` environment variables, falling
    /// back to defaults for anything missing or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_stake: env_decimal("RACKUP_MIN_STAKE", defaults.min_stake),
            max_stake: env_decimal("RACKUP_MAX_STAKE", defaults.max_stake),
            starting_balance: env_decimal("RACKUP_STARTING_BALANCE", defaults.starting_balance),
            grace_period_ms: env_u64("RACKUP_GRACE_PERIOD_MS", defaults.grace_period_ms),
            sweep_interval_ms: env_u64("RACKUP_SWEEP_INTERVAL_MS", defaults.sweep_interval_ms),
        }
    }

    /// # Errors
    /// Returns [`EngineError::Configuration`](crate::EngineError::Configuration)
    /// for inverted stake bounds, non-positive minimum stake, a negative
    /// starting balance, or a zero grace period.
    pub fn validate(&self) -> crate::Result<()> {
        if self.min_stake <= Decimal::ZERO {
            return Err(crate::EngineError::Configuration(format!(
                "min_stake must be positive, got {}",
                self.min_stake
            )));
        }
        if self.min_stake > self.max_stake {
            return Err(crate::EngineError::Configuration(format!(
                "min_stake {} exceeds max_stake {}",
                self.min_stake, self.max_stake
            )));
        }
        if self.starting_balance < Decimal::ZERO {
            return Err(crate::EngineError::Configuration(format!(
                "starting_balance must be non-negative, got {}",
                self.starting_balance
            )));
        }
        if self.grace_period_ms == 0 {
            return Err(crate::EngineError::Configuration(
                "grace_period_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
