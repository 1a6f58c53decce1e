//! Stake policy — hard gate for wager validation.
//!
//! Every stake is validated here before a hold is opened. Fail-closed:
//! any check that errors rejects the stake, and every enqueue path goes
//! through the gate.

use rackup_types::{EngineConfig, EngineError, Result, money};
use rust_decimal::Decimal;

/// Hard gate that validates stakes before funds are escrowed.
#[derive(Debug, Clone)]
pub struct StakePolicy {
    /// Smallest stake a player may wager.
    min_stake: Decimal,
    /// Largest stake a player may wager.
    max_stake: Decimal,
}

impl StakePolicy {
    /// Create a policy from engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            min_stake: config.min_stake,
            max_stake: config.max_stake,
        }
    }

    /// Create a policy with explicit limits.
    #[must_use]
    pub fn with_limits(min_stake: Decimal, max_stake: Decimal) -> Self {
        Self {
            min_stake,
            max_stake,
        }
    }

    /// Validate a requested stake against all checks.
    ///
    /// # Errors
    /// Returns a specific error for each check that fails.
    pub fn validate(&self, stake: Decimal) -> Result<Decimal> {
        // 1. Basic validation
        money::ensure_positive(stake)?;

        // 2. Bounds check
        if stake < self.min_stake || stake > self.max_stake {
            return Err(EngineError::StakeOutOfBounds {
                stake,
                min: self.min_stake,
                max: self.max_stake,
            });
        }

        // 3. Precision normalization
        Ok(money::normalize(stake))
    }

    #[must_use]
    pub fn min_stake(&self) -> Decimal {
        self.min_stake
    }

    #[must_use]
    pub fn max_stake(&self) -> Decimal {
        self.max_stake
    }
}

impl Default for StakePolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
