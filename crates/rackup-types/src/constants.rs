//! System-wide constants for the Rackup engine.

/// Maximum decimal precision for money amounts (8 decimal places).
pub const AMOUNT_PRECISION: u32 = 8;

/// Default grace period between a room member's disconnect and
/// abandonment resolution, in milliseconds.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 30_000;

/// Default interval of the abandonment sweeper task, in milliseconds.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "RACKUP_";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Rackup";
