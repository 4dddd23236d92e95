//! Shared constants for lightchat.
//!
//! Centralizes magic numbers and storage keys used across crates.

/// Lowest accepted light temperature, in Kelvin.
pub const MIN_TEMPERATURE: u32 = 1000;

/// Highest accepted light temperature, in Kelvin.
pub const MAX_TEMPERATURE: u32 = 27000;

/// Stored value meaning "temperature not set".
pub const TEMPERATURE_UNSET: i64 = 0;

/// Counter key incremented to allocate light ids.
pub const LIGHT_ID_COUNTER_KEY: &str = "light:id:counter";

/// Index set holding every live light id.
pub const ALL_LIGHTS_SET_KEY: &str = "lights:all";

/// Document key for one light.
#[must_use]
pub fn light_key(id: u64) -> String {
    format!("light:{id}")
}

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 20;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Idle sessions older than this are evicted (default: one day).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

/// Upper bound on live sessions before the oldest idle one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Interval between background session expiry sweeps.
pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 300;

/// Maximum model ↔ tool round trips inside a single turn.
pub const MAX_TOOL_ROUNDS: usize = 8;
