//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Simulation tick interval (projectile physics + collision pass)
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Delay between entering the reloading state and the ammo refill
pub const RELOAD_DELAY: Duration = Duration::from_millis(1000);

/// Power-up spawn timer interval
pub const POWER_UP_INTERVAL: Duration = Duration::from_secs(10);

/// Periodic scoreboard sync interval
pub const SCOREBOARD_INTERVAL: Duration = Duration::from_secs(30);
