//! Time utilities for the simulation and server lifecycle

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in seconds as a float (simulation clock)
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
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

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60;
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Clamp on the wall-clock tick delta; a debugger pause or an overloaded host
/// must not turn into one huge integration step
pub const MAX_TICK_DELTA: f32 = 0.25;

/// Fixed step applied per input command (movement is input-driven)
pub const INPUT_STEP: f32 = 1.0 / SIMULATION_TPS as f32;
