//! The fixed-rate loop that drives every live room

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::matchmaking::Registry;
use crate::util::time::{now_secs, MAX_TICK_DELTA, TICK_DURATION_MICROS};

/// Advance all rooms at the simulation rate. The step length is the measured
/// wall-clock delta, clamped so a stalled process cannot take one giant
/// integration step when it resumes.
pub async fn run_tick_loop(registry: Arc<Registry>) {
    info!("Tick loop started");

    let mut ticker = interval(Duration::from_micros(TICK_DURATION_MICROS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        ticker.tick().await;

        let dt = last.elapsed().as_secs_f32().min(MAX_TICK_DELTA);
        last = Instant::now();

        registry.tick_all(now_secs(), dt);
        registry.reap_empty_rooms();
    }
}
