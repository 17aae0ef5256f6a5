use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// Period and step of the fallback clock
pub const SYNTHETIC_TICK: Duration = Duration::from_secs(1);

/// Locally simulated playback clock.
///
/// The first tick fires one period after creation. Dropping the clock stops
/// it; there is no background task to leak.
#[derive(Debug)]
pub struct SyntheticClock {
    interval: Interval,
    ticks: u64,
}

impl SyntheticClock {
    pub fn start() -> Self {
        let mut interval = time::interval_at(Instant::now() + SYNTHETIC_TICK, SYNTHETIC_TICK);
        // A stalled controller must not replay a burst of seconds at once
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, ticks: 0 }
    }

    /// Wait for the next tick and return how many seconds of playback it represents
    pub async fn tick(&mut self) -> f64 {
        self.interval.tick().await;
        self.ticks += 1;
        trace!("Synthetic tick #{}", self.ticks);
        SYNTHETIC_TICK.as_secs_f64()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
