use std::{sync::Arc, time::Duration};

use rand::Rng;
use tokio::{
    sync::Notify,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::info;

use super::sweep::Engine;
use crate::{
    configuration::{AppState, State},
    error::Error,
};

/// Requests a sweep outside the regular interval. Requests made while a sweep
/// is running collapse into a single follow-up sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepTrigger(Arc<Notify>);

impl SweepTrigger {
    pub fn new() -> SweepTrigger {
        SweepTrigger(Arc::new(Notify::new()))
    }

    pub fn fire(&self) {
        self.0.notify_one();
    }

    async fn fired(&self) {
        self.0.notified().await;
    }
}

pub async fn sweep_task(app_state: AppState<State>) -> Result<(), Error> {
    let engine = Engine::from_state(&app_state)?;
    let period = Duration::from_secs(app_state.config.sweep_interval);
    let delay = startup_jitter(app_state.config.sweep_jitter);

    run(engine, app_state.trigger.clone(), period, delay).await;

    Ok(())
}

/// Sweeps once after `delay`, then every `period`. Sweeps never overlap; a
/// tick that falls due while one is running is skipped.
pub async fn run(
    engine: Engine,
    trigger: SweepTrigger,
    period: Duration,
    delay: Duration,
) {
    info!("First notification check in {}s", delay.as_secs());

    tokio::select! {
        _ = time::sleep(delay) => {},
        _ = trigger.fired() => info!("Notification check requested"),
    }

    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        engine.sweep().await;

        tokio::select! {
            _ = interval.tick() => {},
            _ = trigger.fired() => info!("Notification check requested"),
        }
    }
}

fn startup_jitter(max_seconds: u64) -> Duration {
    let seconds = rand::thread_rng().gen_range(0..=max_seconds);
    Duration::from_secs(seconds)
}
