//! Fixed-interval scheduler for the check-and-notify cycle.
//!
//! The first run happens one full interval after `start()`. Each run is
//! spawned as its own task, so a slow cycle never shifts the schedule, and a
//! scheduled run may overlap a manual `/checknow`.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cycle::{CheckCycle, Trigger};

#[derive(Clone)]
pub struct CheckScheduler {
    cycle: Arc<CheckCycle>,
    period: Duration,
    cancel: CancellationToken,
}

impl CheckScheduler {
    pub fn new(cycle: Arc<CheckCycle>, period: Duration) -> Self {
        Self {
            cycle,
            period,
            cancel: CancellationToken::new(),
        }
    }

    pub fn start(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        tracing::info!(period_secs = self.period.as_secs(), "scheduler started");
        tokio::spawn(async move { scheduler.run_loop().await })
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    async fn run_loop(&self) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
              _ = self.cancel.cancelled() => break,
              _ = ticker.tick() => {
                let cycle = self.cycle.clone();
                tokio::spawn(async move { cycle.run(Trigger::Scheduled).await });
              }
            }
        }

        tracing::info!("scheduler stopped");
    }
}
