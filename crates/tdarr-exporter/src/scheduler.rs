//! Fixed-interval polling loop.

use std::sync::Arc;
use std::time::Duration;

use crate::collector::Collector;

pub struct Scheduler {
    collector: Arc<Collector>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(collector: Arc<Collector>, interval: Duration) -> Self {
        Self { collector, interval }
    }

    /// Poll forever: one cycle, then sleep for the interval.
    ///
    /// Fetch failures are handled inside the cycle and never end the loop.
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "polling loop started");
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            let report = self.collector.run_cycle().await;
            tracing::trace!(cycle, ok = report.is_ok(), "cycle finished");
            tokio::time::sleep(self.interval).await;
        }
    }
}
