//! C12: periodic tick (5s) running the timeout service.

use std::sync::Arc;

use common::Counters;
use tracing::instrument;

use crate::timeout::SessionTimeoutService;

pub struct Monitor {
    timeout_service: Arc<SessionTimeoutService>,
    counters: Counters,
}

impl Monitor {
    pub fn new(timeout_service: Arc<SessionTimeoutService>, counters: Counters) -> Self {
        Self { timeout_service, counters }
    }

    #[instrument(skip(self))]
    pub async fn tick(&self) {
        Counters::incr(&self.counters.monitor_ticks);
        self.timeout_service.process_timeouts();
    }
}
