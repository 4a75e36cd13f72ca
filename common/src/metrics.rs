//! Plain-atomic operational counters shared by `scheduler` and `backend` so
//! the dispatcher/monitor loops can record ticks and outcomes without a
//! dependency from `scheduler` back onto `backend`. No external metrics
//! backend; a future exporter would read these atomics directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Counters {
    pub sessions_created: Arc<AtomicU64>,
    pub sessions_refused: Arc<AtomicU64>,
    pub sessions_assigned: Arc<AtomicU64>,
    pub sessions_timed_out: Arc<AtomicU64>,
    pub dispatcher_ticks: Arc<AtomicU64>,
    pub monitor_ticks: Arc<AtomicU64>,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
