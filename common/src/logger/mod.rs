mod init;
mod macros;
mod trace_id;

pub use init::init_logger;
pub use macros::{child_span, root_span};
pub use trace_id::TraceId;

use std::time::Duration;

/// Runs `fut` and logs a `warn` if it takes longer than `max`. Used around
/// store calls in the dispatcher/monitor ticks so a slow in-memory operation
/// (lock contention, a large enumeration) shows up in logs without turning
/// into a hard failure.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
