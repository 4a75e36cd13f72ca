#[derive(Clone, Debug)]
pub struct AppConfig {
    // =========================
    // Capacity configuration
    // =========================
    /// Per-team concurrency unit every `Seniority::max_concurrent` and
    /// `Team::max_concurrent` is scaled from (`⌊base · multiplier⌋`).
    pub base_capacity: u32,

    /// Queue admission multiplier: a queue accepts up to `⌊capacity ·
    /// queue_multiplier⌋` sessions before refusing.
    pub queue_multiplier: f64,

    /// TTL for `CapacityCalculator`'s per-team/total capacity cache.
    pub capacity_cache_ttl_secs: u64,

    // =========================
    // Liveness configuration
    // =========================
    /// Consecutive missed polls before a session is marked `Inactive`.
    pub missed_poll_threshold: u32,

    /// Expected interval between client polls; a poll older than this is
    /// "stale" for the purposes of `missedPollCount` accounting.
    pub expected_poll_interval_secs: f64,

    /// Grace window around a shift boundary during which
    /// `accepting_new_chats` is already false but `active` remains true,
    /// letting in-flight chats finish.
    pub shift_handoff_minutes: i64,

    // =========================
    // Scheduler cadence
    // =========================
    /// `Dispatcher::tick` interval.
    pub dispatcher_tick_ms: u64,

    /// `Monitor::tick` interval.
    pub monitor_tick_ms: u64,

    /// Sessions drained from the main queue per dispatcher tick.
    pub main_batch_size: usize,

    /// Sessions promoted main → overflow per dispatcher tick during office
    /// hours.
    pub overflow_promotion_batch: usize,

    // =========================
    // Assignment retry configuration
    // =========================
    /// Max persistence attempts in `Assigner::try_assign` before the
    /// session is returned to `Queued`.
    pub assignment_max_attempts: u32,

    /// Backoff unit; attempt `n` sleeps `n * assignment_backoff_unit_ms`.
    pub assignment_backoff_unit_ms: u64,
}

impl AppConfig {
    /// Reads overrides from the environment, falling back to spec.md §6's
    /// literal constants.
    pub fn from_env() -> Self {
        Self {
            base_capacity: env_u32("BASE_CAPACITY", 10),
            queue_multiplier: env_f64("QUEUE_MULTIPLIER", 1.5),
            capacity_cache_ttl_secs: env_u64("CAPACITY_CACHE_TTL_SECS", 5),

            missed_poll_threshold: env_u32("MISSED_POLL_THRESHOLD", 3),
            expected_poll_interval_secs: env_f64("EXPECTED_POLL_INTERVAL_SECS", 1.0),
            shift_handoff_minutes: env_i64("SHIFT_HANDOFF_MINUTES", 5),

            dispatcher_tick_ms: env_u64("DISPATCHER_TICK_MS", 2_000),
            monitor_tick_ms: env_u64("MONITOR_TICK_MS", 5_000),
            main_batch_size: env_u64("MAIN_BATCH_SIZE", 10) as usize,
            overflow_promotion_batch: env_u64("OVERFLOW_PROMOTION_BATCH", 5) as usize,

            assignment_max_attempts: env_u32("ASSIGNMENT_MAX_ATTEMPTS", 3),
            assignment_backoff_unit_ms: env_u64("ASSIGNMENT_BACKOFF_UNIT_MS", 100),
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
