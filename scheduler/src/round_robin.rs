//! C2: keyed monotonic counters returning `next % N`.
//!
//! One `Mutex<HashMap<String, u64>>`, not a lock per key — the teacher's
//! `SchedulerState` takes the same shape (a single `Mutex<SchedulerState>`
//! guarding a `HashMap<Pair, PairSchedulerState>`), since round-robin state
//! is tiny and touched on every selection, so sharding it buys nothing.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundRobinError {
    #[error("invalid argument: modulus must be > 0")]
    InvalidModulus,
}

#[derive(Default)]
pub struct RoundRobinCoordinator {
    counters: Mutex<HashMap<String, u64>>,
}

impl RoundRobinCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the counter stored at `key` with `(prev+1) mod n`
    /// and returns the new value. A key with no prior entry starts at 0.
    pub fn next(&self, key: &str, n: u64) -> Result<u64, RoundRobinError> {
        if n == 0 {
            return Err(RoundRobinError::InvalidModulus);
        }
        let mut counters = self.counters.lock();
        let entry = counters.entry(key.to_string()).or_insert(0);
        let picked = *entry % n;
        *entry = (picked + 1) % n;
        Ok(picked)
    }

    pub fn reset(&self, key: &str) {
        self.counters.lock().remove(key);
    }

    pub fn team_key(team: session::Team) -> String {
        format!("team_{team}")
    }

    pub fn team_seniority_key(team: session::Team, seniority: session::Seniority) -> String {
        format!("team_{team}_seniority_{seniority}")
    }

    /// Dedicated cross-team rotation key, distinct from any per-team key
    /// (see DESIGN.md for why this departs from reusing `team_TeamA`).
    pub const CROSS_TEAM_ROTATION_KEY: &'static str = "team_rotation";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_cycles_through_modulus() {
        let rr = RoundRobinCoordinator::new();
        assert_eq!(rr.next("k", 3).unwrap(), 0);
        assert_eq!(rr.next("k", 3).unwrap(), 1);
        assert_eq!(rr.next("k", 3).unwrap(), 2);
        assert_eq!(rr.next("k", 3).unwrap(), 0);
    }

    #[test]
    fn zero_modulus_is_invalid_argument() {
        let rr = RoundRobinCoordinator::new();
        assert_eq!(rr.next("k", 0), Err(RoundRobinError::InvalidModulus));
    }

    #[test]
    fn modulus_change_is_honored_immediately() {
        let rr = RoundRobinCoordinator::new();
        assert_eq!(rr.next("k", 5).unwrap(), 0);
        assert_eq!(rr.next("k", 5).unwrap(), 1);
        // Cohort shrank; next() must use the new N right away.
        assert_eq!(rr.next("k", 2).unwrap(), 0);
    }

    #[test]
    fn reset_drops_the_key() {
        let rr = RoundRobinCoordinator::new();
        rr.next("k", 3).unwrap();
        rr.next("k", 3).unwrap();
        rr.reset("k");
        assert_eq!(rr.next("k", 3).unwrap(), 0);
    }

    #[test]
    fn independent_keys_do_not_interfere() {
        let rr = RoundRobinCoordinator::new();
        assert_eq!(rr.next("a", 3).unwrap(), 0);
        assert_eq!(rr.next("b", 3).unwrap(), 0);
        assert_eq!(rr.next("a", 3).unwrap(), 1);
    }
}
