//! C7: per-team and total capacity with a short-TTL cache; admission
//! predicate.
//!
//! Cache entries are invalidated explicitly on commit (`Assigner::try_assign`
//! calls `invalidate`) and otherwise expire after `ttl`. Reads that hit a
//! stale entry are acceptable — admission is best-effort, final arbitration
//! happens at reservation time (spec §5, "never trust the cache for the
//! final admit decision").

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use session::{AgentStore, BusinessHours, Team};

const QUEUE_MULTIPLIER: f64 = 1.5;
const NON_OVERFLOW_TEAMS: [Team; 3] = [Team::TeamA, Team::TeamB, Team::TeamC];

struct CacheEntry {
    capacity: u32,
    fetched_at: Instant,
}

#[derive(Default)]
struct CapacityCache {
    per_team: std::collections::HashMap<Team, CacheEntry>,
    total: Option<CacheEntry>,
}

pub struct CapacityCalculator {
    agents: Arc<AgentStore>,
    business_hours: Arc<BusinessHours>,
    ttl: Duration,
    cache: Mutex<CapacityCache>,
}

impl CapacityCalculator {
    pub fn new(agents: Arc<AgentStore>, business_hours: Arc<BusinessHours>) -> Self {
        Self {
            agents,
            business_hours,
            ttl: Duration::from_secs(5),
            cache: Mutex::new(CapacityCache::default()),
        }
    }

    pub fn team_capacity(&self, team: Team) -> u32 {
        let mut cache = self.cache.lock();
        if let Some(entry) = cache.per_team.get(&team) {
            if entry.fetched_at.elapsed() < self.ttl {
                return entry.capacity;
            }
        }
        let capacity = self.agents.team_capacity(team);
        cache.per_team.insert(
            team,
            CacheEntry {
                capacity,
                fetched_at: Instant::now(),
            },
        );
        capacity
    }

    /// Sum of `team_capacity` over Team A, B, C (never Overflow).
    pub fn total_capacity(&self) -> u32 {
        let mut cache = self.cache.lock();
        if let Some(entry) = &cache.total {
            if entry.fetched_at.elapsed() < self.ttl {
                return entry.capacity;
            }
        }
        drop(cache);
        let capacity = NON_OVERFLOW_TEAMS.iter().map(|t| self.team_capacity(*t)).sum();
        let mut cache = self.cache.lock();
        cache.total = Some(CacheEntry {
            capacity,
            fetched_at: Instant::now(),
        });
        capacity
    }

    pub fn overflow_capacity(&self) -> u32 {
        self.team_capacity(Team::Overflow)
    }

    pub fn queue_limit(capacity: u32) -> u32 {
        ((capacity as f64) * QUEUE_MULTIPLIER).floor() as u32
    }

    /// Drops any cached capacity for `team` (and the total, since it derives
    /// from every non-overflow team). Called on every committed assignment.
    pub fn invalidate(&self, team: Team) {
        let mut cache = self.cache.lock();
        cache.per_team.remove(&team);
        cache.total = None;
    }

    /// 1. main-queue room under `⌊totalCapacity · 1.5⌋` → accept.
    /// 2. else, during office hours, room under `⌊overflowCapacity · 1.5⌋`
    ///    in the overflow queue → accept (enters main queue first; the
    ///    dispatcher promotes it later).
    /// 3. else → refuse.
    pub fn can_accept(&self, main_queue_len: usize, overflow_queue_len: usize, now: chrono::DateTime<chrono::Utc>) -> bool {
        let main_limit = Self::queue_limit(self.total_capacity());
        if (main_queue_len as u32) < main_limit {
            return true;
        }
        if self.business_hours.is_office_hours(now) {
            let overflow_limit = Self::queue_limit(self.overflow_capacity());
            if (overflow_queue_len as u32) < overflow_limit {
                return true;
            }
        }
        false
    }
}
