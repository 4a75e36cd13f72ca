//! C3: holds agents, their shifts, counts, and in-flight reservations.
//!
//! The roster is fixed at process start and never grows or shrinks, so the
//! id→agent map itself never needs a lock — only the per-agent state
//! (`active`, `accepting_new_chats`, `current`, `reserved`) does. Each agent
//! gets its own `parking_lot::Mutex`, matching spec §5's "per-agent
//! exclusion, avoid global locks" discipline.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::instrument;

use crate::model::{Agent, AgentId, Team};
use crate::roster::ShiftManager;

pub struct AgentStore {
    agents: HashMap<AgentId, Mutex<Agent>>,
    base_capacity: u32,
}

impl AgentStore {
    pub fn new(agents: Vec<Agent>, base_capacity: u32) -> Self {
        let agents = agents.into_iter().map(|a| (a.id, Mutex::new(a))).collect();
        Self { agents, base_capacity }
    }

    pub fn get(&self, id: &AgentId) -> Option<Agent> {
        self.agents.get(id).map(|m| m.lock().clone())
    }

    pub fn all(&self) -> Vec<Agent> {
        self.agents.values().map(|m| m.lock().clone()).collect()
    }

    pub fn by_team(&self, team: Team) -> Vec<Agent> {
        self.agents
            .values()
            .map(|m| m.lock().clone())
            .filter(|a| a.team == team)
            .collect()
    }

    pub fn all_active(&self) -> Vec<Agent> {
        self.agents.values().map(|m| m.lock().clone()).filter(|a| a.active).collect()
    }

    /// `active ∧ acceptingNewChats ∧ current+reserved < maxConcurrent`.
    pub fn acceptable(&self) -> Vec<Agent> {
        self.agents
            .values()
            .map(|m| m.lock().clone())
            .filter(|a| a.can_accept(self.base_capacity))
            .collect()
    }

    pub fn acceptable_in_team(&self, team: Team) -> Vec<Agent> {
        self.acceptable().into_iter().filter(|a| a.team == team).collect()
    }

    /// Sum of `maxConcurrent` over all active agents in `team`.
    pub fn team_capacity(&self, team: Team) -> u32 {
        self.by_team(team)
            .into_iter()
            .filter(|a| a.active)
            .map(|a| a.max_concurrent(self.base_capacity))
            .sum()
    }

    pub fn total_capacity(&self, teams: &[Team]) -> u32 {
        teams.iter().map(|t| self.team_capacity(*t)).sum()
    }

    /// Under per-agent exclusion: if the acceptance predicate holds,
    /// increments `reserved` and returns true; else returns false.
    #[instrument(skip(self), fields(agent_id = %id))]
    pub fn try_reserve(&self, id: &AgentId) -> bool {
        let Some(lock) = self.agents.get(id) else { return false };
        let mut agent = lock.lock();
        if agent.can_accept(self.base_capacity) {
            agent.reserved += 1;
            true
        } else {
            false
        }
    }

    /// Decrements `reserved` if positive. Safe no-op otherwise (e.g. the
    /// reservation was already consumed by a commit).
    pub fn release_reservation(&self, id: &AgentId) {
        if let Some(lock) = self.agents.get(id) {
            let mut agent = lock.lock();
            if agent.reserved > 0 {
                agent.reserved -= 1;
            }
        }
    }

    /// Decrements `reserved` and increments `current` if `reserved > 0`.
    pub fn confirm_reservation(&self, id: &AgentId) -> bool {
        let Some(lock) = self.agents.get(id) else { return false };
        let mut agent = lock.lock();
        if agent.reserved > 0 {
            agent.reserved -= 1;
            agent.current += 1;
            true
        } else {
            false
        }
    }

    /// Increments `current` if the acceptance predicate holds, bypassing the
    /// reserve/commit dance. Fails otherwise.
    pub fn assign_direct(&self, id: &AgentId) -> bool {
        let Some(lock) = self.agents.get(id) else { return false };
        let mut agent = lock.lock();
        if agent.can_accept(self.base_capacity) {
            agent.current += 1;
            true
        } else {
            false
        }
    }

    /// Decrements `current` if positive. Called when a session completes or
    /// is inactivated while assigned.
    pub fn complete_chat(&self, id: &AgentId) {
        if let Some(lock) = self.agents.get(id) {
            let mut agent = lock.lock();
            if agent.current > 0 {
                agent.current -= 1;
            }
        }
    }

    /// Refreshes `active`/`accepting_new_chats` for every agent from its
    /// shift window (C6).
    pub fn refresh_shifts(&self, shift_manager: &ShiftManager, now: chrono::DateTime<chrono::Utc>) {
        for lock in self.agents.values() {
            let mut agent = lock.lock();
            let (active, accepting) = shift_manager.compute_flags(&agent, now);
            agent.active = active;
            agent.accepting_new_chats = accepting;
        }
    }

    pub fn base_capacity(&self) -> u32 {
        self.base_capacity
    }
}
