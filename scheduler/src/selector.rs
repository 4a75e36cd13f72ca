//! C8: junior-first, capacity-weighted round-robin agent selection, plus
//! the batch optimizer the dispatcher uses to map a queue segment onto
//! available agents in one pass.

use std::sync::Arc;

use session::{Agent, AgentId, AgentStore, ChatSession, SessionId, Team};

use crate::round_robin::RoundRobinCoordinator;

pub struct AgentSelector {
    agents: Arc<AgentStore>,
    rr: Arc<RoundRobinCoordinator>,
}

impl AgentSelector {
    pub fn new(agents: Arc<AgentStore>, rr: Arc<RoundRobinCoordinator>) -> Self {
        Self { agents, rr }
    }

    /// Single pick. `useOverflow` selects among Overflow agents directly;
    /// otherwise a team is chosen by round-robin over `[TeamA, TeamB, TeamC]`
    /// and the seniority walk runs inside it.
    pub fn select_next(&self, use_overflow: bool) -> Option<AgentId> {
        if use_overflow {
            return self.select_overflow();
        }
        let picked = self.rr.next(RoundRobinCoordinator::CROSS_TEAM_ROTATION_KEY, Team::ROTATION_ORDER.len() as u64).ok()?;
        let team = Team::ROTATION_ORDER[picked as usize];
        self.seniority_walk(team)
    }

    fn select_overflow(&self) -> Option<AgentId> {
        let bucket = self.agents.acceptable_in_team(Team::Overflow);
        self.round_robin_pick(&RoundRobinCoordinator::team_key(Team::Overflow), &bucket)
    }

    /// Iterates `Junior, MidLevel, Senior, TeamLead`; the first cohort with
    /// any `available > 0` agent wins. Within that cohort, the top-capacity
    /// subset is round-robined. Re-fetches `team`'s roster from the live
    /// store on every call rather than working off a cached snapshot, so a
    /// sibling reservation taken earlier in the same batch is reflected
    /// immediately and the walk falls through to the next tier instead of
    /// repeatedly re-picking an agent the batch has already exhausted.
    fn seniority_walk(&self, team: Team) -> Option<AgentId> {
        let bucket = self.agents.acceptable_in_team(team);
        let base_capacity = self.agents.base_capacity();
        for seniority in session::Seniority::WALK_ORDER {
            let cohort: Vec<&Agent> = bucket
                .iter()
                .filter(|a| a.seniority == seniority && a.available(base_capacity) > 0)
                .collect();
            if cohort.is_empty() {
                continue;
            }
            let max_available = cohort.iter().map(|a| a.available(base_capacity)).max().unwrap();
            let mut top: Vec<&Agent> = cohort.into_iter().filter(|a| a.available(base_capacity) == max_available).collect();
            top.sort_by_key(|a| a.id);
            let key = RoundRobinCoordinator::team_seniority_key(team, seniority);
            return self.round_robin_pick_from(&key, &top);
        }
        None
    }

    fn round_robin_pick(&self, key: &str, bucket: &[Agent]) -> Option<AgentId> {
        let refs: Vec<&Agent> = bucket.iter().collect();
        self.round_robin_pick_from(key, &refs)
    }

    fn round_robin_pick_from(&self, key: &str, sorted: &[&Agent]) -> Option<AgentId> {
        if sorted.is_empty() {
            return None;
        }
        let idx = self.rr.next(key, sorted.len() as u64).ok()?;
        Some(sorted[idx as usize].id)
    }

    /// Batch optimizer for the main queue: walks `sessions` in order,
    /// advancing a local team-rotation cursor after each successful pick.
    /// Each candidate team's roster is re-read from the live store per
    /// session (see `seniority_walk`), so a reservation taken earlier in
    /// this same batch is accounted for immediately. Reservations are held
    /// on success; the caller commits or releases each one.
    pub fn create_optimal_assignments(&self, sessions: &[ChatSession]) -> Vec<(SessionId, AgentId)> {
        let mut team_index = 0usize;
        let mut out = Vec::new();

        for session in sessions {
            let mut picked = None;
            for i in 0..Team::ROTATION_ORDER.len() {
                let team = Team::ROTATION_ORDER[(team_index + i) % Team::ROTATION_ORDER.len()];
                if let Some(agent_id) = self.seniority_walk(team) {
                    picked = Some((team, agent_id));
                    break;
                }
            }

            let Some((team, agent_id)) = picked else { continue };
            if self.agents.try_reserve(&agent_id) {
                out.push((session.id, agent_id));
                let picked_index = Team::ROTATION_ORDER.iter().position(|t| *t == team).unwrap();
                team_index = (picked_index + 1) % Team::ROTATION_ORDER.len();
            }
            // Reservation failure: drop the session this tick, the agent is
            // reconsidered next tick, team_index is left unchanged.
        }

        out
    }

    /// Same shape as `create_optimal_assignments`, restricted to the
    /// Overflow team — used by `processOverflowQueue`. Re-fetches the
    /// Overflow roster per session, same reasoning as `seniority_walk`.
    pub fn create_overflow_assignments(&self, sessions: &[ChatSession]) -> Vec<(SessionId, AgentId)> {
        let mut out = Vec::new();
        for session in sessions {
            let bucket = self.agents.acceptable_in_team(Team::Overflow);
            let Some(agent_id) = self.round_robin_pick(&RoundRobinCoordinator::team_key(Team::Overflow), &bucket) else {
                continue;
            };
            if self.agents.try_reserve(&agent_id) {
                out.push((session.id, agent_id));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use session::{Seniority, ShiftWindow};

    fn always_on_shift() -> ShiftWindow {
        ShiftWindow::new(NaiveTime::from_hms_opt(0, 0, 0).unwrap(), NaiveTime::from_hms_opt(23, 59, 0).unwrap())
    }

    fn mk_agent(seniority: Seniority, team: Team) -> Agent {
        let mut a = Agent::new("t", seniority, team, always_on_shift());
        a.active = true;
        a.accepting_new_chats = true;
        a
    }

    fn mk_sessions(n: usize) -> Vec<ChatSession> {
        (0..n).map(|i| ChatSession::new_queued(format!("u{i}"), chrono::Utc::now())).collect()
    }

    #[test]
    fn junior_preference_team_a_isolated() {
        let senior = mk_agent(Seniority::Senior, Team::TeamA); // cap 8
        let junior = mk_agent(Seniority::Junior, Team::TeamA); // cap 4
        let store = Arc::new(AgentStore::new(vec![senior, junior], 10));
        let rr = Arc::new(RoundRobinCoordinator::new());
        let selector = AgentSelector::new(store.clone(), rr);

        let sessions = mk_sessions(5);
        let assignments = selector.create_optimal_assignments(&sessions);
        for (_, agent_id) in &assignments {
            store.confirm_reservation(agent_id);
        }

        let junior_count = store.all().iter().find(|a| a.seniority == Seniority::Junior).unwrap().current;
        let senior_count = store.all().iter().find(|a| a.seniority == Seniority::Senior).unwrap().current;
        assert_eq!(junior_count, 4);
        assert_eq!(senior_count, 1);
    }

    #[test]
    fn two_juniors_split_evenly_before_midlevel_is_touched() {
        let j1 = mk_agent(Seniority::Junior, Team::TeamA);
        let j2 = mk_agent(Seniority::Junior, Team::TeamA);
        let mid = mk_agent(Seniority::MidLevel, Team::TeamA);
        let store = Arc::new(AgentStore::new(vec![j1, j2, mid], 10));
        let rr = Arc::new(RoundRobinCoordinator::new());
        let selector = AgentSelector::new(store.clone(), rr);

        let sessions = mk_sessions(6);
        let assignments = selector.create_optimal_assignments(&sessions);
        for (_, agent_id) in &assignments {
            store.confirm_reservation(agent_id);
        }

        let all = store.all();
        let juniors: Vec<_> = all.iter().filter(|a| a.seniority == Seniority::Junior).collect();
        let mid_level = all.iter().find(|a| a.seniority == Seniority::MidLevel).unwrap();
        assert_eq!(juniors[0].current, 3);
        assert_eq!(juniors[1].current, 3);
        assert_eq!(mid_level.current, 0);
    }

    #[test]
    fn overflow_assignments_only_touch_overflow_agents() {
        let mut agents = vec![mk_agent(Seniority::Junior, Team::TeamA)];
        for _ in 0..2 {
            agents.push(mk_agent(Seniority::Junior, Team::Overflow));
        }
        let store = Arc::new(AgentStore::new(agents, 10));
        let rr = Arc::new(RoundRobinCoordinator::new());
        let selector = AgentSelector::new(store.clone(), rr);

        let sessions = mk_sessions(1);
        let assignments = selector.create_overflow_assignments(&sessions);
        assert_eq!(assignments.len(), 1);
        let (_, agent_id) = assignments[0];
        assert_eq!(store.get(&agent_id).unwrap().team, Team::Overflow);
    }
}
