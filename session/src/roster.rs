//! Fixed startup roster (§6) and the shift manager that keeps each agent's
//! `active`/`accepting_new_chats` flags in sync with its shift window (C6).

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::America::New_York;

use crate::model::{Agent, Seniority, ShiftWindow, Team};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time-of-day constant")
}

/// Builds the fixed agent roster described in spec §6. Called once at
/// process start; the returned agents are handed to `AgentStore::new` and
/// never destroyed afterward.
pub fn fixed_roster() -> Vec<Agent> {
    let team_a_shift = ShiftWindow::new(t(0, 0), t(8, 5));
    let team_b_shift = ShiftWindow::new(t(7, 55), t(16, 5));
    let team_c_shift = ShiftWindow::new(t(15, 55), t(0, 5));
    let overflow_shift = ShiftWindow::new(t(9, 0), t(17, 0));

    let mut agents = Vec::new();

    agents.push(Agent::new("Alice Thompson", Seniority::TeamLead, Team::TeamA, team_a_shift));
    agents.push(Agent::new("Bob Wilson", Seniority::MidLevel, Team::TeamA, team_a_shift));
    agents.push(Agent::new("Carol Davis", Seniority::MidLevel, Team::TeamA, team_a_shift));
    agents.push(Agent::new("David Brown", Seniority::Junior, Team::TeamA, team_a_shift));

    agents.push(Agent::new("Emma Johnson", Seniority::Senior, Team::TeamB, team_b_shift));
    agents.push(Agent::new("Frank Miller", Seniority::MidLevel, Team::TeamB, team_b_shift));
    agents.push(Agent::new("Grace Lee", Seniority::Junior, Team::TeamB, team_b_shift));
    agents.push(Agent::new("Henry Chen", Seniority::Junior, Team::TeamB, team_b_shift));

    agents.push(Agent::new("Isabel Rodriguez", Seniority::MidLevel, Team::TeamC, team_c_shift));
    agents.push(Agent::new("Jack Anderson", Seniority::MidLevel, Team::TeamC, team_c_shift));

    for i in 1..=6 {
        agents.push(Agent::new(
            format!("Overflow Agent {i}"),
            Seniority::Junior,
            Team::Overflow,
            overflow_shift,
        ));
    }

    agents
}

/// Updates `active`/`accepting_new_chats` for every agent from its shift
/// window. Non-overflow teams are scheduled in UTC; the Overflow team's
/// window is interpreted in US-Eastern local time (spec §9 resolves the
/// UTC/Eastern ambiguity in favor of Eastern).
pub struct ShiftManager {
    handoff: chrono::Duration,
}

impl ShiftManager {
    pub fn new() -> Self {
        Self {
            handoff: chrono::Duration::minutes(5),
        }
    }

    /// Computes the new `(active, accepting_new_chats)` flags for `agent` at
    /// `now`. Does not mutate `agent` — callers apply the result under the
    /// agent's store lock (`AgentStore::refresh_shifts`).
    pub fn compute_flags(&self, agent: &Agent, now: DateTime<Utc>) -> (bool, bool) {
        let at = if agent.team == Team::Overflow {
            now.with_timezone(&New_York).time()
        } else {
            now.time()
        };

        let active = agent.shift.contains(at);
        let accepting = active && agent.shift.minutes_until_end(at) > self.handoff.num_minutes();
        (active, accepting)
    }
}

impl Default for ShiftManager {
    fn default() -> Self {
        Self::new()
    }
}
