//! C13: the public surface a future HTTP shell sits on top of (spec.md §6's
//! `/api/Chat/*` contract, in-process form).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, Counters};
use session::{AgentStore, BusinessHours, ChatSession, SessionId, SessionStore, Team};
use scheduler::CapacityCalculator;
use tracing::instrument;

pub struct DispatchService {
    sessions: Arc<SessionStore>,
    agents: Arc<AgentStore>,
    business_hours: Arc<BusinessHours>,
    capacity: Arc<CapacityCalculator>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl DispatchService {
    pub fn new(
        sessions: Arc<SessionStore>,
        agents: Arc<AgentStore>,
        business_hours: Arc<BusinessHours>,
        capacity: Arc<CapacityCalculator>,
        clock: Arc<dyn Clock>,
        counters: Counters,
    ) -> Self {
        Self {
            sessions,
            agents,
            business_hours,
            capacity,
            clock,
            counters,
        }
    }

    /// Idempotent: an existing `{Queued, Assigned, Active}` session for
    /// `user_id` is returned as-is rather than creating a second one.
    #[instrument(skip(self))]
    pub fn create_session(&self, user_id: &str) -> ChatSession {
        if let Some(existing) = self.sessions.find_active_for_user(user_id) {
            return existing;
        }

        let now = self.clock.now();
        let session = if self.can_accept() {
            Counters::incr(&self.counters.sessions_created);
            ChatSession::new_queued(user_id, now)
        } else {
            Counters::incr(&self.counters.sessions_refused);
            ChatSession::new_refused(user_id, now)
        };
        self.sessions.insert(session.clone());
        session
    }

    /// `false` if the session doesn't exist; otherwise records the poll and
    /// returns `true`.
    #[instrument(skip(self))]
    pub fn poll(&self, session_id: SessionId) -> bool {
        self.sessions.set_last_polled(&session_id, self.clock.now())
    }

    pub fn can_accept(&self) -> bool {
        self.capacity.can_accept(self.sessions.queue_length(), self.sessions.overflow_queue_length(), self.clock.now())
    }

    pub fn queue_position(&self, session_id: SessionId) -> usize {
        self.sessions.queue_position(&session_id)
    }

    /// `None` if the session isn't queued or no agent in the relevant pool
    /// is available; else `position * 5min / available_agent_count`.
    pub fn estimated_wait(&self, session_id: SessionId) -> Option<chrono::Duration> {
        let session = self.sessions.get(&session_id)?;
        if session.status != session::Status::Queued {
            return None;
        }

        let position = self.queue_position(session_id);
        if position == 0 {
            return None;
        }

        let team_pool = if session.is_in_overflow { Team::Overflow } else { Team::TeamA };
        let available: u32 = if session.is_in_overflow {
            self.agents.acceptable_in_team(team_pool).iter().map(|a| a.available(self.agents.base_capacity())).sum()
        } else {
            [Team::TeamA, Team::TeamB, Team::TeamC]
                .iter()
                .flat_map(|t| self.agents.acceptable_in_team(*t))
                .map(|a| a.available(self.agents.base_capacity()))
                .sum()
        };
        if available == 0 {
            return None;
        }

        let minutes = (position as f64) * 5.0 / (available as f64);
        Some(chrono::Duration::seconds((minutes * 60.0).round() as i64))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
