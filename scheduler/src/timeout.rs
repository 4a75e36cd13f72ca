//! C10: staleness scan, missed-poll increment, inactivation + agent
//! release.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, Counters};
use session::{AgentStore, SessionStore, Status};
use tracing::{info, instrument};

const MISSED_POLL_THRESHOLD: u32 = 3;
const STALE_AFTER: chrono::Duration = chrono::Duration::seconds(1);

pub struct SessionTimeoutService {
    sessions: Arc<SessionStore>,
    agents: Arc<AgentStore>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl SessionTimeoutService {
    pub fn new(sessions: Arc<SessionStore>, agents: Arc<AgentStore>, clock: Arc<dyn Clock>, counters: Counters) -> Self {
        Self { sessions, agents, clock, counters }
    }

    #[instrument(skip(self))]
    pub fn process_timeouts(&self) {
        self.increment_missed_for_stale();
        self.reap_timed_out();
    }

    /// For every `{Queued, Assigned, Active}` session, if a full second has
    /// elapsed since `lastPolledAt` without a poll, increment
    /// `missedPollCount`.
    fn increment_missed_for_stale(&self) {
        let now = self.clock.now();
        for session in self.sessions.active_for_monitoring() {
            if now.signed_duration_since(session.last_polled_at) >= STALE_AFTER {
                self.bump_missed(session.id, now);
            }
        }
    }

    fn bump_missed(&self, session_id: session::SessionId, now: DateTime<Utc>) {
        if let Some(mut session) = self.sessions.get(&session_id) {
            // The check above reads a snapshot; re-check under the
            // whole-object update before mutating so a poll racing in
            // between doesn't get clobbered.
            if now.signed_duration_since(session.last_polled_at) >= STALE_AFTER {
                session.missed_poll_count += 1;
                self.sessions.update(session);
            }
        }
    }

    /// `timedOut()`: transitions each session with `missedPollCount >= 3` to
    /// `Inactive`, releasing its agent's `current` slot if one was held.
    fn reap_timed_out(&self) {
        for session in self.sessions.timed_out(MISSED_POLL_THRESHOLD) {
            let Some(agent_id) = self.sessions.inactivate(&session.id) else { continue };
            info!(session_id = %session.id, missed_polls = session.missed_poll_count, "session timed out");
            self.agents.complete_chat(&agent_id);
            Counters::incr(&self.counters.sessions_timed_out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::FixedClock;
    use session::{Agent, ChatSession, Seniority, ShiftWindow, Team};

    fn mk_agent() -> Agent {
        let mut a = Agent::new(
            "t",
            Seniority::Junior,
            Team::TeamA,
            ShiftWindow::new(chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap(), chrono::NaiveTime::from_hms_opt(23, 59, 0).unwrap()),
        );
        a.active = true;
        a.accepting_new_chats = true;
        a
    }

    #[test]
    fn stale_session_accumulates_missed_polls_then_times_out() {
        let t0 = Utc::now();
        let clock = Arc::new(FixedClock::new(t0));

        let agent = mk_agent();
        let agent_id = agent.id;
        let agents = Arc::new(AgentStore::new(vec![agent], 10));
        assert!(agents.assign_direct(&agent_id));

        let mut session = ChatSession::new_queued("u1", t0);
        session.assign_to_agent(agent_id, t0);
        let session_id = session.id;
        let sessions = Arc::new(SessionStore::new());
        sessions.insert(session);

        let service = SessionTimeoutService::new(sessions.clone(), agents.clone(), clock.clone(), common::Counters::default());

        for _ in 0..3 {
            clock.advance(chrono::Duration::seconds(1));
            service.process_timeouts();
        }

        let s = sessions.get(&session_id).unwrap();
        assert_eq!(s.status, Status::Inactive);
        assert_eq!(agents.get(&agent_id).unwrap().current, 0);
    }

    #[test]
    fn polling_resets_missed_count_and_avoids_timeout() {
        let t0 = Utc::now();
        let clock = Arc::new(FixedClock::new(t0));

        let agents = Arc::new(AgentStore::new(vec![], 10));
        let sessions = Arc::new(SessionStore::new());
        let mut session = ChatSession::new_queued("u1", t0);
        let session_id = session.id;
        session.status = Status::Active;
        sessions.insert(session);

        let service = SessionTimeoutService::new(sessions.clone(), agents, clock.clone(), common::Counters::default());

        clock.advance(chrono::Duration::seconds(1));
        service.process_timeouts();
        assert_eq!(sessions.get(&session_id).unwrap().missed_poll_count, 1);

        sessions.set_last_polled(&session_id, clock.now());
        assert_eq!(sessions.get(&session_id).unwrap().missed_poll_count, 0);

        clock.advance(chrono::Duration::milliseconds(500));
        service.process_timeouts();
        assert_eq!(sessions.get(&session_id).unwrap().missed_poll_count, 0);
    }
}
