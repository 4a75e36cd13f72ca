//! C9: reserve → commit/abort, with retries on transient store failures.
//!
//! Grounded in the teacher's `backend::scheduler::scheduler::Scheduler` tick
//! shape (select → reserve → persist → invalidate caches) and its retry/
//! backoff discipline is the one spec.md §4.8 specifies directly (3
//! attempts, `100·attempt` ms).

use std::sync::Arc;
use std::time::Duration;

use session::{AgentId, AgentStore, ChatSession, SessionId, SessionStore, Team};
use tracing::{instrument, warn};

use crate::capacity::CapacityCalculator;

const MAX_ATTEMPTS: u32 = 3;

pub struct Assigner {
    agents: Arc<AgentStore>,
    sessions: Arc<SessionStore>,
    capacity: Arc<CapacityCalculator>,
}

impl Assigner {
    pub fn new(agents: Arc<AgentStore>, sessions: Arc<SessionStore>, capacity: Arc<CapacityCalculator>) -> Self {
        Self { agents, sessions, capacity }
    }

    /// Commits a reservation already held on `agent_id` against `session_id`,
    /// retrying persistence up to `MAX_ATTEMPTS` times with `100·attempt` ms
    /// backoff. Every exit path matches the reservation with a commit or a
    /// release.
    #[instrument(skip(self), fields(session_id = %session_id, agent_id = %agent_id))]
    pub async fn try_assign(&self, session_id: SessionId, agent_id: AgentId, team: Team, now: chrono::DateTime<chrono::Utc>) -> bool {
        let Some(agent) = self.agents.get(&agent_id) else {
            self.agents.release_reservation(&agent_id);
            return false;
        };
        // Re-check that *this* reservation is still held, not whether the
        // agent could accept a fresh one: sibling reservations from the same
        // batch already count against `reserved`, so re-deriving the whole
        // admission predicate here would double-count them and reject a
        // perfectly valid commit.
        if agent.reserved < 1 {
            self.agents.release_reservation(&agent_id);
            return false;
        }

        let Some(mut session) = self.sessions.get(&session_id) else {
            self.agents.release_reservation(&agent_id);
            return false;
        };
        if !session.assign_to_agent(agent_id, now) {
            self.agents.release_reservation(&agent_id);
            return false;
        }

        if !self.agents.confirm_reservation(&agent_id) && !self.agents.assign_direct(&agent_id) {
            self.agents.release_reservation(&agent_id);
            return false;
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match self.persist(&session) {
                Ok(()) => {
                    self.sessions.remove_from_queue(&session_id, false);
                    self.sessions.remove_from_queue(&session_id, true);
                    self.capacity.invalidate(team);
                    return true;
                }
                Err(err) => {
                    warn!(attempt, %err, "persisting assignment failed; retrying");
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                    }
                }
            }
        }

        // Final failure: undo the in-memory state change so the session
        // remains `Queued` for the next tick, and release the agent slot.
        session.status = session::Status::Queued;
        session.assigned_agent_id = None;
        session.assigned_at = None;
        self.sessions.update(session);
        self.agents.complete_chat(&agent_id);
        false
    }

    /// In-memory persistence is infallible in this workspace; stands in for
    /// the store write a future durable backend would perform here.
    fn persist(&self, session: &ChatSession) -> anyhow::Result<()> {
        self.sessions.update(session.clone());
        Ok(())
    }
}
