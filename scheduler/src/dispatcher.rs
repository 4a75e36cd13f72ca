//! C11: periodic tick (2s) draining the main queue, promoting sessions to
//! overflow during office hours, and draining the overflow queue against
//! the Overflow team.

use std::sync::Arc;
use std::time::Duration;

use common::{logger::warn_if_slow, Clock, Counters};
use session::{AgentStore, BusinessHours, SessionStore, Team};
use tracing::{info, instrument, warn};

use crate::assigner::Assigner;
use crate::capacity::CapacityCalculator;
use crate::selector::AgentSelector;

pub const MAIN_BATCH_SIZE: usize = 10;
pub const OVERFLOW_PROMOTION_BATCH: usize = 5;
pub const OVERFLOW_BATCH_SIZE: usize = 10;

pub struct Dispatcher {
    sessions: Arc<SessionStore>,
    agents: Arc<AgentStore>,
    business_hours: Arc<BusinessHours>,
    capacity: Arc<CapacityCalculator>,
    selector: Arc<AgentSelector>,
    assigner: Arc<Assigner>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<SessionStore>,
        agents: Arc<AgentStore>,
        business_hours: Arc<BusinessHours>,
        capacity: Arc<CapacityCalculator>,
        selector: Arc<AgentSelector>,
        assigner: Arc<Assigner>,
        clock: Arc<dyn Clock>,
        counters: Counters,
    ) -> Self {
        Self {
            sessions,
            agents,
            business_hours,
            capacity,
            selector,
            assigner,
            clock,
            counters,
        }
    }

    #[instrument(skip(self))]
    pub async fn tick(&self) {
        Counters::incr(&self.counters.dispatcher_ticks);
        self.process_main_queue().await;

        let now = self.clock.now();
        if self.business_hours.is_office_hours(now) {
            self.move_unassigned_to_overflow();
            self.process_overflow_queue().await;
        }
    }

    async fn process_main_queue(&self) {
        let available = warn_if_slow("agents.acceptable", Duration::from_millis(50), async { self.agents.acceptable() }).await;
        let limit = MAIN_BATCH_SIZE.min(available.len());
        if limit == 0 {
            return;
        }

        let candidates = self.sessions.pop_front_queued(false, limit);
        if candidates.is_empty() {
            return;
        }

        let assignments = self.selector.create_optimal_assignments(&candidates);
        self.commit_or_requeue(candidates, assignments, false).await;
    }

    async fn process_overflow_queue(&self) {
        let candidates = self.sessions.pop_front_queued(true, OVERFLOW_BATCH_SIZE);
        if candidates.is_empty() {
            return;
        }

        let assignments = self.selector.create_overflow_assignments(&candidates);
        self.commit_or_requeue(candidates, assignments, true).await;
    }

    /// Commits every reserved `(session, agent)` pair via the assigner; any
    /// candidate that didn't receive a reservation, or whose assignment
    /// failed, goes back to the front of its queue so it keeps its position
    /// for the next tick.
    async fn commit_or_requeue(&self, candidates: Vec<session::ChatSession>, assignments: Vec<(session::SessionId, session::AgentId)>, overflow: bool) {
        let assigned: std::collections::HashMap<_, _> = assignments.iter().copied().collect();
        let team = if overflow { Team::Overflow } else { Team::TeamA }; // invalidation team is refined per-agent below

        for candidate in candidates.into_iter().rev() {
            match assigned.get(&candidate.id) {
                Some(&agent_id) => {
                    let agent_team = self.agents.get(&agent_id).map(|a| a.team).unwrap_or(team);
                    let ok = warn_if_slow("assigner.try_assign", Duration::from_millis(100), async {
                        self.assigner.try_assign(candidate.id, agent_id, agent_team, self.clock.now()).await
                    })
                    .await;
                    if ok {
                        Counters::incr(&self.counters.sessions_assigned);
                    } else {
                        warn!(session_id = %candidate.id, "assignment failed; requeuing");
                        self.sessions.requeue_front(candidate.id, overflow);
                    }
                }
                None => {
                    self.sessions.requeue_front(candidate.id, overflow);
                }
            }
        }
    }

    /// Moves up to `OVERFLOW_PROMOTION_BATCH` still-`Queued` main-queue
    /// sessions into the overflow queue. Runs after `process_main_queue` in
    /// the same tick, so freshly demoted sessions only drain next tick.
    fn move_unassigned_to_overflow(&self) {
        let moved = self.sessions.move_unassigned_to_overflow(OVERFLOW_PROMOTION_BATCH);
        if !moved.is_empty() {
            info!(count = moved.len(), "promoted sessions to overflow");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use common::FixedClock;
    use session::{Agent, ChatSession, Seniority, ShiftWindow};

    use crate::round_robin::RoundRobinCoordinator;

    fn always_on_shift() -> ShiftWindow {
        ShiftWindow::new(NaiveTime::from_hms_opt(0, 0, 0).unwrap(), NaiveTime::from_hms_opt(23, 59, 0).unwrap())
    }

    fn mk_agent(seniority: Seniority, team: Team) -> Agent {
        let mut a = Agent::new("t", seniority, team, always_on_shift());
        a.active = true;
        a.accepting_new_chats = true;
        a
    }

    #[tokio::test]
    async fn tick_assigns_queued_sessions_to_available_agents() {
        let t0 = chrono::Utc::now();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(t0));
        let agents = Arc::new(AgentStore::new(vec![mk_agent(Seniority::Junior, Team::TeamA)], 10));
        let sessions = Arc::new(SessionStore::new());
        sessions.insert(ChatSession::new_queued("u1", t0));

        let bh = Arc::new(BusinessHours::new());
        let capacity = Arc::new(CapacityCalculator::new(agents.clone(), bh.clone()));
        let rr = Arc::new(RoundRobinCoordinator::new());
        let selector = Arc::new(AgentSelector::new(agents.clone(), rr));
        let assigner = Arc::new(Assigner::new(agents.clone(), sessions.clone(), capacity.clone()));
        let dispatcher = Dispatcher::new(sessions.clone(), agents, bh, capacity, selector, assigner, clock, common::Counters::default());

        dispatcher.tick().await;

        assert_eq!(sessions.queue_length(), 0);
        let assigned = sessions.by_status(session::Status::Assigned);
        assert_eq!(assigned.len(), 1);
    }

    #[tokio::test]
    async fn tick_requeues_sessions_with_no_available_agent() {
        let t0 = chrono::Utc::now();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(t0));
        let agents = Arc::new(AgentStore::new(vec![], 10));
        let sessions = Arc::new(SessionStore::new());
        let session = ChatSession::new_queued("u1", t0);
        let session_id = session.id;
        sessions.insert(session);

        let bh = Arc::new(BusinessHours::new());
        let capacity = Arc::new(CapacityCalculator::new(agents.clone(), bh.clone()));
        let rr = Arc::new(RoundRobinCoordinator::new());
        let selector = Arc::new(AgentSelector::new(agents.clone(), rr));
        let assigner = Arc::new(Assigner::new(agents.clone(), sessions.clone(), capacity.clone()));
        let dispatcher = Dispatcher::new(sessions.clone(), agents, bh, capacity, selector, assigner, clock, common::Counters::default());

        dispatcher.tick().await;

        assert_eq!(sessions.queue_length(), 1);
        assert_eq!(sessions.get(&session_id).unwrap().status, session::Status::Queued);
    }
}
