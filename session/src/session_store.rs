//! C4: sessions by id, plus the two FIFO queues (main, overflow).
//!
//! The whole-map lock mirrors the teacher's own `session::manager::SessionManager`
//! (`Arc<Mutex<HashMap<SessionId, Session>>>`) rather than one lock per
//! session: updates are whole-object replacements (spec §4.3), so a single
//! `RwLock` over the map gives snapshot-consistent enumeration cheaply, and
//! critical sections stay short enough that per-session granularity isn't
//! needed.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::instrument;

use crate::model::{AgentId, ChatSession, SessionId, Status};

#[derive(Default)]
struct Queues {
    main: Mutex<VecDeque<SessionId>>,
    overflow: Mutex<VecDeque<SessionId>>,
}

pub struct SessionStore {
    by_id: RwLock<HashMap<SessionId, ChatSession>>,
    queues: Queues,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
            queues: Queues::default(),
        }
    }

    pub fn get(&self, id: &SessionId) -> Option<ChatSession> {
        self.by_id.read().get(id).cloned()
    }

    /// A `Queued|Assigned|Active` session for this user, if one exists.
    pub fn find_active_for_user(&self, user_id: &str) -> Option<ChatSession> {
        self.by_id
            .read()
            .values()
            .find(|s| s.user_id == user_id && s.status.is_live())
            .cloned()
    }

    pub fn by_status(&self, status: Status) -> Vec<ChatSession> {
        self.by_id.read().values().filter(|s| s.status == status).cloned().collect()
    }

    /// `Queued ∧ ¬overflow`, in `createdAt` (== FIFO insertion) order.
    pub fn main_queue_snapshot(&self) -> Vec<SessionId> {
        self.queues.main.lock().iter().copied().collect()
    }

    /// `Queued ∧ overflow`, in `createdAt` (== FIFO insertion) order.
    pub fn overflow_queue_snapshot(&self) -> Vec<SessionId> {
        self.queues.overflow.lock().iter().copied().collect()
    }

    pub fn queue_length(&self) -> usize {
        self.queues.main.lock().len()
    }

    pub fn overflow_queue_length(&self) -> usize {
        self.queues.overflow.lock().len()
    }

    /// `status ∈ {Assigned, Active} ∧ missedPollCount ≥ 3`.
    pub fn timed_out(&self, threshold: u32) -> Vec<ChatSession> {
        self.by_id
            .read()
            .values()
            .filter(|s| matches!(s.status, Status::Assigned | Status::Active) && s.missed_poll_count >= threshold)
            .cloned()
            .collect()
    }

    /// `status ∈ {Queued, Assigned, Active}` — what the monitor scans.
    pub fn active_for_monitoring(&self) -> Vec<ChatSession> {
        self.by_id.read().values().filter(|s| s.status.is_live()).cloned().collect()
    }

    /// Inserts a new session. If `Queued`, places it at the back of the
    /// appropriate FIFO (main, since fresh sessions are never created
    /// directly into overflow — `moveUnassignedToOverflow` is what moves
    /// them there).
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn insert(&self, session: ChatSession) {
        let id = session.id;
        let is_queued = session.status == Status::Queued;
        self.by_id.write().insert(id, session);
        if is_queued {
            self.queues.main.lock().push_back(id);
        }
    }

    /// Whole-object replacement, per spec §4.3.
    pub fn update(&self, session: ChatSession) {
        self.by_id.write().insert(session.id, session);
    }

    /// 1-based position in the session's current queue, ordered by
    /// `createdAt`; 0 if the session isn't queued.
    pub fn queue_position(&self, id: &SessionId) -> usize {
        let Some(session) = self.get(id) else { return 0 };
        if session.status != Status::Queued {
            return 0;
        }
        let queue = if session.is_in_overflow { &self.queues.overflow } else { &self.queues.main };
        queue.lock().iter().position(|sid| sid == id).map(|i| i + 1).unwrap_or(0)
    }

    /// Moves up to `limit` still-`Queued ∧ ¬overflow` sessions (in
    /// `createdAt` order) from the main queue to the overflow queue,
    /// flipping `isInOverflow = true`. Returns the moved session ids.
    #[instrument(skip(self))]
    pub fn move_unassigned_to_overflow(&self, limit: usize) -> Vec<SessionId> {
        let mut moved = Vec::with_capacity(limit);
        let mut main = self.queues.main.lock();
        let mut overflow = self.queues.overflow.lock();
        let mut by_id = self.by_id.write();

        for _ in 0..limit {
            let Some(id) = main.pop_front() else { break };
            if let Some(session) = by_id.get_mut(&id) {
                if session.status == Status::Queued {
                    session.is_in_overflow = true;
                    overflow.push_back(id);
                    moved.push(id);
                }
                // A non-Queued head (already assigned by a concurrent tick
                // reading a stale snapshot) is simply dropped from the main
                // queue rather than carried forward.
            }
        }

        moved
    }

    /// Removes the first `limit` `Queued` sessions matching `overflow` from
    /// their queue, in `createdAt` order, without mutating their status —
    /// used by the batch pipeline, which commits each one or, on a failed
    /// assignment, calls `requeue_front` to put it back.
    pub fn pop_front_queued(&self, overflow: bool, limit: usize) -> Vec<ChatSession> {
        let queue = if overflow { &self.queues.overflow } else { &self.queues.main };
        let mut q = queue.lock();
        let by_id = self.by_id.read();

        let mut taken = Vec::with_capacity(limit);
        while taken.len() < limit {
            let Some(id) = q.pop_front() else { break };
            match by_id.get(&id) {
                Some(session) if session.status == Status::Queued => taken.push(session.clone()),
                _ => {} // stale entry (already assigned/inactivated elsewhere); drop it
            }
        }

        taken
    }

    /// Removes a specific session id from whichever queue currently holds
    /// it. Called after a successful assignment (the session is no longer
    /// `Queued`) or to drop a stale reservation candidate.
    pub fn remove_from_queue(&self, id: &SessionId, overflow: bool) {
        let queue = if overflow { &self.queues.overflow } else { &self.queues.main };
        queue.lock().retain(|sid| sid != id);
    }

    pub fn requeue_front(&self, id: SessionId, overflow: bool) {
        let queue = if overflow { &self.queues.overflow } else { &self.queues.main };
        queue.lock().push_front(id);
    }

    pub fn set_last_polled(&self, id: &SessionId, at: DateTime<Utc>) -> bool {
        let mut by_id = self.by_id.write();
        match by_id.get_mut(id) {
            Some(session) => {
                session.record_poll(at);
                true
            }
            None => false,
        }
    }

    /// Releases the agent slot (if any) tied to a session right before/while
    /// transitioning it to `Inactive`. Returns the agent id so the caller
    /// can call `AgentStore::complete_chat`.
    pub fn inactivate(&self, id: &SessionId) -> Option<AgentId> {
        let mut by_id = self.by_id.write();
        let session = by_id.get_mut(id)?;
        let agent_id = session.assigned_agent_id;
        session.inactivate();
        agent_id
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn insert_queued_session_enqueues_on_main() {
        let store = SessionStore::new();
        let s = ChatSession::new_queued("u1", now());
        let id = s.id;
        store.insert(s);
        assert_eq!(store.queue_length(), 1);
        assert_eq!(store.queue_position(&id), 1);
    }

    #[test]
    fn refused_session_is_not_queued() {
        let store = SessionStore::new();
        store.insert(ChatSession::new_refused("u1", now()));
        assert_eq!(store.queue_length(), 0);
    }

    #[test]
    fn fifo_order_preserved_across_two_inserts() {
        let store = SessionStore::new();
        let a = ChatSession::new_queued("a", now());
        let b = ChatSession::new_queued("b", now());
        let (aid, bid) = (a.id, b.id);
        store.insert(a);
        store.insert(b);
        let snap = store.main_queue_snapshot();
        assert_eq!(snap, vec![aid, bid]);
    }

    #[test]
    fn move_unassigned_to_overflow_respects_limit_and_preserves_created_at() {
        let store = SessionStore::new();
        let mut ids = Vec::new();
        for i in 0..7 {
            let s = ChatSession::new_queued(format!("u{i}"), now());
            ids.push(s.id);
            store.insert(s);
        }

        let moved = store.move_unassigned_to_overflow(5);
        assert_eq!(moved.len(), 5);
        assert_eq!(store.overflow_queue_length(), 5);
        assert_eq!(store.queue_length(), 2);

        for id in &moved {
            let s = store.get(id).unwrap();
            assert!(s.is_in_overflow);
            assert_eq!(s.status, Status::Queued);
        }
    }

    #[test]
    fn active_for_monitoring_excludes_terminal_statuses() {
        let store = SessionStore::new();
        let queued = ChatSession::new_queued("u1", now());
        let refused = ChatSession::new_refused("u2", now());
        store.insert(queued.clone());
        store.insert(refused);

        let monitored = store.active_for_monitoring();
        assert_eq!(monitored.len(), 1);
        assert_eq!(monitored[0].id, queued.id);
    }

    #[test]
    fn timed_out_requires_assigned_or_active_and_threshold() {
        let store = SessionStore::new();
        let mut s = ChatSession::new_queued("u1", now());
        s.assign_to_agent(uuid::Uuid::new_v4(), now());
        s.missed_poll_count = 3;
        store.insert(s.clone());

        let timed_out = store.timed_out(3);
        assert_eq!(timed_out.len(), 1);
        assert_eq!(timed_out[0].id, s.id);
    }
}
