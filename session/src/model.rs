//! Domain types shared by `AgentStore` and `SessionStore`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AgentId = Uuid;
pub type SessionId = Uuid;

/// Agent seniority. Determines the per-agent concurrency ceiling via
/// `Seniority::multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Seniority {
    Junior,
    MidLevel,
    Senior,
    TeamLead,
}

impl Seniority {
    /// Order in which the selector walks seniority cohorts within a team:
    /// junior-first, per spec.
    pub const WALK_ORDER: [Seniority; 4] = [
        Seniority::Junior,
        Seniority::MidLevel,
        Seniority::Senior,
        Seniority::TeamLead,
    ];

    fn multiplier(self) -> f64 {
        match self {
            Seniority::Junior => 0.4,
            Seniority::MidLevel => 0.6,
            Seniority::Senior => 0.8,
            Seniority::TeamLead => 0.5,
        }
    }

    /// `⌊10 · multiplier(seniority)⌋`.
    pub fn max_concurrent(self, base_capacity: u32) -> u32 {
        ((base_capacity as f64) * self.multiplier()).floor() as u32
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Seniority::Junior => "Junior",
            Seniority::MidLevel => "MidLevel",
            Seniority::Senior => "Senior",
            Seniority::TeamLead => "TeamLead",
        };
        f.write_str(s)
    }
}

impl FromStr for Seniority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Junior" => Ok(Seniority::Junior),
            "MidLevel" => Ok(Seniority::MidLevel),
            "Senior" => Ok(Seniority::Senior),
            "TeamLead" => Ok(Seniority::TeamLead),
            other => Err(anyhow::anyhow!("invalid seniority: {other}")),
        }
    }
}

/// Team (wire form: `teamType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    TeamA,
    TeamB,
    TeamC,
    Overflow,
}

impl Team {
    pub const ROTATION_ORDER: [Team; 3] = [Team::TeamA, Team::TeamB, Team::TeamC];
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Team::TeamA => "TeamA",
            Team::TeamB => "TeamB",
            Team::TeamC => "TeamC",
            Team::Overflow => "Overflow",
        };
        f.write_str(s)
    }
}

impl FromStr for Team {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TeamA" => Ok(Team::TeamA),
            "TeamB" => Ok(Team::TeamB),
            "TeamC" => Ok(Team::TeamC),
            "Overflow" => Ok(Team::Overflow),
            other => Err(anyhow::anyhow!("invalid team: {other}")),
        }
    }
}

/// A recurring daily shift window, expressed in UTC time-of-day. `end < start`
/// means the shift wraps past midnight (Team C: `[15:55, 24:05)` UTC, i.e.
/// `00:05` the next day).
#[derive(Debug, Clone, Copy)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ShiftWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `at` (as UTC time-of-day) falls inside this window.
    pub fn contains(&self, at: NaiveTime) -> bool {
        if self.start <= self.end {
            at >= self.start && at <= self.end
        } else {
            at >= self.start || at <= self.end
        }
    }

    /// Minutes remaining until `end`, measured from `at`. Negative if `at` is
    /// already past `end` and the window does not wrap.
    pub fn minutes_until_end(&self, at: NaiveTime) -> i64 {
        let diff = self.end.signed_duration_since(at);
        if self.start > self.end && at > self.end {
            // Wrapping window, evening segment: `end` falls tomorrow.
            (diff + chrono::Duration::days(1)).num_minutes()
        } else {
            diff.num_minutes()
        }
    }
}

/// A support agent. `current`/`reserved` are mutated under the per-agent lock
/// held by `AgentStore`; this struct itself carries no lock.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub seniority: Seniority,
    pub team: Team,
    pub shift: ShiftWindow,
    pub active: bool,
    pub accepting_new_chats: bool,
    pub current: u32,
    pub reserved: u32,
}

impl Agent {
    pub fn new(name: impl Into<String>, seniority: Seniority, team: Team, shift: ShiftWindow) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            seniority,
            team,
            shift,
            active: false,
            accepting_new_chats: false,
            current: 0,
            reserved: 0,
        }
    }

    pub fn max_concurrent(&self, base_capacity: u32) -> u32 {
        self.seniority.max_concurrent(base_capacity)
    }

    pub fn available(&self, base_capacity: u32) -> u32 {
        let max = self.max_concurrent(base_capacity);
        max.saturating_sub(self.current + self.reserved)
    }

    /// `active ∧ acceptingNewChats ∧ current+reserved < maxConcurrent`.
    pub fn can_accept(&self, base_capacity: u32) -> bool {
        self.active && self.accepting_new_chats && self.current + self.reserved < self.max_concurrent(base_capacity)
    }
}

/// Lifecycle status of a `ChatSession` (wire form: `status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Queued,
    Assigned,
    Active,
    Inactive,
    Completed,
    Refused,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Queued => "Queued",
            Status::Assigned => "Assigned",
            Status::Active => "Active",
            Status::Inactive => "Inactive",
            Status::Completed => "Completed",
            Status::Refused => "Refused",
        };
        f.write_str(s)
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Queued" => Ok(Status::Queued),
            "Assigned" => Ok(Status::Assigned),
            "Active" => Ok(Status::Active),
            "Inactive" => Ok(Status::Inactive),
            "Completed" => Ok(Status::Completed),
            "Refused" => Ok(Status::Refused),
            other => Err(anyhow::anyhow!("invalid status: {other}")),
        }
    }
}

impl Status {
    /// `Queued | Assigned | Active` — the statuses that count as "an active
    /// session exists for this user" and that the monitor scans.
    pub fn is_live(self) -> bool {
        matches!(self, Status::Queued | Status::Assigned | Status::Active)
    }
}

/// A user-initiated chat request moving through the queue/assignment
/// pipeline.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: SessionId,
    pub user_id: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub last_polled_at: DateTime<Utc>,
    pub assigned_agent_id: Option<AgentId>,
    pub poll_count: u32,
    pub missed_poll_count: u32,
    pub is_in_overflow: bool,
}

impl ChatSession {
    pub fn new_queued(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            status: Status::Queued,
            created_at: now,
            assigned_at: None,
            last_polled_at: now,
            assigned_agent_id: None,
            poll_count: 0,
            missed_poll_count: 0,
            is_in_overflow: false,
        }
    }

    pub fn new_refused(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            status: Status::Refused,
            created_at: now,
            assigned_at: None,
            last_polled_at: now,
            assigned_agent_id: None,
            poll_count: 0,
            missed_poll_count: 0,
            is_in_overflow: false,
        }
    }

    /// `Queued → Assigned`. Fails (returns false, leaves state untouched) if
    /// the session is not currently `Queued`.
    pub fn assign_to_agent(&mut self, agent_id: AgentId, now: DateTime<Utc>) -> bool {
        if self.status != Status::Queued {
            return false;
        }
        self.status = Status::Assigned;
        self.assigned_agent_id = Some(agent_id);
        self.assigned_at = Some(now);
        self.is_in_overflow = false;
        true
    }

    /// Applies a poll: resets liveness accounting and promotes
    /// `Assigned → Active` on first poll after assignment.
    pub fn record_poll(&mut self, now: DateTime<Utc>) {
        self.last_polled_at = now;
        self.poll_count += 1;
        self.missed_poll_count = 0;
        if self.status == Status::Assigned {
            self.status = Status::Active;
        }
    }

    /// `{Assigned, Active, Queued} → Inactive`.
    pub fn inactivate(&mut self) {
        self.status = Status::Inactive;
    }
}
