//! End-to-end coverage that exercises `DispatchService` together with the
//! scheduler ticks, rather than either in isolation: spec.md §8 scenario 4
//! (timeout releases capacity) driven through `SessionTimeoutService`
//! directly against state created via `DispatchService::create_session`.

use std::sync::Arc;

use chrono::{NaiveTime, TimeZone, Utc};
use common::{Clock, Counters, FixedClock};
use scheduler::{round_robin::RoundRobinCoordinator, AgentSelector, Assigner, CapacityCalculator, Dispatcher, SessionTimeoutService};
use session::{Agent, AgentStore, BusinessHours, Seniority, SessionStore, ShiftWindow, Status, Team};

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
async fn assigned_session_that_stops_polling_times_out_and_frees_its_agent() {
    // Saturday, outside office hours, so the dispatcher only ever touches
    // the main queue/Team A-C pool, never overflow.
    let now = Utc.with_ymd_and_hms(2026, 8, 1, 15, 0, 0).unwrap();
    let fixed_clock = Arc::new(FixedClock::new(now));
    let clock: Arc<dyn Clock> = fixed_clock.clone();

    let agents = Arc::new(AgentStore::new(vec![mk_agent(Seniority::Junior, Team::TeamA)], 10));
    let sessions = Arc::new(SessionStore::new());
    let bh = Arc::new(BusinessHours::new());
    let capacity = Arc::new(CapacityCalculator::new(agents.clone(), bh.clone()));
    let counters = Counters::default();

    let service = backend::DispatchService::new(sessions.clone(), agents.clone(), bh.clone(), capacity.clone(), clock.clone(), counters.clone());
    let created = service.create_session("u1");
    assert_eq!(created.status, Status::Queued);

    let rr = Arc::new(RoundRobinCoordinator::new());
    let selector = Arc::new(AgentSelector::new(agents.clone(), rr));
    let assigner = Arc::new(Assigner::new(agents.clone(), sessions.clone(), capacity.clone()));
    let dispatcher = Dispatcher::new(sessions.clone(), agents.clone(), bh, capacity, selector, assigner, clock.clone(), counters.clone());
    dispatcher.tick().await;

    let assigned = sessions.get(&created.id).unwrap();
    assert_eq!(assigned.status, Status::Assigned);
    let agent_id = agents.all()[0].id;
    assert_eq!(agents.get(&agent_id).unwrap().current, 1);

    let timeout_service = SessionTimeoutService::new(sessions.clone(), agents.clone(), clock.clone(), counters);
    for _ in 0..3 {
        fixed_clock.advance(chrono::Duration::seconds(1));
        timeout_service.process_timeouts();
    }

    let timed_out = sessions.get(&created.id).unwrap();
    assert_eq!(timed_out.status, Status::Inactive);
    assert_eq!(agents.get(&agent_id).unwrap().current, 0);
}
