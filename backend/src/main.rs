use std::sync::Arc;
use std::time::Duration;

use backend::{AppConfig, Counters, DispatchService};
use common::{logger::init_logger, Clock, SystemClock};
use scheduler::{round_robin::RoundRobinCoordinator, AgentSelector, Assigner, CapacityCalculator, Dispatcher, Monitor, SessionTimeoutService};
use session::{fixed_roster, AgentStore, BusinessHours, SessionStore, ShiftManager};
use tokio::sync::watch;

/// Starts the dispatcher loop (fixed cadence `interval`). Errors inside a
/// tick are impossible by construction (`Dispatcher::tick` never returns a
/// `Result`) but the loop still exits cleanly on the shutdown signal, the
/// same shape as the teacher's `start_scheduler_loop`.
fn start_dispatcher_loop(dispatcher: Arc<Dispatcher>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => dispatcher.tick().await,
                _ = shutdown.changed() => {
                    tracing::info!("dispatcher loop shutting down");
                    break;
                }
            }
        }
    });
}

fn start_monitor_loop(monitor: Arc<Monitor>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => monitor.tick().await,
                _ = shutdown.changed() => {
                    tracing::info!("monitor loop shutting down");
                    break;
                }
            }
        }
    });
}

/// Keeps each agent's `active`/`accepting_new_chats` flags in sync with its
/// shift window. Not part of spec.md's named tick cadences; runs on its own
/// slower cadence since shift boundaries move in minutes, not seconds.
fn start_shift_refresh_loop(agents: Arc<AgentStore>, clock: Arc<dyn Clock>, mut shutdown: watch::Receiver<bool>) {
    let shift_manager = ShiftManager::new();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            tokio::select! {
                _ = ticker.tick() => agents.refresh_shifts(&shift_manager, clock.now()),
                _ = shutdown.changed() => {
                    tracing::info!("shift refresh loop shutting down");
                    break;
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("chat-dispatch");
    tracing::info!("Starting chat-dispatch backend...");

    let cfg = AppConfig::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let counters = Counters::default();

    let agents = Arc::new(AgentStore::new(fixed_roster(), cfg.base_capacity));
    agents.refresh_shifts(&ShiftManager::new(), clock.now());
    let sessions = Arc::new(SessionStore::new());
    let business_hours = Arc::new(BusinessHours::new());
    let rr = Arc::new(RoundRobinCoordinator::new());

    let capacity = Arc::new(CapacityCalculator::new(agents.clone(), business_hours.clone()));
    let selector = Arc::new(AgentSelector::new(agents.clone(), rr));
    let assigner = Arc::new(Assigner::new(agents.clone(), sessions.clone(), capacity.clone()));
    let timeout_service = Arc::new(SessionTimeoutService::new(sessions.clone(), agents.clone(), clock.clone(), counters.clone()));

    let dispatcher = Arc::new(Dispatcher::new(
        sessions.clone(),
        agents.clone(),
        business_hours.clone(),
        capacity.clone(),
        selector,
        assigner,
        clock.clone(),
        counters.clone(),
    ));
    let monitor = Arc::new(Monitor::new(timeout_service, counters.clone()));

    let service = DispatchService::new(sessions, agents.clone(), business_hours, capacity, clock.clone(), counters);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    start_dispatcher_loop(dispatcher, Duration::from_millis(cfg.dispatcher_tick_ms), shutdown_rx.clone());
    start_monitor_loop(monitor, Duration::from_millis(cfg.monitor_tick_ms), shutdown_rx.clone());
    start_shift_refresh_loop(agents, clock, shutdown_rx);

    // `service` is the in-process handle a future HTTP shell would hold
    // onto per-request; keep it alive for the process lifetime here.
    let _ = service.can_accept();

    tracing::info!("Backend started; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    Ok(())
}
