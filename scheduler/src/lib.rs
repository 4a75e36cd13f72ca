pub mod assigner;
pub mod capacity;
pub mod dispatcher;
pub mod monitor;
pub mod round_robin;
pub mod selector;
pub mod timeout;

pub use assigner::Assigner;
pub use capacity::CapacityCalculator;
pub use dispatcher::Dispatcher;
pub use monitor::Monitor;
pub use round_robin::{RoundRobinCoordinator, RoundRobinError};
pub use selector::AgentSelector;
pub use timeout::SessionTimeoutService;
