pub mod agent_store;
pub mod business_hours;
pub mod model;
pub mod roster;
pub mod session_store;

pub use agent_store::AgentStore;
pub use business_hours::BusinessHours;
pub use model::{Agent, AgentId, ChatSession, Seniority, SessionId, ShiftWindow, Status, Team};
pub use roster::{fixed_roster, ShiftManager};
pub use session_store::SessionStore;
