pub mod clock;
pub mod logger;
pub mod metrics;

pub use clock::{Clock, FixedClock, SystemClock};
pub use metrics::Counters;
