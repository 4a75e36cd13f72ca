pub mod api;
pub mod config;
pub mod error;
pub mod metrics;

pub use api::DispatchService;
pub use config::AppConfig;
pub use error::DispatchError;
pub use metrics::Counters;
