//! Re-exports the shared counter type from `common` so `scheduler` (which
//! increments these during dispatcher/monitor ticks) and `backend` (which
//! increments `sessions_created`/`sessions_refused` from `DispatchService`)
//! read and write the same atomics without a dependency cycle.

pub use common::Counters;
