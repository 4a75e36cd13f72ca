//! The five error kinds spec.md §7 names. Internal crates (`session`,
//! `scheduler`) return `anyhow::Result`; this is the boundary type
//! `DispatchService` surfaces.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("capacity conflict: {0}")]
    CapacityConflict(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("fatal: {0}")]
    Fatal(#[from] anyhow::Error),
}
