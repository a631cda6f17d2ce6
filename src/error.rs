use thiserror::Error;

/// Raised when a [`BoundedSelector`](crate::ranking::BoundedSelector) is built
/// with an unusable capacity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector capacity must be at least 1")]
    ZeroCapacity,
}

/// A sampler could not enumerate processes for the current tick.
///
/// These are transient: the monitor logs them and keeps the last published
/// snapshot.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("process table unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error while sampling: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(target_os = "linux")]
    #[error("procfs error: {0}")]
    Procfs(#[from] procfs::ProcError),
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid top_n: {0}")]
    InvalidTopN(#[from] SelectorError),

    #[error("invalid exclude pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("at least one ranking criterion is required")]
    NoCriteria,
}
