use thiserror::Error;

/// Errors reported by the fallible queue operations.
///
/// A failing operation leaves the queue exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("allocation failure")]
    AllocationFailure,
}

pub type Result<T> = std::result::Result<T, QueueError>;
