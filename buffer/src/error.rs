use thiserror::Error;

/// Stable error taxonomy for the buffer core. Internal invariant
/// violations are not represented here — those are fatal and surface as
/// panics via `debug_assert!`, never as a recoverable `Error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("offset or position {0} is out of range (document length {1})")]
    OutOfRange(u64, u64),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid query at offset {offset}: {message}")]
    InvalidQuery { message: String, offset: usize },

    #[error("resource limit exceeded: {0}")]
    Resource(String),

    #[error("illegal state: {0}")]
    IllegalState(String),
}

pub type Result<T> = std::result::Result<T, Error>;
