//! Runtime error types.

use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("container name already in use: {0}")]
    Conflict(String),

    #[error("no such container: {0}")]
    NoSuchContainer(String),

    #[error("no such network: {0}")]
    NoSuchNetwork(String),

    #[error("address {address} unavailable on {network}: {reason}")]
    AddressUnavailable {
        network: String,
        address: String,
        reason: String,
    },

    #[error("unexpected runtime output: {0}")]
    Decode(String),
}
