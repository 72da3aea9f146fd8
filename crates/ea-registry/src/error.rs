//! Registry error types.

use std::time::Duration;

use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tag listing for {repository} timed out after {timeout:?}")]
    Timeout { repository: String, timeout: Duration },

    #[error("tag listing for {repository} failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        repository: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("malformed registry response: {0}")]
    Malformed(String),
}
