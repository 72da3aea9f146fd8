use thiserror::Error;

pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// Connect, handshake, send or read failed, or a timeout elapsed.
    #[error("adapter at {address} unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    /// The reply was not JSON or carried no `result`.
    #[error("malformed response from {address}: {reason}")]
    MalformedResponse { address: String, reason: String },
}
