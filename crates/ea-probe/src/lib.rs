//! ea-probe — verification of a deployed adapter.
//!
//! Sends a single `POST /` with `{"data":{"from":..,"to":..}}` and returns
//! the `result` field of the reply. There is no internal retry.

pub mod error;
pub mod prober;

pub use error::{ProbeError, ProbeResult};
pub use prober::{Prober, ProberConfig, probe_endpoint, request_body};
