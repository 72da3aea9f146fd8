//! ea-runtime — the container and network runtime boundary.
//!
//! [`ContainerRuntime`] is the narrow set of actions the lifecycle
//! orchestrator needs. [`DockerCli`] drives a local docker daemon through
//! its command-line client; [`MemoryRuntime`] keeps state in process and
//! records every call, for tests.

pub mod docker;
pub mod error;
pub mod memory;
pub mod runtime;
pub mod types;

pub use docker::DockerCli;
pub use error::{RuntimeError, RuntimeResult};
pub use memory::{FailPoint, MemoryRuntime, RuntimeCall};
pub use runtime::ContainerRuntime;
pub use types::*;
