//! The runtime trait.

use std::net::Ipv4Addr;

use async_trait::async_trait;

use crate::error::RuntimeResult;
use crate::types::{ContainerSpec, ContainerSummary, NetworkCreate, NetworkSpec};

/// Container and network actions consumed by the lifecycle orchestrator.
///
/// Existence checks and mutations are separate calls and the underlying
/// state may change between them. Implementations report benign races in
/// their return values (`NetworkCreate::AlreadyExists`, `Ok(())` when
/// removing something already gone) and reserve errors for real failures.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn network_exists(&self, name: &str) -> RuntimeResult<bool>;

    /// Create a network. An existing network of the same name is left
    /// untouched and reported as [`NetworkCreate::AlreadyExists`].
    async fn create_network(&self, spec: &NetworkSpec) -> RuntimeResult<NetworkCreate>;

    /// Containers whose name is exactly `name`, in any state.
    async fn list_containers(&self, name: &str) -> RuntimeResult<Vec<ContainerSummary>>;

    /// Start a detached container. Returns the container id.
    /// A name collision is [`crate::RuntimeError::Conflict`].
    async fn run_container(&self, spec: &ContainerSpec) -> RuntimeResult<String>;

    async fn stop_container(&self, name: &str) -> RuntimeResult<()>;

    /// Remove a container; a missing container is not an error.
    async fn remove_container(&self, name: &str, force: bool) -> RuntimeResult<()>;

    /// Attach to a network, optionally requesting a fixed address.
    async fn connect_network(
        &self,
        network: &str,
        container: &str,
        address: Option<Ipv4Addr>,
    ) -> RuntimeResult<()>;

    /// The container's address on `network`, `None` when the container is
    /// absent or not attached.
    async fn container_address(
        &self,
        container: &str,
        network: &str,
    ) -> RuntimeResult<Option<Ipv4Addr>>;
}
