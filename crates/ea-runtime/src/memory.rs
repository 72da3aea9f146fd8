//! In-process runtime.
//!
//! Holds networks and containers in a mutex and records every call, so
//! orchestrator tests can assert on exactly which actions were taken.
//! Individual actions can be made to fail.

use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{RuntimeError, RuntimeResult};
use crate::runtime::ContainerRuntime;
use crate::types::{ContainerSpec, ContainerState, ContainerSummary, NetworkCreate, NetworkSpec};

/// One recorded trait call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    NetworkExists(String),
    CreateNetwork(String),
    ListContainers(String),
    RunContainer { name: String, image: String },
    StopContainer(String),
    RemoveContainer { name: String, force: bool },
    ConnectNetwork {
        network: String,
        container: String,
        address: Option<Ipv4Addr>,
    },
    ContainerAddress(String),
}

impl RuntimeCall {
    /// Whether the call creates a network or a container.
    pub fn is_creation(&self) -> bool {
        matches!(self, Self::CreateNetwork(_) | Self::RunContainer { .. })
    }
}

/// Actions that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    NetworkExists,
    CreateNetwork,
    ListContainers,
    RunContainer,
    StopContainer,
    RemoveContainer,
    ConnectNetwork,
    ContainerAddress,
}

#[derive(Debug, Clone)]
struct MemoryContainer {
    id: String,
    spec: ContainerSpec,
    state: ContainerState,
    networks: BTreeMap<String, Ipv4Addr>,
}

#[derive(Debug, Default)]
struct State {
    networks: BTreeMap<String, NetworkSpec>,
    containers: BTreeMap<String, MemoryContainer>,
    calls: Vec<RuntimeCall>,
    fail: HashSet<FailPoint>,
    reject_static_addresses: bool,
    next_id: u64,
    next_dynamic: u8,
}

impl State {
    fn check(&self, point: FailPoint) -> RuntimeResult<()> {
        if self.fail.contains(&point) {
            return Err(RuntimeError::CommandFailed {
                command: format!("{point:?}"),
                code: Some(1),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn address_in_use(&self, network: &str, address: Ipv4Addr, except: &str) -> bool {
        self.containers
            .iter()
            .filter(|(name, _)| name.as_str() != except)
            .any(|(_, c)| c.networks.get(network) == Some(&address))
    }

    fn allocate_dynamic(&mut self, network: &str) -> Ipv4Addr {
        loop {
            self.next_dynamic = self.next_dynamic.wrapping_add(1).max(2);
            let candidate = Ipv4Addr::new(192, 168, 254, self.next_dynamic);
            if !self.address_in_use(network, candidate, "") {
                return candidate;
            }
        }
    }
}

/// Runtime backed by in-process state.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    state: Mutex<State>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an existing network.
    pub fn with_network(self, spec: NetworkSpec) -> Self {
        self.lock().networks.insert(spec.name.clone(), spec);
        self
    }

    /// Seed an existing container in the given state, not attached to any
    /// network.
    pub fn with_container(self, name: &str, image: &str, state: ContainerState) -> Self {
        {
            let mut s = self.lock();
            s.next_id += 1;
            let id = format!("{:012x}", s.next_id);
            s.containers.insert(
                name.to_string(),
                MemoryContainer {
                    id,
                    spec: ContainerSpec::new(name, image),
                    state,
                    networks: BTreeMap::new(),
                },
            );
        }
        self
    }

    /// Make `point` fail until cleared.
    pub fn fail_on(&self, point: FailPoint) {
        self.lock().fail.insert(point);
    }

    pub fn clear_failures(&self) {
        let mut s = self.lock();
        s.fail.clear();
        s.reject_static_addresses = false;
    }

    /// Reject every attachment that requests a fixed address.
    pub fn reject_static_addresses(&self) {
        self.lock().reject_static_addresses = true;
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.lock().calls.clone()
    }

    pub fn creation_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_creation()).count()
    }

    pub fn has_network(&self, name: &str) -> bool {
        self.lock().networks.contains_key(name)
    }

    pub fn container(&self, name: &str) -> Option<ContainerSummary> {
        self.lock().containers.get(name).map(|c| ContainerSummary {
            id: c.id.clone(),
            name: name.to_string(),
            image: c.spec.image.clone(),
            state: c.state,
        })
    }

    /// The full launch spec of a container, as last run.
    pub fn container_spec(&self, name: &str) -> Option<ContainerSpec> {
        self.lock().containers.get(name).map(|c| c.spec.clone())
    }

    pub fn container_count(&self) -> usize {
        self.lock().containers.len()
    }

    /// Networks the container is attached to, with its address on each.
    pub fn attachments(&self, name: &str) -> BTreeMap<String, Ipv4Addr> {
        self.lock()
            .containers
            .get(name)
            .map(|c| c.networks.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContainerRuntime for MemoryRuntime {
    async fn network_exists(&self, name: &str) -> RuntimeResult<bool> {
        let mut s = self.lock();
        s.calls.push(RuntimeCall::NetworkExists(name.to_string()));
        s.check(FailPoint::NetworkExists)?;
        Ok(s.networks.contains_key(name))
    }

    async fn create_network(&self, spec: &NetworkSpec) -> RuntimeResult<NetworkCreate> {
        let mut s = self.lock();
        s.calls.push(RuntimeCall::CreateNetwork(spec.name.clone()));
        s.check(FailPoint::CreateNetwork)?;
        if s.networks.contains_key(&spec.name) {
            return Ok(NetworkCreate::AlreadyExists);
        }
        s.networks.insert(spec.name.clone(), spec.clone());
        Ok(NetworkCreate::Created)
    }

    async fn list_containers(&self, name: &str) -> RuntimeResult<Vec<ContainerSummary>> {
        {
            let mut s = self.lock();
            s.calls.push(RuntimeCall::ListContainers(name.to_string()));
            s.check(FailPoint::ListContainers)?;
        }
        Ok(self.container(name).into_iter().collect())
    }

    async fn run_container(&self, spec: &ContainerSpec) -> RuntimeResult<String> {
        let mut s = self.lock();
        s.calls.push(RuntimeCall::RunContainer {
            name: spec.name.clone(),
            image: spec.image.clone(),
        });
        s.check(FailPoint::RunContainer)?;
        if s.containers.contains_key(&spec.name) {
            return Err(RuntimeError::Conflict(spec.name.clone()));
        }
        s.next_id += 1;
        let id = format!("{:012x}", s.next_id);
        s.containers.insert(
            spec.name.clone(),
            MemoryContainer {
                id: id.clone(),
                spec: spec.clone(),
                state: ContainerState::Running,
                networks: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    async fn stop_container(&self, name: &str) -> RuntimeResult<()> {
        let mut s = self.lock();
        s.calls.push(RuntimeCall::StopContainer(name.to_string()));
        s.check(FailPoint::StopContainer)?;
        match s.containers.get_mut(name) {
            Some(c) => {
                c.state = ContainerState::Exited;
                Ok(())
            }
            None => Err(RuntimeError::NoSuchContainer(name.to_string())),
        }
    }

    async fn remove_container(&self, name: &str, force: bool) -> RuntimeResult<()> {
        let mut s = self.lock();
        s.calls.push(RuntimeCall::RemoveContainer {
            name: name.to_string(),
            force,
        });
        s.check(FailPoint::RemoveContainer)?;
        let running = s.containers.get(name).is_some_and(|c| c.state.is_running());
        if running && !force {
            return Err(RuntimeError::CommandFailed {
                command: format!("rm {name}"),
                code: Some(1),
                stderr: "cannot remove a running container".to_string(),
            });
        }
        s.containers.remove(name);
        Ok(())
    }

    async fn connect_network(
        &self,
        network: &str,
        container: &str,
        address: Option<Ipv4Addr>,
    ) -> RuntimeResult<()> {
        let mut s = self.lock();
        s.calls.push(RuntimeCall::ConnectNetwork {
            network: network.to_string(),
            container: container.to_string(),
            address,
        });
        s.check(FailPoint::ConnectNetwork)?;
        if !s.networks.contains_key(network) {
            return Err(RuntimeError::NoSuchNetwork(network.to_string()));
        }
        if !s.containers.contains_key(container) {
            return Err(RuntimeError::NoSuchContainer(container.to_string()));
        }

        let assigned = match address {
            Some(ip) => {
                if s.reject_static_addresses {
                    return Err(RuntimeError::AddressUnavailable {
                        network: network.to_string(),
                        address: ip.to_string(),
                        reason: "user specified IP address is supported only when connecting to networks with user configured subnets".to_string(),
                    });
                }
                if s.address_in_use(network, ip, container) {
                    return Err(RuntimeError::AddressUnavailable {
                        network: network.to_string(),
                        address: ip.to_string(),
                        reason: "Address already in use".to_string(),
                    });
                }
                ip
            }
            None => s.allocate_dynamic(network),
        };

        if let Some(c) = s.containers.get_mut(container) {
            c.networks.entry(network.to_string()).or_insert(assigned);
        }
        Ok(())
    }

    async fn container_address(
        &self,
        container: &str,
        network: &str,
    ) -> RuntimeResult<Option<Ipv4Addr>> {
        let mut s = self.lock();
        s.calls.push(RuntimeCall::ContainerAddress(container.to_string()));
        s.check(FailPoint::ContainerAddress)?;
        Ok(s
            .containers
            .get(container)
            .and_then(|c| c.networks.get(network).copied()))
    }
}
