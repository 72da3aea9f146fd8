//! Runtime request and response types.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parameters for creating a user-defined network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSpec {
    pub name: String,
    pub driver: String,
    /// CIDR notation, e.g. `192.168.0.0/16`.
    pub subnet: String,
    pub gateway: Ipv4Addr,
}

/// Result of an idempotent network create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkCreate {
    Created,
    AlreadyExists,
}

/// Lifecycle state as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Exited,
    Dead,
    #[serde(other)]
    Unknown,
}

impl ContainerState {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running | Self::Restarting)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One row of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub host_port: u16,
    pub container_port: u16,
}

impl PortBinding {
    /// Same port on host and container.
    pub fn same(port: u16) -> Self {
        Self {
            host_port: port,
            container_port: port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
    pub host_path: PathBuf,
    pub container_path: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    No,
    Always,
    #[default]
    UnlessStopped,
}

impl RestartPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Always => "always",
            Self::UnlessStopped => "unless-stopped",
        }
    }
}

/// Everything needed to launch a detached container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub restart: RestartPolicy,
    pub ports: Vec<PortBinding>,
    pub volumes: Vec<VolumeBinding>,
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    /// Overrides the image's default command when non-empty.
    pub command: Vec<String>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            restart: RestartPolicy::default(),
            ports: Vec::new(),
            volumes: Vec::new(),
            env: BTreeMap::new(),
            labels: BTreeMap::new(),
            command: Vec::new(),
        }
    }

    /// The image tag, if the reference carries one.
    pub fn tag(&self) -> Option<&str> {
        image_tag(&self.image)
    }
}

/// Tag portion of an image reference (`repo:tag`). A colon inside a
/// registry host:port prefix is not a tag separator.
pub fn image_tag(image: &str) -> Option<&str> {
    let (_, tail) = image.rsplit_once(':')?;
    if tail.contains('/') { None } else { Some(tail) }
}
