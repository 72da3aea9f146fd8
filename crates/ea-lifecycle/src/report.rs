//! Transition outcomes returned to callers.

use std::fmt;
use std::net::Ipv4Addr;

use ea_core::AdapterStaticConfig;
use ea_runtime::ContainerSummary;

/// Whether a shared resource had to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Created,
    AlreadyPresent,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::AlreadyPresent => "already present",
        })
    }
}

/// How a container ended up on the shared network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Attached with the requested address.
    Static(Ipv4Addr),
    /// The requested address was refused; attached with whatever the
    /// network handed out.
    Dynamic {
        requested: Ipv4Addr,
        assigned: Option<Ipv4Addr>,
        reason: String,
    },
    /// Was already on the network before this run.
    AlreadyAttached(Ipv4Addr),
    /// Both attempts failed. The container keeps running off-network.
    Detached { reason: String },
}

impl AttachOutcome {
    /// Text for the journal when the attachment did not go as requested.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Static(_) | Self::AlreadyAttached(_) => None,
            Self::Dynamic {
                requested, reason, ..
            } => Some(format!(
                "static IP {requested} unavailable ({reason}); attached with a dynamic address"
            )),
            Self::Detached { reason } => Some(format!("not attached to network: {reason}")),
        }
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Static(ip) | Self::AlreadyAttached(ip) => Some(*ip),
            Self::Dynamic { assigned, .. } => *assigned,
            Self::Detached { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeReport {
    pub network: ResourceStatus,
    pub cache: ResourceStatus,
    pub cache_container: String,
    pub cache_port: u16,
    pub cache_attachment: AttachOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub adapter: String,
    pub container: String,
    pub container_id: String,
    pub image: String,
    pub tag: String,
    pub port: u16,
    /// Same-named containers force-removed before launch.
    pub replaced: usize,
    pub attachment: AttachOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Image of the container that was replaced.
    pub previous_image: String,
    pub deploy: DeployReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub container: String,
    pub port: u16,
    pub from: String,
    pub to: String,
    pub result: String,
}

/// One discovered adapter and its container, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetEntry {
    pub name: String,
    pub config: AdapterStaticConfig,
    pub container: Option<ContainerSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_degraded_attachments_warn() {
        let ip = Ipv4Addr::new(192, 168, 1, 1);
        assert!(AttachOutcome::Static(ip).warning().is_none());
        assert!(AttachOutcome::AlreadyAttached(ip).warning().is_none());

        let dynamic = AttachOutcome::Dynamic {
            requested: ip,
            assigned: Some(Ipv4Addr::new(192, 168, 0, 2)),
            reason: "Address already in use".into(),
        };
        assert!(dynamic.warning().unwrap().contains("192.168.1.1"));
        assert_eq!(dynamic.address(), Some(Ipv4Addr::new(192, 168, 0, 2)));

        let detached = AttachOutcome::Detached {
            reason: "no such network".into(),
        };
        assert!(detached.warning().is_some());
        assert_eq!(detached.address(), None);
    }
}
