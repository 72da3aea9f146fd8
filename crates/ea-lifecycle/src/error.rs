//! Lifecycle error types.

use std::fmt;
use std::path::PathBuf;

use ea_core::ConfigError;
use ea_probe::ProbeError;
use ea_registry::RegistryError;
use ea_runtime::RuntimeError;
use thiserror::Error;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Runtime sub-step a transition was executing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckNetwork,
    CreateNetwork,
    ListContainers,
    RunContainer,
    StopContainer,
    RemoveContainer,
    ConnectNetwork,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckNetwork => "check network",
            Self::CreateNetwork => "create network",
            Self::ListContainers => "list containers",
            Self::RunContainer => "run container",
            Self::StopContainer => "stop container",
            Self::RemoveContainer => "remove container",
            Self::ConnectNetwork => "connect network",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("network {network} does not exist; run `ea-manager initialize` first")]
    Precondition { network: String },

    #[error("container {0} not found")]
    NotFound(String),

    #[error("no tags available: {0}")]
    Registry(#[from] RegistryError),

    #[error("no tags available for {0}")]
    NoTags(String),

    #[error("tag selection for {adapter} failed: {reason}")]
    Selection { adapter: String, reason: String },

    #[error("{step} failed for {target}: {source}")]
    RuntimeAction {
        step: Step,
        target: String,
        #[source]
        source: RuntimeError,
    },

    #[error("failed to create cache data directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The old container is gone and the replacement did not start.
    #[error("upgrade of {adapter} removed the previous container but the new one failed; the adapter is now absent: {source}")]
    UpgradeIncomplete {
        adapter: String,
        #[source]
        source: Box<LifecycleError>,
    },

    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),
}

impl LifecycleError {
    pub(crate) fn action(step: Step, target: &str, source: RuntimeError) -> Self {
        Self::RuntimeAction {
            step,
            target: target.to_string(),
            source,
        }
    }

    /// The failing runtime sub-step, if any.
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::RuntimeAction { step, .. } => Some(*step),
            Self::UpgradeIncomplete { source, .. } => source.step(),
            _ => None,
        }
    }
}
