//! ea-lifecycle — adapter lifecycle orchestration.
//!
//! The [`Orchestrator`] owns the three state transitions (initialize,
//! deploy, upgrade) and the verification probe. It talks to the outside
//! world only through injected collaborators:
//!
//! - a [`ContainerRuntime`](ea_runtime::ContainerRuntime) for network and
//!   container actions
//! - a [`TagResolver`](ea_registry::TagResolver) for image tags
//! - a [`Prober`](ea_probe::Prober) for verification requests
//! - a [`Journal`](ea_journal::Journal) for outcome records
//!
//! Adapter containers are named `{adapter}-redis`. The suffix is historical
//! and does not mean the container runs a cache; the shared cache has its
//! own configured name.

pub mod containers;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod report;
pub mod selector;

pub use error::{LifecycleError, LifecycleResult, Step};
pub use locks::ResourceLocks;
pub use orchestrator::Orchestrator;
pub use report::{
    AttachOutcome, DeployReport, FleetEntry, InitializeReport, ResourceStatus, TestReport,
    UpgradeReport,
};
pub use selector::{NewestTag, TagSelector};
