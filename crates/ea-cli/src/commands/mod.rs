pub mod fleet;
pub mod lifecycle;
pub mod prompt;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use ea_core::{ConfigResolver, ExtensionRegistry, HostEnvironment, ManagerConfig};
use ea_journal::FileJournal;
use ea_lifecycle::Orchestrator;
use ea_probe::{Prober, ProberConfig};
use ea_registry::TagResolver;
use ea_runtime::{ContainerRuntime, DockerCli};
use tracing::debug;

/// Everything a command needs, built once per invocation.
pub struct Context {
    pub config: ManagerConfig,
    pub orchestrator: Orchestrator,
}

impl Context {
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(ManagerConfig::default_path);
        let config = match config_path {
            Some(_) => ManagerConfig::from_file(&path),
            None => ManagerConfig::load_or_create(&path),
        }
        .with_context(|| format!("loading config from {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");

        let host = HostEnvironment::load(&config.paths).context("loading host environment")?;
        let resolver = ConfigResolver::new(
            Arc::new(host),
            config.network_defaults(),
            config.adapters.clone(),
            ExtensionRegistry::builtin(),
        );

        let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerCli::default());
        let prober = Prober::new(
            runtime.clone(),
            ProberConfig {
                network: config.network.name.clone(),
                port: config.probe.port,
                connect_timeout: Duration::from_secs(config.probe.connect_timeout_secs),
                request_timeout: Duration::from_secs(config.probe.request_timeout_secs),
            },
        );
        let orchestrator = Orchestrator::new(
            runtime,
            resolver,
            TagResolver::from_config(&config),
            prober,
            Arc::new(FileJournal::new(config.paths.log_dir.clone())),
            config.cache.clone(),
        );

        Ok(Self {
            config,
            orchestrator,
        })
    }
}
