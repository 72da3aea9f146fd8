//! Lifecycle orchestrator — drives network and container state.
//!
//! Every mutating transition holds the lock for the resource name it
//! touches. Runtime actions tolerate races with other processes: "already
//! exists" on create and "no such container" on remove are success.
//! Nothing is rolled back; a failure leaves whatever state the completed
//! sub-steps produced and names the sub-step that failed.

use std::net::Ipv4Addr;
use std::sync::Arc;

use ea_core::config::CacheConfig;
use ea_core::{
    AdapterRuntimeConfig, ConfigResolver, EnvSynthesizer, adapter_for_container, container_name,
};
use ea_journal::{Journal, OperationKind, tag_detail, test_detail};
use ea_probe::Prober;
use ea_registry::TagResolver;
use ea_runtime::{ContainerRuntime, ContainerSpec, NetworkCreate, NetworkSpec, RuntimeError};
use tracing::{debug, error, info, warn};

use crate::containers::{adapter_spec, cache_spec};
use crate::error::{LifecycleError, LifecycleResult, Step};
use crate::locks::ResourceLocks;
use crate::report::{
    AttachOutcome, DeployReport, FleetEntry, InitializeReport, ResourceStatus, TestReport,
    UpgradeReport,
};
use crate::selector::TagSelector;

/// A deploy whose config, tag and launch spec are fully resolved.
struct PreparedDeploy {
    config: AdapterRuntimeConfig,
    tag: String,
    spec: ContainerSpec,
}

pub struct Orchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    resolver: ConfigResolver,
    env: EnvSynthesizer,
    tags: TagResolver,
    prober: Prober,
    journal: Arc<dyn Journal>,
    cache: CacheConfig,
    locks: ResourceLocks,
}

impl Orchestrator {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        resolver: ConfigResolver,
        tags: TagResolver,
        prober: Prober,
        journal: Arc<dyn Journal>,
        cache: CacheConfig,
    ) -> Self {
        let env = EnvSynthesizer::new(resolver.extensions().clone());
        Self {
            runtime,
            resolver,
            env,
            tags,
            prober,
            journal,
            cache,
            locks: ResourceLocks::new(),
        }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn tag_resolver(&self) -> &TagResolver {
        &self.tags
    }

    fn network_name(&self) -> &str {
        &self.resolver.network().network_name
    }

    // ── Initialize ─────────────────────────────────────────────────

    /// Ensure the shared network and cache container exist.
    ///
    /// Existing resources are never recreated or reconfigured. With both
    /// present this performs no creation action.
    pub async fn initialize(&self) -> LifecycleResult<InitializeReport> {
        match self.initialize_inner().await {
            Ok(report) => {
                let detail = report.cache_attachment.warning();
                self.journal
                    .record(OperationKind::Initialize, None, true, detail.as_deref());
                info!(
                    network = %report.network,
                    cache = %report.cache,
                    "environment initialized"
                );
                Ok(report)
            }
            Err(e) => {
                error!(step = ?e.step(), error = %e, "initialize failed");
                self.journal.record(
                    OperationKind::Initialize,
                    None,
                    false,
                    Some(&e.to_string()),
                );
                Err(e)
            }
        }
    }

    async fn initialize_inner(&self) -> LifecycleResult<InitializeReport> {
        let network = self.network_name().to_string();
        let _network_guard = self.locks.lock(&network).await;
        let network_status = self.ensure_network().await?;

        let cache_name = self.cache.container_name.clone();
        let _cache_guard = self.locks.lock(&cache_name).await;

        let existing = self
            .runtime
            .list_containers(&cache_name)
            .await
            .map_err(|e| LifecycleError::action(Step::ListContainers, &cache_name, e))?;

        let cache_status = if existing.is_empty() {
            self.launch_cache().await?
        } else {
            info!(container = %cache_name, "cache container already exists");
            ResourceStatus::AlreadyPresent
        };

        let attachment = match self.current_address(&cache_name).await {
            Some(ip) => AttachOutcome::AlreadyAttached(ip),
            None => self.attach(&cache_name, self.cache.host).await,
        };

        Ok(InitializeReport {
            network: network_status,
            cache: cache_status,
            cache_container: cache_name,
            cache_port: self.cache.port,
            cache_attachment: attachment,
        })
    }

    async fn ensure_network(&self) -> LifecycleResult<ResourceStatus> {
        let defaults = self.resolver.network();
        let name = defaults.network_name.as_str();

        let exists = self
            .runtime
            .network_exists(name)
            .await
            .map_err(|e| LifecycleError::action(Step::CheckNetwork, name, e))?;
        if exists {
            info!(network = %name, "network already exists");
            return Ok(ResourceStatus::AlreadyPresent);
        }

        let spec = NetworkSpec {
            name: name.to_string(),
            driver: defaults.driver.clone(),
            subnet: defaults.subnet.to_string(),
            gateway: defaults.gateway,
        };
        match self.runtime.create_network(&spec).await {
            Ok(NetworkCreate::Created) => {
                info!(network = %name, subnet = %spec.subnet, gateway = %spec.gateway, "network created");
                Ok(ResourceStatus::Created)
            }
            Ok(NetworkCreate::AlreadyExists) => {
                info!(network = %name, "network created concurrently");
                Ok(ResourceStatus::AlreadyPresent)
            }
            Err(e) => Err(LifecycleError::action(Step::CreateNetwork, name, e)),
        }
    }

    async fn launch_cache(&self) -> LifecycleResult<ResourceStatus> {
        let data_dir = &self.cache.data_dir;
        if !tokio::fs::try_exists(data_dir).await.unwrap_or(false) {
            info!(path = %data_dir.display(), "creating cache data directory");
            tokio::fs::create_dir_all(data_dir)
                .await
                .map_err(|source| LifecycleError::CacheDir {
                    path: data_dir.clone(),
                    source,
                })?;
        }

        let spec = cache_spec(&self.cache);
        match self.runtime.run_container(&spec).await {
            Ok(id) => {
                info!(container = %spec.name, %id, image = %spec.image, "cache container started");
                Ok(ResourceStatus::Created)
            }
            Err(RuntimeError::Conflict(_)) => {
                info!(container = %spec.name, "cache container created concurrently");
                Ok(ResourceStatus::AlreadyPresent)
            }
            Err(e) => Err(LifecycleError::action(Step::RunContainer, &spec.name, e)),
        }
    }

    // ── Network attachment ─────────────────────────────────────────

    async fn current_address(&self, container: &str) -> Option<Ipv4Addr> {
        match self
            .runtime
            .container_address(container, self.network_name())
            .await
        {
            Ok(address) => address,
            Err(e) => {
                debug!(%container, error = %e, "address lookup failed");
                None
            }
        }
    }

    /// Attach `container` requesting `address`, falling back to a dynamic
    /// address. Never fails; the outcome says what happened.
    async fn attach(&self, container: &str, address: Ipv4Addr) -> AttachOutcome {
        let network = self.network_name();
        let static_err = match self
            .runtime
            .connect_network(network, container, Some(address))
            .await
        {
            Ok(()) => {
                info!(%container, %network, %address, "attached with static address");
                return AttachOutcome::Static(address);
            }
            Err(e) => e,
        };

        warn!(
            %container,
            %network,
            %address,
            error = %static_err,
            "static address attach failed, retrying without address"
        );
        match self.runtime.connect_network(network, container, None).await {
            Ok(()) => {
                let assigned = self.current_address(container).await;
                info!(%container, %network, ?assigned, "attached with dynamic address");
                AttachOutcome::Dynamic {
                    requested: address,
                    assigned,
                    reason: static_err.to_string(),
                }
            }
            Err(e) => {
                error!(%container, %network, step = %Step::ConnectNetwork, error = %e, "network attach failed");
                AttachOutcome::Detached {
                    reason: e.to_string(),
                }
            }
        }
    }

    // ── Deploy ─────────────────────────────────────────────────────

    /// Replace any same-named container with a fresh one for `adapter`.
    ///
    /// Without an explicit `tag` the registry is queried and `selector`
    /// chooses from the newest-first list. Selection happens before the
    /// container lock is taken.
    pub async fn deploy(
        &self,
        adapter: &str,
        tag: Option<&str>,
        selector: &dyn TagSelector,
    ) -> LifecycleResult<DeployReport> {
        let mut chosen = tag.map(str::to_string);
        let outcome = self.deploy_inner(adapter, tag, selector, &mut chosen).await;
        self.journal_deploy(
            OperationKind::Deploy,
            adapter,
            chosen.as_deref(),
            outcome.as_ref(),
        );
        outcome
    }

    async fn deploy_inner(
        &self,
        adapter: &str,
        tag: Option<&str>,
        selector: &dyn TagSelector,
        chosen: &mut Option<String>,
    ) -> LifecycleResult<DeployReport> {
        self.require_network().await?;
        let config = self.resolver.resolve(adapter)?;
        let tag = self.choose_tag(&config, tag, selector).await?;
        *chosen = Some(tag.clone());

        let _guard = self.locks.lock(&config.container_name()).await;
        let prepared = self.prepare(config, tag)?;
        self.launch(prepared).await
    }

    /// The explicit tag, or the selector's pick from the registry listing.
    async fn choose_tag(
        &self,
        config: &AdapterRuntimeConfig,
        tag: Option<&str>,
        selector: &dyn TagSelector,
    ) -> LifecycleResult<String> {
        if let Some(tag) = tag {
            return Ok(tag.to_string());
        }
        let adapter = config.name();
        let tags = self.tags.list_tags(&config.identity).await?;
        if tags.is_empty() {
            return Err(LifecycleError::NoTags(adapter.to_string()));
        }
        selector.select(adapter, &tags).await
    }

    /// Build the launch spec for `config` at `tag`.
    fn prepare(&self, config: AdapterRuntimeConfig, tag: String) -> LifecycleResult<PreparedDeploy> {
        let adapter = config.name().to_string();
        let config = config.with_tag(tag.clone());
        let env = self.env.synthesize(&config);
        let spec = adapter_spec(&config, env).ok_or_else(|| LifecycleError::Selection {
            adapter,
            reason: "no tag chosen".to_string(),
        })?;
        debug!(adapter = %config.name(), %tag, image = %spec.image, env_keys = spec.env.len(), "deploy prepared");
        Ok(PreparedDeploy { config, tag, spec })
    }

    async fn require_network(&self) -> LifecycleResult<()> {
        let network = self.network_name();
        let exists = self
            .runtime
            .network_exists(network)
            .await
            .map_err(|e| LifecycleError::action(Step::CheckNetwork, network, e))?;
        if exists {
            Ok(())
        } else {
            Err(LifecycleError::Precondition {
                network: network.to_string(),
            })
        }
    }

    async fn launch(&self, prepared: PreparedDeploy) -> LifecycleResult<DeployReport> {
        let PreparedDeploy { config, tag, spec } = prepared;
        let name = spec.name.clone();

        let existing = self
            .runtime
            .list_containers(&name)
            .await
            .map_err(|e| LifecycleError::action(Step::ListContainers, &name, e))?;
        for container in &existing {
            warn!(container = %name, id = %container.id, state = %container.state, "container exists, removing");
            self.runtime
                .remove_container(&name, true)
                .await
                .map_err(|e| LifecycleError::action(Step::RemoveContainer, &name, e))?;
        }

        info!(adapter = %config.name(), %tag, image = %spec.image, "launching adapter");
        let container_id = self
            .runtime
            .run_container(&spec)
            .await
            .map_err(|e| LifecycleError::action(Step::RunContainer, &name, e))?;

        let attachment = self.attach(&name, config.ip_address).await;

        Ok(DeployReport {
            adapter: config.name().to_string(),
            container: name,
            container_id,
            image: spec.image,
            tag,
            port: config.port,
            replaced: existing.len(),
            attachment,
        })
    }

    fn journal_deploy(
        &self,
        kind: OperationKind,
        adapter: &str,
        tag: Option<&str>,
        outcome: Result<&DeployReport, &LifecycleError>,
    ) {
        match outcome {
            Ok(report) => {
                let warning = report.attachment.warning();
                let detail = tag_detail(Some(&report.tag), warning.as_deref());
                self.journal
                    .record(kind, Some(adapter), true, detail.as_deref());
                info!(%adapter, tag = %report.tag, operation = %kind, "operation succeeded");
            }
            Err(e) => {
                error!(%adapter, ?tag, operation = %kind, step = ?e.step(), error = %e, "operation failed");
                let detail = tag_detail(tag, Some(&e.to_string()));
                self.journal
                    .record(kind, Some(adapter), false, detail.as_deref());
            }
        }
    }

    // ── Upgrade ────────────────────────────────────────────────────

    /// Replace an existing adapter container with a new tag.
    ///
    /// The new deploy is fully prepared before the old container is
    /// stopped. If the launch then fails the adapter is left absent and
    /// the error is [`LifecycleError::UpgradeIncomplete`].
    pub async fn upgrade(
        &self,
        adapter: &str,
        tag: Option<&str>,
        selector: &dyn TagSelector,
    ) -> LifecycleResult<UpgradeReport> {
        let mut chosen = tag.map(str::to_string);
        let outcome = self.upgrade_inner(adapter, tag, selector, &mut chosen).await;
        self.journal_deploy(
            OperationKind::Upgrade,
            adapter,
            chosen.as_deref(),
            outcome.as_ref().map(|report| &report.deploy),
        );
        outcome
    }

    async fn upgrade_inner(
        &self,
        adapter: &str,
        tag: Option<&str>,
        selector: &dyn TagSelector,
        chosen: &mut Option<String>,
    ) -> LifecycleResult<UpgradeReport> {
        let name = container_name(adapter);
        self.existing_image(&name).await?;
        self.require_network().await?;
        let config = self.resolver.resolve(adapter)?;
        let tag = self.choose_tag(&config, tag, selector).await?;
        *chosen = Some(tag.clone());

        let _guard = self.locks.lock(&name).await;
        // Re-read under the lock; another process may have removed it.
        let previous_image = self.existing_image(&name).await?;
        let prepared = self.prepare(config, tag)?;

        info!(container = %name, from = %previous_image, to = %prepared.spec.image, "stopping and removing");
        match self.runtime.stop_container(&name).await {
            Ok(()) | Err(RuntimeError::NoSuchContainer(_)) => {}
            Err(e) => return Err(LifecycleError::action(Step::StopContainer, &name, e)),
        }
        self.runtime
            .remove_container(&name, false)
            .await
            .map_err(|e| LifecycleError::action(Step::RemoveContainer, &name, e))?;

        let deploy = self.launch(prepared).await.map_err(|e| {
            warn!(container = %name, "previous container removed, adapter is now absent");
            LifecycleError::UpgradeIncomplete {
                adapter: adapter.to_string(),
                source: Box::new(e),
            }
        })?;

        Ok(UpgradeReport {
            previous_image,
            deploy,
        })
    }

    /// Image of the existing `name` container, or `NotFound`.
    async fn existing_image(&self, name: &str) -> LifecycleResult<String> {
        let existing = self
            .runtime
            .list_containers(name)
            .await
            .map_err(|e| LifecycleError::action(Step::ListContainers, name, e))?;
        existing
            .into_iter()
            .next()
            .map(|container| container.image)
            .ok_or_else(|| LifecycleError::NotFound(name.to_string()))
    }

    // ── Test ───────────────────────────────────────────────────────

    /// Port used to probe `container`: the adapter's own port when the
    /// name maps to a known adapter, otherwise the prober default.
    pub fn probe_port(&self, container: &str) -> u16 {
        adapter_for_container(container)
            .filter(|adapter| self.resolver.is_known(adapter))
            .and_then(|adapter| self.resolver.resolve(adapter).ok())
            .map(|config| config.port)
            .unwrap_or(self.prober.config().port)
    }

    /// Send one verification request to `container`.
    pub async fn test(&self, container: &str, from: &str, to: &str) -> LifecycleResult<TestReport> {
        let port = self.probe_port(container);
        match self.prober.probe_on(container, port, from, to).await {
            Ok(result) => {
                let detail = test_detail(from, to, Some(&result));
                self.journal
                    .record(OperationKind::Test, Some(container), true, Some(&detail));
                Ok(TestReport {
                    container: container.to_string(),
                    port,
                    from: from.to_string(),
                    to: to.to_string(),
                    result,
                })
            }
            Err(e) => {
                error!(%container, port, %from, %to, error = %e, "test failed");
                let detail = test_detail(from, to, None);
                self.journal
                    .record(OperationKind::Test, Some(container), false, Some(&detail));
                Err(e.into())
            }
        }
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Every discovered adapter, sorted by name, with its container state.
    pub async fn fleet(&self) -> LifecycleResult<Vec<FleetEntry>> {
        let adapters = &self.resolver.host().adapters;
        let mut entries = Vec::with_capacity(adapters.len());
        for name in adapters.names() {
            let container = container_name(name);
            let found = self
                .runtime
                .list_containers(&container)
                .await
                .map_err(|e| LifecycleError::action(Step::ListContainers, &container, e))?;
            entries.push(FleetEntry {
                name: name.to_string(),
                config: adapters.get(name).cloned().unwrap_or_default(),
                container: found.into_iter().next(),
            });
        }
        Ok(entries)
    }

    /// Newest-first tags for `adapter`.
    pub async fn available_tags(&self, adapter: &str) -> LifecycleResult<Vec<String>> {
        let identity = self.resolver.identity(adapter);
        Ok(self.tags.list_tags(&identity).await?)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("resolver", &self.resolver)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
