//! Launch specs for the cache and adapter containers.

use std::collections::BTreeMap;

use ea_core::AdapterRuntimeConfig;
use ea_core::config::CacheConfig;
use ea_runtime::{ContainerSpec, PortBinding, RestartPolicy, VolumeBinding};

/// Port adapters expose Prometheus metrics on.
pub const METRICS_PORT: u16 = 9080;
pub const METRICS_PATH: &str = "/metrics";
/// Port the cache server listens on inside its container.
pub const CACHE_CONTAINER_PORT: u16 = 6379;

/// Scrape labels for an adapter container.
pub fn observability_labels(container: &str) -> BTreeMap<String, String> {
    [
        ("prometheus-scrape.enabled", "true".to_string()),
        ("prometheus-scrape.job_name", container.to_string()),
        ("prometheus-scrape.port", METRICS_PORT.to_string()),
        ("prometheus-scrape.metrics_path", METRICS_PATH.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Spec for an adapter container. `config` must carry a tag; `None` is
/// returned otherwise.
pub fn adapter_spec(
    config: &AdapterRuntimeConfig,
    env: BTreeMap<String, String>,
) -> Option<ContainerSpec> {
    let image = config.image()?;
    let name = config.container_name();
    let mut spec = ContainerSpec::new(&name, image);
    spec.restart = RestartPolicy::UnlessStopped;
    spec.ports.push(PortBinding::same(config.port));
    spec.env = env;
    spec.labels = observability_labels(&name);
    Some(spec)
}

/// Spec for the shared cache container.
pub fn cache_spec(cache: &CacheConfig) -> ContainerSpec {
    let mut spec = ContainerSpec::new(&cache.container_name, &cache.image);
    spec.restart = RestartPolicy::UnlessStopped;
    spec.ports.push(PortBinding {
        host_port: cache.port,
        container_port: CACHE_CONTAINER_PORT,
    });
    spec.volumes.push(VolumeBinding {
        host_path: cache.data_dir.clone(),
        container_path: "/data".to_string(),
        read_only: false,
    });
    spec.command = vec![
        "redis-server".to_string(),
        "--maxclients".to_string(),
        cache.max_clients.to_string(),
    ];
    spec
}
