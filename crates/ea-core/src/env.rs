//! Environment variable synthesis for adapter containers.

use std::collections::BTreeMap;

use crate::extension::ExtensionRegistry;
use crate::types::AdapterRuntimeConfig;

/// Cache read timeout passed to adapters, in milliseconds.
pub const CACHE_REDIS_TIMEOUT_MS: u32 = 10_000;
/// Initial request-coalescing interval, in milliseconds.
pub const COALESCING_INTERVAL_MS: u32 = 100;
pub const COALESCING_INTERVAL_MAX_MS: u32 = 1_000;
pub const COALESCING_INTERVAL_COEFFICIENT: u32 = 2;
pub const COALESCING_ENTROPY_MAX: u32 = 0;
/// Upstream request timeout, in milliseconds.
pub const REQUEST_TIMEOUT_MS: u32 = 30_000;
pub const REQUEST_RETRIES: u32 = 1;

/// Produces the environment for an adapter container.
#[derive(Debug, Clone, Default)]
pub struct EnvSynthesizer {
    extensions: ExtensionRegistry,
}

impl EnvSynthesizer {
    pub fn new(extensions: ExtensionRegistry) -> Self {
        Self { extensions }
    }

    /// Baseline keys, then credentials (only when present), then the
    /// adapter's extension overrides.
    pub fn synthesize(&self, config: &AdapterRuntimeConfig) -> BTreeMap<String, String> {
        let mut env = baseline(config);

        if let Some(api_key) = config.api_key.as_deref().filter(|v| !v.is_empty()) {
            env.insert("API_KEY".to_string(), api_key.to_string());
        }
        if let Some(tier) = config.subscription_tier.as_deref().filter(|v| !v.is_empty()) {
            env.insert("RATE_LIMIT_API_TIER".to_string(), tier.to_string());
        }

        if let Some(ext) = self.extensions.get(config.name()) {
            env.extend(ext.env_overrides(config));
        }

        env
    }
}

fn baseline(config: &AdapterRuntimeConfig) -> BTreeMap<String, String> {
    let name = config.name();
    let entries: [(&str, String); 22] = [
        ("EA_PORT", config.port.to_string()),
        ("CACHE_ENABLED", "true".into()),
        ("CACHE_TYPE", "redis".into()),
        ("CACHE_KEY_GROUP", name.into()),
        ("CACHE_REDIS_HOST", config.network.cache_host.to_string()),
        ("CACHE_REDIS_PORT", config.network.cache_port.to_string()),
        ("CACHE_REDIS_TIMEOUT", CACHE_REDIS_TIMEOUT_MS.to_string()),
        ("RATE_LIMIT_ENABLED", "true".into()),
        ("WARMUP_ENABLED", "true".into()),
        ("RATE_LIMIT_API_PROVIDER", name.into()),
        ("REQUEST_COALESCING_ENABLED", "true".into()),
        ("REQUEST_COALESCING_INTERVAL", COALESCING_INTERVAL_MS.to_string()),
        ("REQUEST_COALESCING_INTERVAL_MAX", COALESCING_INTERVAL_MAX_MS.to_string()),
        (
            "REQUEST_COALESCING_INTERVAL_COEFFICIENT",
            COALESCING_INTERVAL_COEFFICIENT.to_string(),
        ),
        ("REQUEST_COALESCING_ENTROPY_MAX", COALESCING_ENTROPY_MAX.to_string()),
        ("LOG_LEVEL", "info".into()),
        ("DEBUG", "false".into()),
        ("API_VERBOSE", "false".into()),
        ("EXPERIMENTAL_METRICS_ENABLED", "true".into()),
        ("METRICS_NAME", name.into()),
        ("RETRY", REQUEST_RETRIES.to_string()),
        ("TIMEOUT", REQUEST_TIMEOUT_MS.to_string()),
    ];
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
