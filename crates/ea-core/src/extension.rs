//! Per-adapter extensions.
//!
//! An extension can supply static-config defaults (used when discovery
//! left a field unset) and environment overrides layered on top of the
//! synthesized baseline.

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::types::{AdapterRuntimeConfig, AdapterStaticConfig};

/// Adapter-specific behaviour hooks.
pub trait AdapterExtension: Send + Sync {
    /// Adapter name this extension applies to.
    fn name(&self) -> &str;

    /// Defaults consulted before the fleet-wide fallbacks.
    fn default_static_config(&self) -> AdapterStaticConfig {
        AdapterStaticConfig::default()
    }

    /// Environment entries that replace baseline entries with the same key.
    fn env_overrides(&self, config: &AdapterRuntimeConfig) -> BTreeMap<String, String>;
}

/// CoinGecko price adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinGecko;

impl AdapterExtension for CoinGecko {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn default_static_config(&self) -> AdapterStaticConfig {
        AdapterStaticConfig {
            ip_address: Some(Ipv4Addr::new(192, 168, 1, 113)),
            port: Some(1113),
            api_key_variable_name: Some("COINGECKO_API_KEY".to_string()),
            subscription_tier_variable_name: Some("COINGECKO_SUB_HTTP".to_string()),
        }
    }

    fn env_overrides(&self, _config: &AdapterRuntimeConfig) -> BTreeMap<String, String> {
        ["CACHE_KEY_GROUP", "RATE_LIMIT_API_PROVIDER", "METRICS_NAME"]
            .into_iter()
            .map(|key| (key.to_string(), "coingecko".to_string()))
            .collect()
    }
}

/// Lookup table of extensions by adapter name.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: HashMap<String, Arc<dyn AdapterExtension>>,
}

impl ExtensionRegistry {
    /// Registry with every extension shipped in this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(CoinGecko));
        registry
    }

    /// Add or replace the extension for `extension.name()`.
    pub fn register(&mut self, extension: Arc<dyn AdapterExtension>) {
        self.extensions.insert(extension.name().to_string(), extension);
    }

    pub fn get(&self, adapter: &str) -> Option<&dyn AdapterExtension> {
        self.extensions.get(adapter).map(|ext| ext.as_ref())
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.extensions.keys().collect();
        names.sort();
        f.debug_struct("ExtensionRegistry").field("extensions", &names).finish()
    }
}
