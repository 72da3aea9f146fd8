//! Configuration resolver.
//!
//! Merges discovered static config, extension defaults, fleet fallbacks,
//! credentials and network defaults into an [`AdapterRuntimeConfig`].
//! Pure: no I/O, no mutation of its inputs.

use std::sync::Arc;

use tracing::debug;

use crate::config::AdapterDefaults;
use crate::discovery::HostEnvironment;
use crate::error::{ConfigError, ConfigResult};
use crate::extension::ExtensionRegistry;
use crate::types::{AdapterIdentity, AdapterRuntimeConfig, NetworkDefaults};

#[derive(Debug, Clone)]
pub struct ConfigResolver {
    host: Arc<HostEnvironment>,
    network: NetworkDefaults,
    defaults: AdapterDefaults,
    extensions: ExtensionRegistry,
}

impl ConfigResolver {
    pub fn new(
        host: Arc<HostEnvironment>,
        network: NetworkDefaults,
        defaults: AdapterDefaults,
        extensions: ExtensionRegistry,
    ) -> Self {
        Self {
            host,
            network,
            defaults,
            extensions,
        }
    }

    pub fn host(&self) -> &HostEnvironment {
        &self.host
    }

    pub fn network(&self) -> &NetworkDefaults {
        &self.network
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Identity for `adapter`, whether or not it was discovered.
    pub fn identity(&self, adapter: &str) -> AdapterIdentity {
        AdapterIdentity::new(adapter, &self.defaults.repository_template)
    }

    pub fn is_known(&self, adapter: &str) -> bool {
        self.host.adapters.contains(adapter)
    }

    /// Resolve `adapter` into a runtime config without a tag.
    ///
    /// Unset address/port fall back to extension defaults and then the
    /// fleet-wide defaults. Missing credentials are omitted, not errors.
    pub fn resolve(&self, adapter: &str) -> ConfigResult<AdapterRuntimeConfig> {
        let discovered = self
            .host
            .adapters
            .get(adapter)
            .ok_or_else(|| ConfigError::UnknownAdapter(adapter.to_string()))?;

        let mut merged = discovered.clone();
        if let Some(ext) = self.extensions.get(adapter) {
            merged = merged.or_defaults(&ext.default_static_config());
        }

        let ip_address = merged.ip_address.unwrap_or(self.defaults.default_ip);
        let port = merged.port.unwrap_or(self.defaults.default_port);

        if !self.network.subnet.contains(ip_address) {
            return Err(ConfigError::AddressOutsideSubnet {
                adapter: adapter.to_string(),
                address: ip_address,
                subnet: self.network.subnet.to_string(),
            });
        }

        let lookup = |var: Option<&str>| {
            var.and_then(|name| self.host.credentials.get(name))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let api_key = lookup(merged.api_key_variable_name.as_deref());
        let subscription_tier = lookup(merged.subscription_tier_variable_name.as_deref());

        debug!(
            adapter,
            %ip_address,
            port,
            api_key = api_key.is_some(),
            tier = subscription_tier.is_some(),
            "resolved adapter config"
        );

        Ok(AdapterRuntimeConfig {
            identity: self.identity(adapter),
            ip_address,
            port,
            api_key,
            subscription_tier,
            network: self.network.clone(),
            tag: None,
        })
    }
}
