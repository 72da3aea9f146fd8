//! manager.toml configuration parser.
//!
//! Every section is optional. A missing file yields the built-in defaults,
//! which match the layout earlier shell tooling used (`eas-net`,
//! `192.168.0.0/16`, cache at `192.168.1.1:6379`).

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{NetworkDefaults, Subnet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub network: NetworkConfig,
    pub cache: CacheConfig,
    pub adapters: AdapterDefaults,
    pub registry: RegistryConfig,
    pub probe: ProbeConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub name: String,
    pub driver: String,
    pub subnet: Subnet,
    pub gateway: Ipv4Addr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "eas-net".to_string(),
            driver: "bridge".to_string(),
            subnet: Subnet {
                network: Ipv4Addr::new(192, 168, 0, 0),
                prefix_len: 16,
            },
            gateway: Ipv4Addr::new(192, 168, 0, 1),
        }
    }
}

/// The shared cache-service container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub container_name: String,
    pub image: String,
    /// Reserved address on the shared network.
    pub host: Ipv4Addr,
    pub port: u16,
    pub max_clients: u32,
    /// Host directory mounted at `/data`.
    pub data_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            container_name: "redis-cache".to_string(),
            image: "redis".to_string(),
            host: Ipv4Addr::new(192, 168, 1, 1),
            port: 6379,
            max_clients: 2500,
            data_dir: PathBuf::from("~/.redis"),
        }
    }
}

/// Fleet-wide fallbacks for adapters with incomplete discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterDefaults {
    pub repository_template: String,
    pub default_ip: Ipv4Addr,
    pub default_port: u16,
}

impl Default for AdapterDefaults {
    fn default() -> Self {
        Self {
            repository_template: "public.ecr.aws/chainlink/adapters/{adapter}-adapter".to_string(),
            default_ip: Ipv4Addr::new(192, 168, 1, 113),
            default_port: 1113,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Program used to list tags (`skopeo list-tags docker://...`).
    pub program: String,
    /// Number of tags shown when prompting.
    pub preview_count: usize,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            program: "skopeo".to_string(),
            preview_count: 10,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Port used when the probed container is not a known adapter.
    pub port: u16,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: 1113,
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

/// Host-environment files. Relative paths resolve against the working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub api_keys: PathBuf,
    pub misc_vars: PathBuf,
    pub adapters_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            api_keys: PathBuf::from("api_keys"),
            misc_vars: PathBuf::from("misc_vars"),
            adapters_dir: PathBuf::from("externalAdapters"),
            log_dir: PathBuf::from("~/.chainlink_ea_manager/logs"),
        }
    }
}

impl ManagerConfig {
    /// Default config location: `~/.chainlink_ea_manager/config.toml`.
    pub fn default_path() -> PathBuf {
        expand_tilde(Path::new("~/.chainlink_ea_manager/config.toml"))
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ManagerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config.expanded())
    }

    /// Load `path`, or write and return the defaults when it does not exist.
    ///
    /// Failing to write the default file is not fatal.
    pub fn load_or_create(path: &Path) -> ConfigResult<Self> {
        if path.is_file() {
            return Self::from_file(path);
        }

        let config = ManagerConfig::default();
        match config.write_to(path) {
            Ok(()) => debug!(path = %path.display(), "wrote default configuration"),
            Err(e) => warn!(path = %path.display(), error = %e, "could not write default configuration"),
        }
        Ok(config.expanded())
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn write_to(&self, path: &Path) -> ConfigResult<()> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_toml_string()?).map_err(io_err)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        let subnet = self.network.subnet;
        if !subnet.contains(self.network.gateway) {
            return Err(ConfigError::Invalid(format!(
                "gateway {} is outside subnet {subnet}",
                self.network.gateway
            )));
        }
        if !subnet.contains(self.cache.host) {
            return Err(ConfigError::Invalid(format!(
                "cache host {} is outside subnet {subnet}",
                self.cache.host
            )));
        }
        if self.registry.preview_count == 0 {
            return Err(ConfigError::Invalid(
                "registry.preview_count must be at least 1".to_string(),
            ));
        }
        if !self.adapters.repository_template.contains("{adapter}") {
            warn!(
                template = %self.adapters.repository_template,
                "repository template has no {{adapter}} placeholder; every adapter shares one repository"
            );
        }
        Ok(())
    }

    pub fn network_defaults(&self) -> NetworkDefaults {
        NetworkDefaults {
            network_name: self.network.name.clone(),
            driver: self.network.driver.clone(),
            subnet: self.network.subnet,
            gateway: self.network.gateway,
            cache_host: self.cache.host,
            cache_port: self.cache.port,
        }
    }

    fn expanded(mut self) -> Self {
        self.cache.data_dir = expand_tilde(&self.cache.data_dir);
        self.paths.api_keys = expand_tilde(&self.paths.api_keys);
        self.paths.misc_vars = expand_tilde(&self.paths.misc_vars);
        self.paths.adapters_dir = expand_tilde(&self.paths.adapters_dir);
        self.paths.log_dir = expand_tilde(&self.paths.log_dir);
        self
    }
}

/// Replace a leading `~` with `$HOME`. Paths without one are returned as-is.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
