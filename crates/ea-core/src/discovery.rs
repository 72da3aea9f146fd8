//! Host environment discovery.
//!
//! Reads the three operator-maintained inputs once at startup:
//!
//! - `api_keys`: `export NAME=value` lines (credentials and tiers)
//! - `misc_vars`: `CHAIN_RPC_URL=` / `CHAIN_CHAIN_ID=` lines
//! - `externalAdapters/`: one executable launch script per adapter, from
//!   which `--ip`, `-p HOST:CONTAINER` and the credential variable names
//!   are scraped
//!
//! A missing input is a warning and yields an empty set. Nothing here
//! fails the whole fleet because one adapter script is odd.

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::path::Path;

use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::PathsConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::types::AdapterStaticConfig;

// ── Credentials ────────────────────────────────────────────────────

/// Read-only credential lookup. Unknown names are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    values: HashMap<String, String>,
}

impl CredentialStore {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CredentialStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Parse `export NAME=value` lines. Matching quotes around the value are stripped.
pub fn parse_credentials(content: &str) -> ConfigResult<CredentialStore> {
    let export_re = Regex::new(r"export\s+(\w+)=([^\n]*)")?;
    let store = export_re
        .captures_iter(content)
        .map(|caps| (caps[1].to_string(), unquote(caps[2].trim()).to_string()))
        .collect();
    Ok(store)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ── Chain variables ────────────────────────────────────────────────

/// RPC endpoint and chain id for one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainInfo {
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
}

/// Chain metadata keyed by chain prefix (`ETHEREUM`, `POLYGON`, ...).
pub type ChainVars = BTreeMap<String, ChainInfo>;

/// Parse `NAME_RPC_URL=` and `NAME_CHAIN_ID=` lines. Empty values are skipped.
pub fn parse_chain_vars(content: &str) -> ConfigResult<ChainVars> {
    let rpc_re = Regex::new(r"([A-Za-z0-9_]+)_RPC_URL=([^\n]*)")?;
    let chain_id_re = Regex::new(r"([A-Za-z0-9_]+)_CHAIN_ID=([^\n]*)")?;
    let mut chains = ChainVars::new();

    for caps in rpc_re.captures_iter(content) {
        let url = caps[2].trim();
        if !url.is_empty() {
            chains.entry(caps[1].to_string()).or_default().rpc_url = Some(url.to_string());
        }
    }

    for caps in chain_id_re.captures_iter(content) {
        let raw = caps[2].trim();
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<u64>() {
            Ok(id) => chains.entry(caps[1].to_string()).or_default().chain_id = Some(id),
            Err(_) => warn!(chain = &caps[1], value = raw, "invalid chain id, skipping"),
        }
    }

    Ok(chains)
}

// ── Adapter definitions ────────────────────────────────────────────

/// Static configuration for every discovered adapter, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterCatalog {
    adapters: BTreeMap<String, AdapterStaticConfig>,
}

impl AdapterCatalog {
    pub fn get(&self, name: &str) -> Option<&AdapterStaticConfig> {
        self.adapters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Adapter names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AdapterStaticConfig)> for AdapterCatalog {
    fn from_iter<I: IntoIterator<Item = (K, AdapterStaticConfig)>>(iter: I) -> Self {
        Self {
            adapters: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Scrape one adapter launch script.
///
/// Recognised fragments: `--ip A.B.C.D`, `-p HOST:CONTAINER` (host port is
/// used), `-e API_KEY=$VAR` and `-e RATE_LIMIT_API_TIER=$VAR`.
pub fn parse_adapter_definition(name: &str, content: &str) -> ConfigResult<AdapterStaticConfig> {
    let ip_re = Regex::new(r"--ip\s+(\d+\.\d+\.\d+\.\d+)")?;
    let port_re = Regex::new(r"-p\s+(\d+):(\d+)")?;
    let api_key_re = Regex::new(r"-e\s+API_KEY=\$([A-Za-z0-9_]+)")?;
    let tier_re = Regex::new(r"-e\s+RATE_LIMIT_API_TIER=\$([A-Za-z0-9_]+)")?;

    let ip_address = ip_re.captures(content).and_then(|caps| {
        caps[1]
            .parse::<Ipv4Addr>()
            .inspect_err(|e| warn!(adapter = name, value = &caps[1], error = %e, "ignoring invalid --ip"))
            .ok()
    });
    let port = port_re.captures(content).and_then(|caps| {
        caps[1]
            .parse::<u16>()
            .inspect_err(|e| warn!(adapter = name, value = &caps[1], error = %e, "ignoring invalid -p"))
            .ok()
    });

    Ok(AdapterStaticConfig {
        ip_address,
        port,
        api_key_variable_name: api_key_re.captures(content).map(|caps| caps[1].to_string()),
        subscription_tier_variable_name: tier_re.captures(content).map(|caps| caps[1].to_string()),
    })
}

/// Scan a directory of adapter scripts. Only executable regular files count;
/// the file name is the adapter name.
pub fn scan_adapter_dir(dir: &Path) -> ConfigResult<AdapterCatalog> {
    let mut adapters = BTreeMap::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ConfigError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();

        if !entry.file_type().is_file() || !is_executable(path) {
            debug!(path = %path.display(), "skipping non-executable entry");
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(adapter = name, error = %e, "unreadable adapter definition, skipping");
                continue;
            }
        };
        adapters.insert(name.to_string(), parse_adapter_definition(name, &content)?);
    }

    Ok(AdapterCatalog { adapters })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

// ── Host environment ───────────────────────────────────────────────

/// Everything discovered from the host, loaded once and then read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnvironment {
    pub credentials: CredentialStore,
    pub chains: ChainVars,
    pub adapters: AdapterCatalog,
}

impl HostEnvironment {
    pub fn load(paths: &PathsConfig) -> ConfigResult<Self> {
        let credentials = match read_optional(&paths.api_keys, "API keys file")? {
            Some(content) => parse_credentials(&content)?,
            None => CredentialStore::default(),
        };
        let chains = match read_optional(&paths.misc_vars, "misc vars file")? {
            Some(content) => parse_chain_vars(&content)?,
            None => ChainVars::new(),
        };
        let adapters = if paths.adapters_dir.is_dir() {
            scan_adapter_dir(&paths.adapters_dir)?
        } else {
            warn!(path = %paths.adapters_dir.display(), "external adapters directory not found");
            AdapterCatalog::default()
        };

        info!(
            adapters = adapters.len(),
            credentials = credentials.len(),
            chains = chains.len(),
            "host environment loaded"
        );

        Ok(Self {
            credentials,
            chains,
            adapters,
        })
    }
}

fn read_optional(path: &Path, what: &str) -> ConfigResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "{what} not found");
            Ok(None)
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
