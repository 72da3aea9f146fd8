//! Shared types used across the ea-manager crates.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Suffix appended to an adapter name to form its container name.
///
/// The shared cache container uses a role name (`redis-cache`) while adapter
/// containers carry the adapter's identity plus this suffix. Kept for
/// compatibility with fleets deployed by earlier tooling.
pub const CONTAINER_SUFFIX: &str = "-redis";

/// Container name for an adapter instance.
pub fn container_name(adapter: &str) -> String {
    format!("{adapter}{CONTAINER_SUFFIX}")
}

/// Inverse of [`container_name`]: the adapter a container name belongs to.
pub fn adapter_for_container(container: &str) -> Option<&str> {
    container
        .strip_suffix(CONTAINER_SUFFIX)
        .filter(|name| !name.is_empty())
}

// ── Adapter identity ───────────────────────────────────────────────

/// Immutable identity of an adapter in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterIdentity {
    pub name: String,
    /// Image repository with the `{adapter}` placeholder already substituted.
    pub image_repository: String,
}

impl AdapterIdentity {
    /// Build an identity from a repository template such as
    /// `public.ecr.aws/chainlink/adapters/{adapter}-adapter`.
    pub fn new(name: &str, repository_template: &str) -> Self {
        Self {
            name: name.to_string(),
            image_repository: repository_template.replace("{adapter}", name),
        }
    }

    /// Full image reference for a tag.
    pub fn image(&self, tag: &str) -> String {
        format!("{}:{tag}", self.image_repository)
    }

    pub fn container_name(&self) -> String {
        container_name(&self.name)
    }
}

/// Per-adapter metadata scraped from the adapter definition scripts.
///
/// Every field is optional: discovery is best-effort and the resolver fills
/// the gaps from extension defaults and fleet-wide fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterStaticConfig {
    pub ip_address: Option<Ipv4Addr>,
    pub port: Option<u16>,
    /// Name of the credential variable holding the API key (not the key).
    pub api_key_variable_name: Option<String>,
    /// Name of the credential variable holding the subscription tier.
    pub subscription_tier_variable_name: Option<String>,
}

impl AdapterStaticConfig {
    /// Fill unset fields from `defaults`, keeping everything already set.
    pub fn or_defaults(mut self, defaults: &AdapterStaticConfig) -> Self {
        self.ip_address = self.ip_address.or(defaults.ip_address);
        self.port = self.port.or(defaults.port);
        if self.api_key_variable_name.is_none() {
            self.api_key_variable_name = defaults.api_key_variable_name.clone();
        }
        if self.subscription_tier_variable_name.is_none() {
            self.subscription_tier_variable_name = defaults.subscription_tier_variable_name.clone();
        }
        self
    }
}

// ── Network ────────────────────────────────────────────────────────

/// An IPv4 CIDR block, e.g. `192.168.0.0/16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    pub(crate) network: Ipv4Addr,
    pub(crate) prefix_len: u8,
}

impl Subnet {
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Self, ConfigError> {
        if prefix_len > 32 {
            return Err(ConfigError::InvalidSubnet(format!(
                "{network}/{prefix_len}: prefix length exceeds 32"
            )));
        }
        Ok(Self {
            network: Ipv4Addr::from(u32::from(network) & mask(prefix_len)),
            prefix_len,
        })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Whether `address` falls inside this block.
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & mask(self.prefix_len) == u32::from(self.network)
    }
}

fn mask(prefix_len: u8) -> u32 {
    match prefix_len {
        0 => 0,
        n => u32::MAX << (32 - u32::from(n)),
    }
}

impl FromStr for Subnet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| ConfigError::InvalidSubnet(format!("{s}: missing prefix length")))?;
        let network = addr
            .parse::<Ipv4Addr>()
            .map_err(|e| ConfigError::InvalidSubnet(format!("{s}: {e}")))?;
        let prefix_len = prefix
            .parse::<u8>()
            .map_err(|e| ConfigError::InvalidSubnet(format!("{s}: {e}")))?;
        Subnet::new(network, prefix_len)
    }
}

impl TryFrom<String> for Subnet {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subnet> for String {
    fn from(subnet: Subnet) -> Self {
        subnet.to_string()
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Process-wide network settings shared by every adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDefaults {
    pub network_name: String,
    pub driver: String,
    pub subnet: Subnet,
    pub gateway: Ipv4Addr,
    pub cache_host: Ipv4Addr,
    pub cache_port: u16,
}

// ── Runtime config ─────────────────────────────────────────────────

/// Fully-resolved configuration for one adapter instance.
///
/// Built fresh for every deploy or upgrade. Credential fields are `None`
/// when the store has no value; they are never empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterRuntimeConfig {
    pub identity: AdapterIdentity,
    pub ip_address: Ipv4Addr,
    pub port: u16,
    pub api_key: Option<String>,
    pub subscription_tier: Option<String>,
    pub network: NetworkDefaults,
    /// Image tag chosen for this deployment, set once tag selection is done.
    pub tag: Option<String>,
}

impl AdapterRuntimeConfig {
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn container_name(&self) -> String {
        self.identity.container_name()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// `{repository}:{tag}`, or `None` before a tag has been chosen.
    pub fn image(&self) -> Option<String> {
        self.tag.as_deref().map(|tag| self.identity.image(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_name_round_trips() {
        assert_eq!(container_name("coingecko"), "coingecko-redis");
        assert_eq!(adapter_for_container("coingecko-redis"), Some("coingecko"));
        assert_eq!(adapter_for_container("redis-cache"), None);
        assert_eq!(adapter_for_container("-redis"), None);
    }

    #[test]
    fn identity_substitutes_template() {
        let id = AdapterIdentity::new(
            "coingecko",
            "public.ecr.aws/chainlink/adapters/{adapter}-adapter",
        );
        assert_eq!(
            id.image("3.2.1"),
            "public.ecr.aws/chainlink/adapters/coingecko-adapter:3.2.1"
        );
    }

    #[test]
    fn subnet_contains() {
        let subnet: Subnet = "192.168.0.0/16".parse().unwrap();
        assert!(subnet.contains(Ipv4Addr::new(192, 168, 1, 113)));
        assert!(subnet.contains(Ipv4Addr::new(192, 168, 255, 255)));
        assert!(!subnet.contains(Ipv4Addr::new(192, 169, 0, 1)));
        assert!(!subnet.contains(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn subnet_normalizes_host_bits() {
        let subnet: Subnet = "10.1.2.3/8".parse().unwrap();
        assert_eq!(subnet.to_string(), "10.0.0.0/8");
    }

    #[test]
    fn subnet_zero_prefix_contains_everything() {
        let subnet: Subnet = "0.0.0.0/0".parse().unwrap();
        assert!(subnet.contains(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn subnet_rejects_garbage() {
        assert!("192.168.0.0".parse::<Subnet>().is_err());
        assert!("192.168.0.0/33".parse::<Subnet>().is_err());
        assert!("nope/16".parse::<Subnet>().is_err());
    }

    #[test]
    fn static_config_defaults_fill_gaps_only() {
        let discovered = AdapterStaticConfig {
            ip_address: Some(Ipv4Addr::new(192, 168, 1, 50)),
            port: None,
            api_key_variable_name: None,
            subscription_tier_variable_name: Some("TIER".into()),
        };
        let defaults = AdapterStaticConfig {
            ip_address: Some(Ipv4Addr::new(192, 168, 1, 113)),
            port: Some(1113),
            api_key_variable_name: Some("KEY".into()),
            subscription_tier_variable_name: Some("OTHER_TIER".into()),
        };
        let merged = discovered.or_defaults(&defaults);
        assert_eq!(merged.ip_address, Some(Ipv4Addr::new(192, 168, 1, 50)));
        assert_eq!(merged.port, Some(1113));
        assert_eq!(merged.api_key_variable_name.as_deref(), Some("KEY"));
        assert_eq!(merged.subscription_tier_variable_name.as_deref(), Some("TIER"));
    }
}
