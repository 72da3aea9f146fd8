//! ea-core — shared types and configuration for the external adapter manager.
//!
//! Everything in this crate is pure: it reads the host environment once,
//! then hands out immutable views. No container or network I/O happens here.
//!
//! # Components
//!
//! - **`config`** — `manager.toml` parsing and network defaults
//! - **`discovery`** — credential, chain and adapter-definition scraping
//! - **`resolver`** — merges discovery, credentials and defaults into an
//!   [`AdapterRuntimeConfig`]
//! - **`env`** — container environment synthesis
//! - **`extension`** — per-adapter overrides (defaults and env)

pub mod config;
pub mod discovery;
pub mod env;
pub mod error;
pub mod extension;
pub mod resolver;
pub mod types;

pub use config::ManagerConfig;
pub use discovery::{AdapterCatalog, ChainInfo, ChainVars, CredentialStore, HostEnvironment};
pub use env::EnvSynthesizer;
pub use error::{ConfigError, ConfigResult};
pub use extension::{AdapterExtension, CoinGecko, ExtensionRegistry};
pub use resolver::ConfigResolver;
pub use types::*;
