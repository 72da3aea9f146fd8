//! Tag sources.
//!
//! [`SkopeoTagSource`] shells out to `skopeo list-tags docker://{repo}` and
//! reads the `Tags` array from its JSON output. [`StaticTagSource`] serves
//! a fixed map and is used by tests and offline tooling.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Lists the raw, unordered tags published for an image repository.
#[async_trait]
pub trait TagSource: Send + Sync {
    async fn list(&self, repository: &str) -> RegistryResult<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct TagListing {
    #[serde(rename = "Tags")]
    tags: Option<Vec<String>>,
}

/// Parse `skopeo list-tags` output.
///
/// A missing or null `Tags` field is malformed; an empty array is not.
pub fn parse_tag_list(raw: &str) -> RegistryResult<Vec<String>> {
    let listing: TagListing =
        serde_json::from_str(raw).map_err(|e| RegistryError::Malformed(e.to_string()))?;
    listing
        .tags
        .ok_or_else(|| RegistryError::Malformed("response has no \"Tags\" field".to_string()))
}

/// Queries a registry through the `skopeo` CLI.
#[derive(Debug, Clone)]
pub struct SkopeoTagSource {
    program: String,
    timeout: Duration,
}

impl SkopeoTagSource {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SkopeoTagSource {
    fn default() -> Self {
        Self::new("skopeo", Duration::from_secs(30))
    }
}

#[async_trait]
impl TagSource for SkopeoTagSource {
    async fn list(&self, repository: &str) -> RegistryResult<Vec<String>> {
        let reference = format!("docker://{repository}");
        debug!(program = %self.program, %reference, "listing tags");

        let child = Command::new(&self.program)
            .args(["list-tags", &reference])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(RegistryError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(RegistryError::Timeout {
                    repository: repository.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(RegistryError::CommandFailed {
                repository: repository.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_tag_list(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Fixed repository → tags map.
#[derive(Debug, Clone, Default)]
pub struct StaticTagSource {
    tags: HashMap<String, Vec<String>>,
}

impl StaticTagSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags<I, S>(mut self, repository: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags
            .insert(repository.into(), tags.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl TagSource for StaticTagSource {
    /// Unknown repositories list as empty.
    async fn list(&self, repository: &str) -> RegistryResult<Vec<String>> {
        Ok(self.tags.get(repository).cloned().unwrap_or_default())
    }
}
