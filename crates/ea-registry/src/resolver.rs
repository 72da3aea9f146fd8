//! Tag resolver: source + ordering + preview.

use std::sync::Arc;
use std::time::Duration;

use ea_core::{AdapterIdentity, ManagerConfig};
use tracing::{debug, info};

use crate::error::RegistryResult;
use crate::order::{order_tags, preview};
use crate::source::{SkopeoTagSource, TagSource};

/// Lists an adapter's available tags in descending order.
#[derive(Clone)]
pub struct TagResolver {
    source: Arc<dyn TagSource>,
    preview_count: usize,
}

impl TagResolver {
    pub fn new(source: Arc<dyn TagSource>, preview_count: usize) -> Self {
        Self {
            source,
            preview_count: preview_count.max(1),
        }
    }

    /// Skopeo-backed resolver configured from the manager config.
    pub fn from_config(config: &ManagerConfig) -> Self {
        let source = SkopeoTagSource::new(
            config.registry.program.clone(),
            Duration::from_secs(config.registry.timeout_secs),
        );
        Self::new(Arc::new(source), config.registry.preview_count)
    }

    pub fn preview_count(&self) -> usize {
        self.preview_count
    }

    /// Every published tag for the adapter's repository, strictly
    /// descending. An empty result is not an error here.
    pub async fn list_tags(&self, identity: &AdapterIdentity) -> RegistryResult<Vec<String>> {
        let raw = self.source.list(&identity.image_repository).await?;
        let tags = order_tags(raw);
        info!(
            adapter = %identity.name,
            repository = %identity.image_repository,
            count = tags.len(),
            "listed tags"
        );
        Ok(tags)
    }

    /// The top of an ordered list, as shown to an operator choosing a tag.
    pub fn preview<'a>(&self, tags: &'a [String]) -> &'a [String] {
        preview(tags, self.preview_count)
    }

    /// The tag used when nobody picks one.
    pub fn default_tag(tags: &[String]) -> Option<&str> {
        let tag = tags.first().map(String::as_str);
        debug!(?tag, "default tag");
        tag
    }
}

impl std::fmt::Debug for TagResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagResolver")
            .field("preview_count", &self.preview_count)
            .finish_non_exhaustive()
    }
}
