//! Tag selection when the caller gave no explicit tag.

use async_trait::async_trait;

use crate::error::{LifecycleError, LifecycleResult};

/// Picks one tag from a non-empty, newest-first list.
///
/// Called before the adapter's transition lock is taken, so a selector
/// may wait on an operator.
#[async_trait]
pub trait TagSelector: Send + Sync {
    async fn select(&self, adapter: &str, tags: &[String]) -> LifecycleResult<String>;
}

/// Always takes the newest tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewestTag;

#[async_trait]
impl TagSelector for NewestTag {
    async fn select(&self, adapter: &str, tags: &[String]) -> LifecycleResult<String> {
        tags.first()
            .cloned()
            .ok_or_else(|| LifecycleError::NoTags(adapter.to_string()))
    }
}
