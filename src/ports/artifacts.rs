use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// The upstream pipeline that publishes one container build context per domain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fails if no build context has been published at `context_dir`.
    async fn ensure_build_context(&self, context_dir: &Path) -> Result<()>;
}
