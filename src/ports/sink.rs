use crate::domain::template::Template;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Where synthesized templates go for the provisioning engine to pick up.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateSink: Send + Sync {
    /// Persist `template` for `stack_name` and return its location.
    async fn write_template(&self, stack_name: &str, template: &Template) -> Result<PathBuf>;
}
