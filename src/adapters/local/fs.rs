use crate::domain::template::Template;
use crate::error::{Result, SynthError};
use crate::ports::artifacts::ArtifactStore;
use crate::ports::sink::TemplateSink;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DOCKERFILE: &str = "Dockerfile";

/// Build contexts published on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsArtifactStore;

impl FsArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn ensure_build_context(&self, context_dir: &Path) -> Result<()> {
        // A build context is a directory with a Dockerfile at its root.
        let dockerfile = context_dir.join(DOCKERFILE);
        match tokio::fs::metadata(&dockerfile).await {
            Ok(meta) if meta.is_file() => {
                debug!(context = %context_dir.display(), "found build context");
                Ok(())
            }
            Ok(_) => Err(SynthError::MissingBuildContext(context_dir.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SynthError::MissingBuildContext(context_dir.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes `<out_dir>/<stack>.template.json`.
#[derive(Clone, Debug)]
pub struct FsTemplateSink {
    out_dir: PathBuf,
}

impl FsTemplateSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn template_path(&self, stack_name: &str) -> PathBuf {
        self.out_dir.join(format!("{stack_name}.template.json"))
    }
}

#[async_trait]
impl TemplateSink for FsTemplateSink {
    async fn write_template(&self, stack_name: &str, template: &Template) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.out_dir).await?;

        let mut body = template.to_json_pretty()?;
        body.push('\n');

        let path = self.template_path(stack_name);
        tokio::fs::write(&path, body).await?;
        debug!(path = %path.display(), "wrote template");
        Ok(path)
    }
}
