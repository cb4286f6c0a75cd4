//! Local adapters - Filesystem build contexts and template output.

pub mod fs;

pub use fs::{FsArtifactStore, FsTemplateSink};
