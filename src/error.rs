//! Error types for template synthesis.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SynthError>;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("invalid domain name {0:?}: expected a lowercase DNS name")]
    InvalidDomainName(String),

    #[error("invalid certificate {0:?}: expected an ACM certificate ARN")]
    InvalidCertificate(String),

    #[error("invalid logical id {0:?}: must be 1-255 alphanumeric characters")]
    InvalidLogicalId(String),

    #[error("duplicate logical id {0}")]
    DuplicateLogicalId(String),

    #[error("resource {0} is referenced before it is declared")]
    UnknownResource(String),

    #[error("cannot override {path} on {logical_id}: {reason}")]
    PropertyOverride {
        logical_id: String,
        path: String,
        reason: String,
    },

    #[error("no build context at {0}: publish the container artifact first")]
    MissingBuildContext(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
