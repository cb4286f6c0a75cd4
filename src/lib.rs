//! cdn-website - CloudFront website stacks as CloudFormation templates
//!
//! Hexagonal Architecture:
//! - domain/: Pure resource modelling (template, s3, cloudfront, lambda, logs, iam, options)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations
//! - application/: Website provisioners and the synthesis service
//! - config: Environment configuration
//!
//! # Sites
//! - static: private S3 bucket served through CloudFront with an origin access identity
//! - ssr: container-image Lambda behind a Function URL, signed by a CloudFront origin access control

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use application::ssr_site::{ssr_website, SsrWebsite};
pub use application::static_site::{static_website, StaticWebsite};
pub use application::synth::{build_stack, SynthReport, SynthService};
pub use config::{SiteConfig, StackConfig};
pub use domain::options::{Certificate, SsrWebsiteOptions, StaticWebsiteOptions};
pub use domain::template::{Stack, Template};
pub use error::{Result, SynthError};
