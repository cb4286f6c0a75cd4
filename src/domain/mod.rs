//! Domain layer - Typed CloudFormation resource descriptions.

pub mod cloudfront;
pub mod iam;
pub mod lambda;
pub mod logs;
pub mod options;
pub mod s3;
pub mod template;
