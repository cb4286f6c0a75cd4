//! S3 bucket descriptions.

use super::iam::{PolicyDocument, PolicyStatement};
use super::template::{RemovalPolicy, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const AUTO_DELETE_OBJECTS_TAG: &str = "aws-cdk:auto-delete-objects";

/// Methods a bucket CORS rule may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethods {
    Get,
    Put,
    Head,
    Post,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CorsRule {
    pub allowed_methods: Vec<HttpMethods>,
    pub allowed_origins: Vec<String>,
    pub allowed_headers: Vec<String>,
}

/// A private, encrypted bucket. Public access is blocked unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketProps {
    pub bucket_name: String,
    pub cors: Vec<CorsRule>,
    pub auto_delete_objects: bool,
    pub removal_policy: RemovalPolicy,
}

impl BucketProps {
    pub fn to_resource(&self) -> Resource {
        let mut properties = json!({
            "BucketName": self.bucket_name,
            "PublicAccessBlockConfiguration": {
                "BlockPublicAcls": true,
                "BlockPublicPolicy": true,
                "IgnorePublicAcls": true,
                "RestrictPublicBuckets": true,
            },
            "BucketEncryption": {
                "ServerSideEncryptionConfiguration": [{
                    "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" }
                }]
            },
        });
        if !self.cors.is_empty() {
            properties["CorsConfiguration"] = json!({ "CorsRules": self.cors });
        }
        if self.auto_delete_objects {
            properties["Tags"] = json!([{ "Key": AUTO_DELETE_OBJECTS_TAG, "Value": "true" }]);
        }
        Resource::new("AWS::S3::Bucket", properties).with_removal_policy(self.removal_policy)
    }
}

/// Denies every request to the bucket and its objects that did not arrive over TLS.
pub fn enforce_ssl_statement(bucket_arn: &Value, objects_arn: &Value) -> PolicyStatement {
    PolicyStatement::deny(&["s3:*"])
        .principal(json!({ "AWS": "*" }))
        .resources(vec![bucket_arn.clone(), objects_arn.clone()])
        .condition(json!({ "Bool": { "aws:SecureTransport": "false" } }))
}

/// `AWS::S3::BucketPolicy` attached to `bucket` (a `Ref`).
pub fn bucket_policy(bucket: Value, document: PolicyDocument) -> Resource {
    Resource::new(
        "AWS::S3::BucketPolicy",
        json!({
            "Bucket": bucket,
            "PolicyDocument": document,
        }),
    )
}
