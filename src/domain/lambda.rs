//! Lambda function, function URL and permission descriptions.

use super::template::{sub, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Architecture {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionUrlAuthType {
    #[serde(rename = "AWS_IAM")]
    AwsIam,
    #[serde(rename = "NONE")]
    None,
}

/// Methods a function URL CORS configuration may allow. `All` is `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "HEAD")]
    Head,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "PATCH")]
    Patch,
    #[serde(rename = "OPTIONS")]
    Options,
    #[serde(rename = "*")]
    All,
}

/// A container image pushed by the artifact pipeline for the build context at
/// `asset_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCode {
    pub asset_path: String,
    pub repository: String,
    pub tag: String,
}

impl ImageCode {
    pub fn image_uri(&self) -> Value {
        sub(format!(
            "${{AWS::AccountId}}.dkr.ecr.${{AWS::Region}}.${{AWS::URLSuffix}}/{}:{}",
            self.repository, self.tag
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProps {
    pub code: ImageCode,
    pub role_arn: Value,
    pub architecture: Architecture,
    pub memory_size: u32,
    pub timeout_seconds: u32,
    pub environment: BTreeMap<String, String>,
    pub log_group: Option<Value>,
}

impl FunctionProps {
    pub fn to_resource(&self) -> Resource {
        let mut properties = json!({
            "PackageType": "Image",
            "Code": { "ImageUri": self.code.image_uri() },
            "Role": self.role_arn,
            "Architectures": [self.architecture],
            "MemorySize": self.memory_size,
            "Timeout": self.timeout_seconds,
        });
        if !self.environment.is_empty() {
            properties["Environment"] = json!({ "Variables": self.environment });
        }
        if let Some(log_group) = &self.log_group {
            properties["LoggingConfig"] = json!({ "LogGroup": log_group });
        }

        let mut metadata = Map::new();
        metadata.insert("aws:asset:path".to_string(), json!(self.code.asset_path));
        metadata.insert("aws:asset:property".to_string(), json!("Code.ImageUri"));

        Resource::new("AWS::Lambda::Function", properties).with_metadata(Value::Object(metadata))
    }
}

/// Small Python handler embedded in the template (`Code.ZipFile`). CloudFormation
/// caps inline source at 4 KB and provides the `cfnresponse` module to it.
pub fn inline_python_function(source: &str, role_arn: Value, timeout_seconds: u32) -> Resource {
    Resource::new(
        "AWS::Lambda::Function",
        json!({
            "Runtime": "python3.12",
            "Handler": "index.handler",
            "Code": { "ZipFile": source },
            "Role": role_arn,
            "Timeout": timeout_seconds,
            "MemorySize": 128,
        }),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionUrlCors {
    pub allow_methods: Vec<HttpMethod>,
    pub allow_origins: Vec<String>,
    pub allow_headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionUrlProps {
    pub target_function_arn: Value,
    pub auth_type: FunctionUrlAuthType,
    pub cors: FunctionUrlCors,
}

impl FunctionUrlProps {
    pub fn to_resource(&self) -> Resource {
        Resource::new(
            "AWS::Lambda::Url",
            json!({
                "TargetFunctionArn": self.target_function_arn,
                "AuthType": self.auth_type,
                "Cors": self.cors,
            }),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PermissionProps {
    pub action: String,
    pub function_name: Value,
    pub principal: String,
    pub source_arn: Value,
    pub function_url_auth_type: Option<FunctionUrlAuthType>,
}

impl PermissionProps {
    pub fn to_resource(&self) -> Resource {
        let mut properties = json!({
            "Action": self.action,
            "FunctionName": self.function_name,
            "Principal": self.principal,
            "SourceArn": self.source_arn,
        });
        if let Some(auth_type) = self.function_url_auth_type {
            properties["FunctionUrlAuthType"] = json!(auth_type);
        }
        Resource::new("AWS::Lambda::Permission", properties)
    }
}
