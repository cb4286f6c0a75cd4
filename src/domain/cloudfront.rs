//! CloudFront distribution, cache policy and origin access descriptions.
//!
//! Managed policy ids are the ones AWS publishes; they are identical in every
//! account and region.

use super::template::{join, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const CLOUDFRONT_SERVICE_PRINCIPAL: &str = "cloudfront.amazonaws.com";

/// HTTP methods a distribution forwards to its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AllowedMethods {
    GetHead,
    GetHeadOptions,
    All,
}

impl AllowedMethods {
    pub fn methods(self) -> &'static [&'static str] {
        match self {
            AllowedMethods::GetHead => &["GET", "HEAD"],
            AllowedMethods::GetHeadOptions => &["GET", "HEAD", "OPTIONS"],
            AllowedMethods::All => &["GET", "HEAD", "OPTIONS", "PUT", "PATCH", "POST", "DELETE"],
        }
    }

    /// Methods whose responses are cached.
    pub fn cached_methods(self) -> &'static [&'static str] {
        match self {
            AllowedMethods::GetHeadOptions => &["GET", "HEAD", "OPTIONS"],
            AllowedMethods::GetHead | AllowedMethods::All => &["GET", "HEAD"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    HttpsOnly,
    RedirectToHttps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpVersion {
    #[serde(rename = "http1.1")]
    Http1_1,
    #[serde(rename = "http2")]
    Http2,
    #[serde(rename = "http2and3")]
    Http2And3,
    #[serde(rename = "http3")]
    Http3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceClass {
    #[serde(rename = "PriceClass_All")]
    All,
    #[serde(rename = "PriceClass_200")]
    Class200,
    #[serde(rename = "PriceClass_100")]
    Class100,
}

/// Minimum TLS version offered to viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SecurityPolicyProtocol {
    #[serde(rename = "TLSv1_2016")]
    TlsV1_2016,
    #[serde(rename = "TLSv1.1_2016")]
    TlsV1_1_2016,
    #[serde(rename = "TLSv1.2_2018")]
    TlsV1_2_2018,
    #[serde(rename = "TLSv1.2_2019")]
    TlsV1_2_2019,
    #[serde(rename = "TLSv1.2_2021")]
    TlsV1_2_2021,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedCachePolicy {
    CachingOptimized,
    CachingDisabled,
}

impl ManagedCachePolicy {
    pub fn id(self) -> &'static str {
        match self {
            ManagedCachePolicy::CachingOptimized => "658327ea-f89d-4fab-a63d-7e88639e58f6",
            ManagedCachePolicy::CachingDisabled => "4135ea2d-6df8-44a3-9df3-4b5a84be39ad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginRequestPolicy {
    CorsS3Origin,
    AllViewer,
    AllViewerExceptHostHeader,
}

impl OriginRequestPolicy {
    pub fn id(self) -> &'static str {
        match self {
            OriginRequestPolicy::CorsS3Origin => "88a5eaf4-2fd4-4709-b370-b4c650ea3fcf",
            OriginRequestPolicy::AllViewer => "216adef6-5c7f-47e4-b989-5492eafa07d3",
            OriginRequestPolicy::AllViewerExceptHostHeader => "b689b0a8-53d0-40ab-baf2-68738e2966ac",
        }
    }
}

/// Response headers policy attached to the default behavior. `Custom` carries the
/// id of a policy created outside this stack.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum ResponseHeadersPolicy {
    SecurityHeaders,
    CorsAndSecurityHeaders,
    SimpleCors,
    CorsWithPreflight,
    CorsWithPreflightAndSecurityHeaders,
    Custom(String),
}

impl ResponseHeadersPolicy {
    pub fn id(&self) -> &str {
        match self {
            ResponseHeadersPolicy::SecurityHeaders => "67f7725c-6f97-4210-82d7-5512b31e9d03",
            ResponseHeadersPolicy::CorsAndSecurityHeaders => "e61eb60c-9c35-4d20-a928-2b84e02af89c",
            ResponseHeadersPolicy::SimpleCors => "60669652-455b-4ae9-85a4-c4c02393f86c",
            ResponseHeadersPolicy::CorsWithPreflight => "5cc3b908-e619-4b99-88e5-2cf7f45965bd",
            ResponseHeadersPolicy::CorsWithPreflightAndSecurityHeaders => {
                "eaab4381-ed33-4a86-88ca-d9558dc6cd63"
            }
            ResponseHeadersPolicy::Custom(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieBehavior {
    None,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStringBehavior {
    None,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderBehavior {
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachePolicyConfig {
    pub name: String,
    pub cookie_behavior: CookieBehavior,
    pub query_string_behavior: QueryStringBehavior,
    pub header_behavior: HeaderBehavior,
    pub min_ttl: Duration,
    pub default_ttl: Duration,
    pub max_ttl: Duration,
    pub enable_accept_encoding_gzip: bool,
    pub enable_accept_encoding_brotli: bool,
}

impl CachePolicyConfig {
    pub fn to_resource(&self) -> Resource {
        Resource::new(
            "AWS::CloudFront::CachePolicy",
            json!({
                "CachePolicyConfig": {
                    "Name": self.name,
                    "MinTTL": self.min_ttl.as_secs(),
                    "DefaultTTL": self.default_ttl.as_secs(),
                    "MaxTTL": self.max_ttl.as_secs(),
                    "ParametersInCacheKeyAndForwardedToOrigin": {
                        "CookiesConfig": { "CookieBehavior": self.cookie_behavior },
                        "HeadersConfig": { "HeaderBehavior": self.header_behavior },
                        "QueryStringsConfig": { "QueryStringBehavior": self.query_string_behavior },
                        "EnableAcceptEncodingGzip": self.enable_accept_encoding_gzip,
                        "EnableAcceptEncodingBrotli": self.enable_accept_encoding_brotli,
                    }
                }
            }),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginAccessControlOriginType {
    Lambda,
    S3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningBehavior {
    Always,
    Never,
    NoOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningProtocol {
    Sigv4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OriginAccessControlConfig {
    pub name: String,
    pub origin_type: OriginAccessControlOriginType,
    pub signing_behavior: SigningBehavior,
    pub signing_protocol: SigningProtocol,
}

impl OriginAccessControlConfig {
    pub fn to_resource(&self) -> Resource {
        Resource::new(
            "AWS::CloudFront::OriginAccessControl",
            json!({
                "OriginAccessControlConfig": {
                    "Name": self.name,
                    "OriginAccessControlOriginType": self.origin_type,
                    "SigningBehavior": self.signing_behavior,
                    "SigningProtocol": self.signing_protocol,
                }
            }),
        )
    }
}

/// Legacy S3 access identity. Its `S3CanonicalUserId` attribute is the bucket
/// policy principal.
pub fn origin_access_identity(comment: &str) -> Resource {
    Resource::new(
        "AWS::CloudFront::CloudFrontOriginAccessIdentity",
        json!({ "CloudFrontOriginAccessIdentityConfig": { "Comment": comment } }),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// Bucket read through an origin access identity (`Ref` of the OAI).
    S3 {
        domain_name: Value,
        origin_access_identity: Value,
    },
    /// Any HTTPS endpoint, such as a function URL host.
    Https { domain_name: Value },
}

impl Origin {
    fn to_value(&self, id: &str) -> Value {
        match self {
            Origin::S3 {
                domain_name,
                origin_access_identity,
            } => json!({
                "Id": id,
                "DomainName": domain_name,
                "S3OriginConfig": {
                    "OriginAccessIdentity": join(
                        "",
                        vec![json!("origin-access-identity/cloudfront/"), origin_access_identity.clone()],
                    )
                }
            }),
            Origin::Https { domain_name } => json!({
                "Id": id,
                "DomainName": domain_name,
                "CustomOriginConfig": {
                    "OriginProtocolPolicy": "https-only",
                    "OriginSSLProtocols": ["TLSv1.2"],
                }
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultBehavior {
    pub origin: Origin,
    pub allowed_methods: AllowedMethods,
    /// A managed policy id, or a `Ref` to a cache policy in this stack.
    pub cache_policy_id: Value,
    pub origin_request_policy: Option<OriginRequestPolicy>,
    pub response_headers_policy: Option<ResponseHeadersPolicy>,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub compress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub http_status: u16,
    pub response_http_status: u16,
    pub response_page_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionProps {
    pub origin_id: String,
    pub default_behavior: DefaultBehavior,
    pub domain_names: Vec<String>,
    pub certificate_arn: String,
    pub minimum_protocol_version: SecurityPolicyProtocol,
    pub price_class: PriceClass,
    pub http_version: HttpVersion,
    pub default_root_object: Option<String>,
    pub error_responses: Vec<ErrorResponse>,
}

impl DistributionProps {
    pub fn to_resource(&self) -> Resource {
        let behavior = &self.default_behavior;
        let mut cache_behavior = json!({
            "TargetOriginId": self.origin_id,
            "ViewerProtocolPolicy": behavior.viewer_protocol_policy,
            "AllowedMethods": behavior.allowed_methods.methods(),
            "CachedMethods": behavior.allowed_methods.cached_methods(),
            "CachePolicyId": behavior.cache_policy_id,
            "Compress": behavior.compress,
        });
        if let Some(policy) = behavior.origin_request_policy {
            cache_behavior["OriginRequestPolicyId"] = json!(policy.id());
        }
        if let Some(policy) = &behavior.response_headers_policy {
            cache_behavior["ResponseHeadersPolicyId"] = json!(policy.id());
        }

        let mut config = json!({
            "Enabled": true,
            "IPV6Enabled": true,
            "Aliases": self.domain_names,
            "Origins": [behavior.origin.to_value(&self.origin_id)],
            "DefaultCacheBehavior": cache_behavior,
            "ViewerCertificate": {
                "AcmCertificateArn": self.certificate_arn,
                "MinimumProtocolVersion": self.minimum_protocol_version,
                "SslSupportMethod": "sni-only",
            },
            "PriceClass": self.price_class,
            "HttpVersion": self.http_version,
        });
        if let Some(root) = &self.default_root_object {
            config["DefaultRootObject"] = json!(root);
        }
        if !self.error_responses.is_empty() {
            let responses: Vec<Value> = self
                .error_responses
                .iter()
                .map(|r| {
                    json!({
                        "ErrorCode": r.http_status,
                        "ResponseCode": r.response_http_status,
                        "ResponsePagePath": r.response_page_path,
                    })
                })
                .collect();
            config["CustomErrorResponses"] = Value::Array(responses);
        }

        Resource::new(
            "AWS::CloudFront::Distribution",
            json!({ "DistributionConfig": config }),
        )
    }
}
