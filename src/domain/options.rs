//! Caller-facing website options.
//!
//! Every optional field has a documented default and `resolve()` applies all of
//! them at once, after validating the required fields. The provisioners only ever
//! see the resolved settings.
//!
//! The CORS defaults are deliberately permissive (`*` origins and headers, and
//! every method on the function URL). Authorization for the server-rendered site
//! happens in the request-signing layer, not in CORS.

use super::cloudfront::{AllowedMethods, ResponseHeadersPolicy};
use super::lambda::{FunctionUrlCors, HttpMethod, ImageCode};
use super::s3::{CorsRule, HttpMethods};
use crate::error::{Result, SynthError};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

pub const DEFAULT_ROOT_OBJECT: &str = "index.html";
pub const DEFAULT_NOT_FOUND_ROOT_OBJECT: &str = "404.html";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_IMAGE_TAG: &str = "latest";
pub const ANY: &str = "*";

const MAX_DOMAIN_LEN: usize = 253;
/// A static site's bucket is named after its domain.
const MAX_BUCKET_NAME_LEN: usize = 63;

fn domain_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)*[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$")
            .expect("domain pattern compiles")
    })
}

fn certificate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^arn:aws[a-z-]*:acm:[a-z0-9-]+:\d{12}:certificate/[A-Za-z0-9-]+$")
            .expect("certificate pattern compiles")
    })
}

pub fn validate_domain_name(domain_name: &str) -> Result<()> {
    if domain_name.len() > MAX_DOMAIN_LEN || !domain_pattern().is_match(domain_name) {
        return Err(SynthError::InvalidDomainName(domain_name.to_string()));
    }
    Ok(())
}

/// An ACM certificate issued outside the stack.
///
/// CloudFront only accepts certificates from `us-east-1`; the region is not
/// checked here and a wrong one surfaces when CloudFormation creates the
/// distribution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Certificate {
    arn: String,
}

impl Certificate {
    pub fn from_certificate_arn(arn: impl Into<String>) -> Result<Self> {
        let arn = arn.into();
        if !certificate_pattern().is_match(&arn) {
            return Err(SynthError::InvalidCertificate(arn));
        }
        Ok(Self { arn })
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }
}

impl TryFrom<String> for Certificate {
    type Error = SynthError;

    fn try_from(arn: String) -> Result<Self> {
        Self::from_certificate_arn(arn)
    }
}

fn or_any(values: &Option<Vec<String>>) -> Vec<String> {
    values.clone().unwrap_or_else(|| vec![ANY.to_string()])
}

fn document_name(value: &Option<String>, default: &str) -> String {
    let name = value.as_deref().unwrap_or(default);
    name.trim_start_matches('/').to_string()
}

/// Options for a site served from a private bucket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StaticWebsiteOptions {
    pub domain_name: String,
    pub certificate: Certificate,
    /// Default: `index.html`.
    pub default_root_object: Option<String>,
    /// Served with status 200 for 403 and 404 responses. Default: `404.html`.
    pub default_not_found_root_object: Option<String>,
    /// Default: `GET`, `HEAD`.
    pub allow_methods_bucket: Option<Vec<HttpMethods>>,
    /// Default: `GetHead`.
    pub allow_methods_cloud_front: Option<AllowedMethods>,
    /// Default: `*`.
    pub allow_origins: Option<Vec<String>>,
    /// Default: `*`.
    pub allow_headers: Option<Vec<String>>,
    /// Default: `SecurityHeaders`.
    pub response_headers_policy: Option<ResponseHeadersPolicy>,
    #[serde(default)]
    pub cfn_output: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticWebsiteSettings {
    pub domain_name: String,
    pub certificate: Certificate,
    pub default_root_object: String,
    pub default_not_found_root_object: String,
    pub bucket_cors: CorsRule,
    pub cloud_front_methods: AllowedMethods,
    pub response_headers_policy: ResponseHeadersPolicy,
    pub cfn_output: bool,
}

impl StaticWebsiteOptions {
    pub fn new(domain_name: impl Into<String>, certificate: Certificate) -> Self {
        Self {
            domain_name: domain_name.into(),
            certificate,
            default_root_object: None,
            default_not_found_root_object: None,
            allow_methods_bucket: None,
            allow_methods_cloud_front: None,
            allow_origins: None,
            allow_headers: None,
            response_headers_policy: None,
            cfn_output: false,
        }
    }

    pub fn resolve(&self) -> Result<StaticWebsiteSettings> {
        validate_domain_name(&self.domain_name)?;
        if self.domain_name.len() > MAX_BUCKET_NAME_LEN {
            return Err(SynthError::InvalidDomainName(self.domain_name.clone()));
        }

        Ok(StaticWebsiteSettings {
            domain_name: self.domain_name.clone(),
            certificate: self.certificate.clone(),
            default_root_object: document_name(&self.default_root_object, DEFAULT_ROOT_OBJECT),
            default_not_found_root_object: document_name(
                &self.default_not_found_root_object,
                DEFAULT_NOT_FOUND_ROOT_OBJECT,
            ),
            bucket_cors: CorsRule {
                allowed_methods: self
                    .allow_methods_bucket
                    .clone()
                    .unwrap_or_else(|| vec![HttpMethods::Get, HttpMethods::Head]),
                allowed_origins: or_any(&self.allow_origins),
                allowed_headers: or_any(&self.allow_headers),
            },
            cloud_front_methods: self.allow_methods_cloud_front.unwrap_or(AllowedMethods::GetHead),
            response_headers_policy: self
                .response_headers_policy
                .clone()
                .unwrap_or(ResponseHeadersPolicy::SecurityHeaders),
            cfn_output: self.cfn_output,
        })
    }
}

/// Options for a server-rendered site running as a container image function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SsrWebsiteOptions {
    pub domain_name: String,
    pub certificate: Certificate,
    /// Function URL CORS methods. Default: all (`*`).
    pub allow_methods: Option<Vec<HttpMethod>>,
    /// Default: `*`.
    pub allow_origins: Option<Vec<String>>,
    /// Default: `*`.
    pub allow_headers: Option<Vec<String>>,
    /// Default: `All`.
    pub allow_methods_cloud_front: Option<AllowedMethods>,
    /// Default: `SecurityHeaders`.
    pub response_headers_policy: Option<ResponseHeadersPolicy>,
    #[serde(default)]
    pub cfn_output: bool,
    /// Image tag pushed by the artifact pipeline. Default: `latest`.
    pub image_tag: Option<String>,
    /// Root holding one build context per domain. Default: `artifacts`.
    pub artifacts_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SsrWebsiteSettings {
    pub domain_name: String,
    pub certificate: Certificate,
    pub function_url_cors: FunctionUrlCors,
    pub cloud_front_methods: AllowedMethods,
    pub response_headers_policy: ResponseHeadersPolicy,
    pub cfn_output: bool,
    pub image: ImageCode,
}

impl SsrWebsiteOptions {
    pub fn new(domain_name: impl Into<String>, certificate: Certificate) -> Self {
        Self {
            domain_name: domain_name.into(),
            certificate,
            allow_methods: None,
            allow_origins: None,
            allow_headers: None,
            allow_methods_cloud_front: None,
            response_headers_policy: None,
            cfn_output: false,
            image_tag: None,
            artifacts_dir: None,
        }
    }

    /// Build context for this domain: `<artifacts_dir>/<domain_name>`.
    pub fn artifact_path(&self) -> String {
        let root = self.artifacts_dir.as_deref().unwrap_or(DEFAULT_ARTIFACTS_DIR);
        format!("{}/{}", root.trim_end_matches('/'), self.domain_name)
    }

    pub fn resolve(&self) -> Result<SsrWebsiteSettings> {
        validate_domain_name(&self.domain_name)?;

        Ok(SsrWebsiteSettings {
            domain_name: self.domain_name.clone(),
            certificate: self.certificate.clone(),
            function_url_cors: FunctionUrlCors {
                allow_methods: self
                    .allow_methods
                    .clone()
                    .unwrap_or_else(|| vec![HttpMethod::All]),
                allow_origins: or_any(&self.allow_origins),
                allow_headers: or_any(&self.allow_headers),
            },
            cloud_front_methods: self.allow_methods_cloud_front.unwrap_or(AllowedMethods::All),
            response_headers_policy: self
                .response_headers_policy
                .clone()
                .unwrap_or(ResponseHeadersPolicy::SecurityHeaders),
            cfn_output: self.cfn_output,
            image: ImageCode {
                asset_path: self.artifact_path(),
                repository: self.domain_name.clone(),
                tag: self
                    .image_tag
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IMAGE_TAG.to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_ARN: &str =
        "arn:aws:acm:us-east-1:123456789012:certificate/12345678-1234-1234-1234-123456789012";

    fn certificate() -> Certificate {
        Certificate::from_certificate_arn(CERT_ARN).unwrap()
    }

    #[test]
    fn test_certificate_accepts_acm_arn() {
        let cert = certificate();
        assert_eq!(cert.arn(), CERT_ARN);
    }

    #[test]
    fn test_certificate_region_is_not_enforced() {
        let cert = Certificate::from_certificate_arn(
            "arn:aws:acm:eu-west-1:123456789012:certificate/abc-123",
        )
        .unwrap();
        assert!(cert.arn().contains(":eu-west-1:"));
    }

    #[test]
    fn test_certificate_rejects_other_arns() {
        for arn in ["", "not-an-arn", "arn:aws:iam::123456789012:role/web"] {
            assert!(matches!(
                Certificate::from_certificate_arn(arn),
                Err(SynthError::InvalidCertificate(_))
            ));
        }
    }

    #[test]
    fn test_domain_validation() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("www.my-site.example.com").is_ok());
        for bad in ["", "Example.com", "-example.com", "example..com", "exa mple.com"] {
            assert!(validate_domain_name(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_static_defaults() {
        let settings = StaticWebsiteOptions::new("example.com", certificate())
            .resolve()
            .unwrap();

        assert_eq!(settings.default_root_object, "index.html");
        assert_eq!(settings.default_not_found_root_object, "404.html");
        assert_eq!(
            settings.bucket_cors.allowed_methods,
            vec![HttpMethods::Get, HttpMethods::Head]
        );
        assert_eq!(settings.bucket_cors.allowed_origins, vec!["*"]);
        assert_eq!(settings.bucket_cors.allowed_headers, vec!["*"]);
        assert_eq!(settings.cloud_front_methods, AllowedMethods::GetHead);
        assert_eq!(settings.response_headers_policy, ResponseHeadersPolicy::SecurityHeaders);
        assert!(!settings.cfn_output);
    }

    #[test]
    fn test_static_domain_must_fit_bucket_name() {
        let fits = format!("{}.example.com", "a".repeat(51));
        assert_eq!(fits.len(), 63);
        assert!(StaticWebsiteOptions::new(fits, certificate()).resolve().is_ok());

        let too_long = format!("{}.example.com", "a".repeat(52));
        assert!(matches!(
            StaticWebsiteOptions::new(too_long.clone(), certificate()).resolve(),
            Err(SynthError::InvalidDomainName(d)) if d == too_long
        ));
        assert!(SsrWebsiteOptions::new(too_long, certificate()).resolve().is_ok());
    }

    #[test]
    fn test_static_root_objects_lose_leading_slash() {
        let mut options = StaticWebsiteOptions::new("example.com", certificate());
        options.default_not_found_root_object = Some("/errors/missing.html".to_string());
        let settings = options.resolve().unwrap();
        assert_eq!(settings.default_not_found_root_object, "errors/missing.html");
    }

    #[test]
    fn test_ssr_defaults() {
        let options = SsrWebsiteOptions::new("example.com", certificate());
        let settings = options.resolve().unwrap();

        assert_eq!(settings.function_url_cors.allow_methods, vec![HttpMethod::All]);
        assert_eq!(settings.function_url_cors.allow_origins, vec!["*"]);
        assert_eq!(settings.cloud_front_methods, AllowedMethods::All);
        assert_eq!(settings.image.asset_path, "artifacts/example.com");
        assert_eq!(settings.image.tag, "latest");
    }

    #[test]
    fn test_ssr_overrides_are_kept() {
        let mut options = SsrWebsiteOptions::new("example.com", certificate());
        options.allow_origins = Some(vec!["https://example.com".to_string()]);
        options.allow_methods = Some(vec![HttpMethod::Get, HttpMethod::Post]);
        options.artifacts_dir = Some("build/".to_string());
        let settings = options.resolve().unwrap();

        assert_eq!(settings.function_url_cors.allow_origins, vec!["https://example.com"]);
        assert_eq!(
            settings.function_url_cors.allow_methods,
            vec![HttpMethod::Get, HttpMethod::Post]
        );
        assert_eq!(settings.image.asset_path, "build/example.com");
    }

    #[test]
    fn test_options_deserialize_from_json() {
        let options: SsrWebsiteOptions = serde_json::from_str(&format!(
            r#"{{"domain_name": "example.com", "certificate": "{CERT_ARN}", "cfn_output": true,
                "allow_methods_cloud_front": "GetHead", "response_headers_policy": {{"Custom": "abc"}}}}"#
        ))
        .unwrap();

        assert!(options.cfn_output);
        assert_eq!(options.allow_methods_cloud_front, Some(AllowedMethods::GetHead));
        assert_eq!(
            options.response_headers_policy,
            Some(ResponseHeadersPolicy::Custom("abc".to_string()))
        );
        assert_eq!(options.allow_origins, None);
    }

    #[test]
    fn test_bad_certificate_fails_deserialization() {
        let result: std::result::Result<StaticWebsiteOptions, _> = serde_json::from_str(
            r#"{"domain_name": "example.com", "certificate": "nope"}"#,
        );
        assert!(result.is_err());
    }
}
