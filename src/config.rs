//! Configuration for the synthesis entry point.

use crate::domain::options::{
    Certificate, SsrWebsiteOptions, StaticWebsiteOptions, DEFAULT_ARTIFACTS_DIR,
};
use crate::error::SynthError;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_STACK_NAME: &str = "MainStack";
pub const DEFAULT_OUT_DIR: &str = "cdk.out";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} env var required")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read sites file {path}: {source}")]
    SitesFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse sites file {path}: {source}")]
    SitesJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Site(#[from] SynthError),
}

/// One website in the stack, as written in a sites file:
/// `{"kind": "ssr", "domain_name": "...", "certificate": "arn:..."}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SiteConfig {
    Static(StaticWebsiteOptions),
    Ssr(SsrWebsiteOptions),
}

impl SiteConfig {
    pub fn domain_name(&self) -> &str {
        match self {
            SiteConfig::Static(options) => &options.domain_name,
            SiteConfig::Ssr(options) => &options.domain_name,
        }
    }
}

/// Configuration for one synthesized stack.
#[derive(Clone, Debug, PartialEq)]
pub struct StackConfig {
    /// Stack and template file name
    pub stack_name: String,
    /// Template description
    pub description: Option<String>,
    /// Directory the template is written to
    pub out_dir: PathBuf,
    /// At least one site
    pub sites: Vec<SiteConfig>,
}

impl StackConfig {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`StackConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let artifacts_dir = lookup("ARTIFACTS_DIR").unwrap_or_else(|| DEFAULT_ARTIFACTS_DIR.to_string());

        let mut sites = match lookup("SITES_FILE") {
            Some(path) => {
                let sites = sites_from_file(PathBuf::from(&path))?;
                if sites.is_empty() {
                    return Err(ConfigError::Invalid {
                        var: "SITES_FILE",
                        value: path,
                        reason: "expected at least one site".to_string(),
                    });
                }
                sites
            }
            None => vec![site_from_lookup(&lookup)?],
        };
        for site in sites.iter_mut() {
            if let SiteConfig::Ssr(options) = site {
                options.artifacts_dir.get_or_insert_with(|| artifacts_dir.clone());
            }
        }

        Ok(Self {
            stack_name: lookup("STACK_NAME").unwrap_or_else(|| DEFAULT_STACK_NAME.to_string()),
            description: lookup("STACK_DESCRIPTION"),
            out_dir: PathBuf::from(lookup("OUT_DIR").unwrap_or_else(|| DEFAULT_OUT_DIR.to_string())),
            sites,
        })
    }
}

fn sites_from_file(path: PathBuf) -> Result<Vec<SiteConfig>, ConfigError> {
    let body = match std::fs::read_to_string(&path) {
        Ok(body) => body,
        Err(source) => return Err(ConfigError::SitesFile { path, source }),
    };
    serde_json::from_str(&body).map_err(|source| ConfigError::SitesJson { path, source })
}

fn site_from_lookup<F>(lookup: &F) -> Result<SiteConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let domain_name = lookup("SITE_DOMAIN_NAME").ok_or(ConfigError::Missing("SITE_DOMAIN_NAME"))?;
    let certificate_arn =
        lookup("SITE_CERTIFICATE_ARN").ok_or(ConfigError::Missing("SITE_CERTIFICATE_ARN"))?;
    let certificate = Certificate::from_certificate_arn(certificate_arn)?;
    let cfn_output = match lookup("SITE_CFN_OUTPUT") {
        Some(value) => parse_bool("SITE_CFN_OUTPUT", value)?,
        None => false,
    };

    let kind = lookup("SITE_KIND").unwrap_or_else(|| "ssr".to_string());
    match kind.as_str() {
        "ssr" => {
            let mut options = SsrWebsiteOptions::new(domain_name, certificate);
            options.cfn_output = cfn_output;
            options.image_tag = lookup("SITE_IMAGE_TAG");
            Ok(SiteConfig::Ssr(options))
        }
        "static" => {
            let mut options = StaticWebsiteOptions::new(domain_name, certificate);
            options.cfn_output = cfn_output;
            options.default_root_object = lookup("SITE_DEFAULT_ROOT_OBJECT");
            options.default_not_found_root_object = lookup("SITE_NOT_FOUND_ROOT_OBJECT");
            Ok(SiteConfig::Static(options))
        }
        _ => Err(ConfigError::Invalid {
            var: "SITE_KIND",
            value: kind,
            reason: "expected `ssr` or `static`".to_string(),
        }),
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const CERT_ARN: &str =
        "arn:aws:acm:us-east-1:123456789012:certificate/12345678-1234-1234-1234-123456789012";

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_single_ssr_site_with_defaults() {
        let config = StackConfig::from_lookup(lookup_from(&[
            ("SITE_DOMAIN_NAME", "example.com"),
            ("SITE_CERTIFICATE_ARN", CERT_ARN),
        ]))
        .unwrap();

        assert_eq!(config.stack_name, "MainStack");
        assert_eq!(config.out_dir, PathBuf::from("cdk.out"));
        assert_eq!(config.sites.len(), 1);
        match &config.sites[0] {
            SiteConfig::Ssr(options) => {
                assert_eq!(options.domain_name, "example.com");
                assert_eq!(options.artifacts_dir.as_deref(), Some("artifacts"));
                assert!(!options.cfn_output);
            }
            other => panic!("expected an ssr site, got {other:?}"),
        }
    }

    #[test]
    fn test_single_static_site() {
        let config = StackConfig::from_lookup(lookup_from(&[
            ("SITE_KIND", "static"),
            ("SITE_DOMAIN_NAME", "example.com"),
            ("SITE_CERTIFICATE_ARN", CERT_ARN),
            ("SITE_CFN_OUTPUT", "true"),
            ("SITE_NOT_FOUND_ROOT_OBJECT", "missing.html"),
        ]))
        .unwrap();

        match &config.sites[0] {
            SiteConfig::Static(options) => {
                assert!(options.cfn_output);
                assert_eq!(options.default_not_found_root_object.as_deref(), Some("missing.html"));
            }
            other => panic!("expected a static site, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_certificate() {
        let result = StackConfig::from_lookup(lookup_from(&[("SITE_DOMAIN_NAME", "example.com")]));
        assert!(matches!(result, Err(ConfigError::Missing("SITE_CERTIFICATE_ARN"))));
    }

    #[test]
    fn test_invalid_values() {
        let result = StackConfig::from_lookup(lookup_from(&[
            ("SITE_DOMAIN_NAME", "example.com"),
            ("SITE_CERTIFICATE_ARN", CERT_ARN),
            ("SITE_KIND", "lambda"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: "SITE_KIND", .. })));

        let result = StackConfig::from_lookup(lookup_from(&[
            ("SITE_DOMAIN_NAME", "example.com"),
            ("SITE_CERTIFICATE_ARN", "arn:aws:s3:::bucket"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Site(SynthError::InvalidCertificate(_)))
        ));
    }

    #[test]
    fn test_sites_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sites.json");
        std::fs::write(
            &path,
            format!(
                r#"[
                    {{"kind": "static", "domain_name": "docs.example.com", "certificate": "{CERT_ARN}"}},
                    {{"kind": "ssr", "domain_name": "example.com", "certificate": "{CERT_ARN}", "cfn_output": true}}
                ]"#
            ),
        )
        .unwrap();
        let path_str = path.to_string_lossy().to_string();

        let config = StackConfig::from_lookup(lookup_from(&[
            ("SITES_FILE", path_str.as_str()),
            ("ARTIFACTS_DIR", "build/images"),
            ("STACK_NAME", "Websites"),
        ]))
        .unwrap();

        assert_eq!(config.stack_name, "Websites");
        let domains: Vec<&str> = config.sites.iter().map(|s| s.domain_name()).collect();
        assert_eq!(domains, vec!["docs.example.com", "example.com"]);
        match &config.sites[1] {
            SiteConfig::Ssr(options) => {
                assert!(options.cfn_output);
                assert_eq!(options.artifacts_dir.as_deref(), Some("build/images"));
            }
            other => panic!("expected an ssr site, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_sites_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sites.json");
        std::fs::write(&path, "[]").unwrap();
        let path_str = path.to_string_lossy().to_string();

        let result = StackConfig::from_lookup(lookup_from(&[("SITES_FILE", path_str.as_str())]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: "SITES_FILE", .. })));
    }

    #[test]
    fn test_sites_file_missing() {
        let result = StackConfig::from_lookup(lookup_from(&[("SITES_FILE", "/nonexistent/sites.json")]));
        assert!(matches!(result, Err(ConfigError::SitesFile { .. })));
    }
}
