use super::ssr_site::ssr_website;
use super::static_site::static_website;
use crate::config::{SiteConfig, StackConfig};
use crate::domain::template::{logical_id, Stack};
use crate::error::Result;
use crate::ports::artifacts::ArtifactStore;
use crate::ports::sink::TemplateSink;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthReport {
    pub stack_name: String,
    pub template_path: PathBuf,
    pub resources: usize,
    pub outputs: usize,
}

pub struct SynthService<A, S> {
    artifacts: A,
    sink: S,
}

impl<A, S> SynthService<A, S>
where
    A: ArtifactStore,
    S: TemplateSink,
{
    pub fn new(artifacts: A, sink: S) -> Self {
        Self { artifacts, sink }
    }

    pub async fn synthesize(&self, config: &StackConfig) -> Result<SynthReport> {
        // 1. Build the resource graph; every site is validated here
        let stack = build_stack(config)?;

        // 2. Every server-rendered site needs a published build context
        for site in &config.sites {
            if let SiteConfig::Ssr(options) = site {
                let context_dir = options.artifact_path();
                self.artifacts
                    .ensure_build_context(Path::new(&context_dir))
                    .await?;
            }
        }

        // 3. Hand the template over
        let template_path = self
            .sink
            .write_template(stack.name(), stack.template())
            .await?;

        let report = SynthReport {
            stack_name: stack.name().to_string(),
            template_path,
            resources: stack.template().resources.len(),
            outputs: stack.template().outputs.len(),
        };
        info!(
            stack = %report.stack_name,
            resources = report.resources,
            outputs = report.outputs,
            path = %report.template_path.display(),
            "synthesized stack"
        );
        Ok(report)
    }
}

/// Declares every configured site in one stack. Sites are identified by their
/// domain name with the punctuation removed (`example.com` -> `examplecom`).
pub fn build_stack(config: &StackConfig) -> Result<Stack> {
    let mut stack = Stack::new(config.stack_name.as_str());
    if let Some(description) = &config.description {
        stack = stack.with_description(description.as_str());
    }

    for site in &config.sites {
        let id = logical_id(&[site.domain_name()])?;
        match site {
            SiteConfig::Static(options) => {
                static_website(&mut stack, &id, options)?;
            }
            SiteConfig::Ssr(options) => {
                ssr_website(&mut stack, &id, options)?;
            }
        }
    }
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::options::{Certificate, SsrWebsiteOptions, StaticWebsiteOptions};
    use crate::error::SynthError;
    use crate::ports::artifacts::MockArtifactStore;
    use crate::ports::sink::MockTemplateSink;

    const CERT_ARN: &str =
        "arn:aws:acm:us-east-1:123456789012:certificate/12345678-1234-1234-1234-123456789012";

    fn certificate() -> Certificate {
        Certificate::from_certificate_arn(CERT_ARN).unwrap()
    }

    fn config(sites: Vec<SiteConfig>) -> StackConfig {
        StackConfig {
            stack_name: "MainStack".to_string(),
            description: None,
            out_dir: PathBuf::from("cdk.out"),
            sites,
        }
    }

    fn ssr_site() -> SiteConfig {
        SiteConfig::Ssr(SsrWebsiteOptions::new("example.com", certificate()))
    }

    fn static_site() -> SiteConfig {
        SiteConfig::Static(StaticWebsiteOptions::new("docs.example.com", certificate()))
    }

    #[tokio::test]
    async fn test_synthesize_checks_artifact_then_writes() {
        let mut artifacts = MockArtifactStore::new();
        artifacts
            .expect_ensure_build_context()
            .withf(|dir| dir == Path::new("artifacts/example.com"))
            .times(1)
            .returning(|_| Ok(()));

        let mut sink = MockTemplateSink::new();
        sink.expect_write_template()
            .withf(|name, template| name == "MainStack" && template.resources.contains_key("examplecomDistribution"))
            .times(1)
            .returning(|name, _| Ok(PathBuf::from(format!("cdk.out/{name}.template.json"))));

        let service = SynthService::new(artifacts, sink);
        let report = service.synthesize(&config(vec![ssr_site()])).await.unwrap();

        assert_eq!(report.stack_name, "MainStack");
        assert_eq!(report.template_path, PathBuf::from("cdk.out/MainStack.template.json"));
        assert_eq!(report.outputs, 0);
        assert!(report.resources >= 8);
    }

    #[tokio::test]
    async fn test_missing_artifact_stops_synthesis() {
        let mut artifacts = MockArtifactStore::new();
        artifacts
            .expect_ensure_build_context()
            .returning(|dir| Err(SynthError::MissingBuildContext(dir.to_path_buf())));

        let mut sink = MockTemplateSink::new();
        sink.expect_write_template().never();

        let service = SynthService::new(artifacts, sink);
        let result = service.synthesize(&config(vec![ssr_site()])).await;

        assert!(matches!(result, Err(SynthError::MissingBuildContext(_))));
    }

    #[tokio::test]
    async fn test_invalid_domain_is_rejected_before_artifact_lookup() {
        let mut artifacts = MockArtifactStore::new();
        artifacts.expect_ensure_build_context().never();

        let mut sink = MockTemplateSink::new();
        sink.expect_write_template().never();

        let site = SiteConfig::Ssr(SsrWebsiteOptions::new("../../etc", certificate()));
        let service = SynthService::new(artifacts, sink);
        let result = service.synthesize(&config(vec![site])).await;

        assert!(matches!(result, Err(SynthError::InvalidDomainName(d)) if d == "../../etc"));
    }

    #[tokio::test]
    async fn test_static_sites_need_no_artifact() {
        let mut artifacts = MockArtifactStore::new();
        artifacts.expect_ensure_build_context().never();

        let mut sink = MockTemplateSink::new();
        sink.expect_write_template()
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("out.json")));

        let service = SynthService::new(artifacts, sink);
        assert!(service.synthesize(&config(vec![static_site()])).await.is_ok());
    }

    #[tokio::test]
    async fn test_sink_errors_propagate() {
        let mut artifacts = MockArtifactStore::new();
        artifacts.expect_ensure_build_context().returning(|_| Ok(()));

        let mut sink = MockTemplateSink::new();
        sink.expect_write_template().returning(|_, _| {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        });

        let service = SynthService::new(artifacts, sink);
        let result = service.synthesize(&config(vec![ssr_site()])).await;
        assert!(matches!(result, Err(SynthError::Io(_))));
    }

    #[test]
    fn test_build_stack_is_deterministic() {
        let mut cfg = config(vec![ssr_site(), static_site()]);
        cfg.description = Some("websites".to_string());

        let first = build_stack(&cfg).unwrap().template().to_json_pretty().unwrap();
        let second = build_stack(&cfg).unwrap().template().to_json_pretty().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_stack_holds_every_site() {
        let stack = build_stack(&config(vec![ssr_site(), static_site()])).unwrap();
        let distributions = stack
            .template()
            .resources_of_type("AWS::CloudFront::Distribution")
            .count();

        assert_eq!(distributions, 2);
        assert!(stack.resource("examplecomDistribution").is_some());
        assert!(stack.resource("docsexamplecomDistribution").is_some());
    }

    #[test]
    fn test_duplicate_domains_are_rejected() {
        let result = build_stack(&config(vec![ssr_site(), ssr_site()]));
        assert!(matches!(result, Err(SynthError::DuplicateLogicalId(_))));
    }
}
