//! Server-rendered website: container image function behind a CloudFront
//! distribution.
//!
//! The function URL only accepts SigV4-signed requests. CloudFront signs them
//! through an origin access control, and the invoke permission is bound to this
//! one distribution.

use super::export_distribution_domain_name;
use crate::domain::cloudfront::{
    CachePolicyConfig, CookieBehavior, DefaultBehavior, DistributionProps, HeaderBehavior,
    HttpVersion, Origin, OriginAccessControlConfig, OriginAccessControlOriginType,
    OriginRequestPolicy, PriceClass, QueryStringBehavior, SecurityPolicyProtocol, SigningBehavior,
    SigningProtocol, ViewerProtocolPolicy, CLOUDFRONT_SERVICE_PRINCIPAL,
};
use crate::domain::iam::lambda_execution_role;
use crate::domain::lambda::{
    Architecture, FunctionProps, FunctionUrlAuthType, FunctionUrlProps, PermissionProps,
};
use crate::domain::logs::{LogGroupProps, RetentionDays};
use crate::domain::options::SsrWebsiteOptions;
use crate::domain::template::{
    bounded_name, join, logical_id, select, split, Pseudo, RemovalPolicy, Stack,
};
use crate::error::Result;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

/// Port the web adapter inside the image listens on.
pub const LISTEN_PORT: &str = "3001";
pub const MEMORY_SIZE_MB: u32 = 512;
/// Stays below CloudFront's 30 second origin response timeout.
pub const TIMEOUT_SECONDS: u32 = 29;
pub const LOG_RETENTION: RetentionDays = RetentionDays::OneWeek;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);
/// Not configurable: bounds how often CloudFront can reach the function.
pub const MIN_TTL: Duration = DAY;
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

const CACHE_POLICY_SUFFIX: &str = "-CachePolicy";
const MAX_CACHE_POLICY_NAME_LEN: usize = 128;
const OAC_SUFFIX: &str = "-OAC";
const MAX_OAC_NAME_LEN: usize = 64;

/// Property path of the default origin's access control id.
pub const ORIGIN_ACCESS_CONTROL_PATH: &str = "DistributionConfig.Origins.0.OriginAccessControlId";

/// Logical ids declared by [`ssr_website`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsrWebsite {
    pub log_group: String,
    pub role: String,
    pub function: String,
    pub function_url: String,
    pub cache_policy: String,
    pub distribution: String,
    pub origin_access_control: String,
    pub permission: String,
    pub output: Option<String>,
}

/// Declares the whole site or nothing: on error `stack` is left unchanged.
pub fn ssr_website(stack: &mut Stack, id: &str, options: &SsrWebsiteOptions) -> Result<SsrWebsite> {
    let mut draft = stack.clone();
    let site = declare(&mut draft, id, options)?;
    *stack = draft;
    Ok(site)
}

fn declare(stack: &mut Stack, id: &str, options: &SsrWebsiteOptions) -> Result<SsrWebsite> {
    let settings = options.resolve()?;
    let domain = settings.domain_name.as_str();

    // 1. Log group
    let log_group_id = logical_id(&[id, "LogGroup"])?;
    let log_group = LogGroupProps {
        log_group_name: format!("/aws/lambda/{domain}"),
        retention: LOG_RETENTION,
        removal_policy: RemovalPolicy::Destroy,
    };
    stack.add_resource(&log_group_id, log_group.to_resource())?;

    // 2. Function
    let role_id = logical_id(&[id, "ServiceRole"])?;
    stack.add_resource(&role_id, lambda_execution_role(vec![]))?;

    let function_id = logical_id(&[id, "Function"])?;
    let environment = BTreeMap::from([
        ("PORT".to_string(), LISTEN_PORT.to_string()),
        ("AWS_LWA_PORT".to_string(), LISTEN_PORT.to_string()),
    ]);
    let function = FunctionProps {
        code: settings.image.clone(),
        role_arn: stack.get_att(&role_id, "Arn")?,
        architecture: Architecture::Arm64,
        memory_size: MEMORY_SIZE_MB,
        timeout_seconds: TIMEOUT_SECONDS,
        environment,
        log_group: Some(stack.reference(&log_group_id)?),
    };
    stack.add_resource(&function_id, function.to_resource())?;

    // 3. Function URL
    let url_id = logical_id(&[id, "FunctionUrl"])?;
    let url = FunctionUrlProps {
        target_function_arn: stack.get_att(&function_id, "Arn")?,
        auth_type: FunctionUrlAuthType::AwsIam,
        cors: settings.function_url_cors.clone(),
    };
    stack.add_resource(&url_id, url.to_resource())?;

    // 4. Cache policy
    let cache_policy_id = logical_id(&[id, "CachePolicy"])?;
    stack.add_resource(&cache_policy_id, dynamic_cache_policy(domain).to_resource())?;

    // 5. Distribution
    let distribution_id = logical_id(&[id, "Distribution"])?;
    let url_host = select(2, split("/", stack.get_att(&url_id, "FunctionUrl")?));
    let distribution = DistributionProps {
        origin_id: logical_id(&[id, "Origin"])?,
        default_behavior: DefaultBehavior {
            origin: Origin::Https { domain_name: url_host },
            allowed_methods: settings.cloud_front_methods,
            cache_policy_id: stack.reference(&cache_policy_id)?,
            origin_request_policy: Some(OriginRequestPolicy::AllViewerExceptHostHeader),
            response_headers_policy: Some(settings.response_headers_policy.clone()),
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            compress: true,
        },
        domain_names: vec![domain.to_string()],
        certificate_arn: settings.certificate.arn().to_string(),
        minimum_protocol_version: SecurityPolicyProtocol::TlsV1_2_2021,
        price_class: PriceClass::All,
        http_version: HttpVersion::Http2And3,
        default_root_object: None,
        error_responses: vec![],
    };
    stack.add_resource(&distribution_id, distribution.to_resource())?;

    // 6. Origin access control
    let oac_id = logical_id(&[id, "OAC"])?;
    let oac = OriginAccessControlConfig {
        name: bounded_name(domain, OAC_SUFFIX, MAX_OAC_NAME_LEN),
        origin_type: OriginAccessControlOriginType::Lambda,
        signing_behavior: SigningBehavior::Always,
        signing_protocol: SigningProtocol::Sigv4,
    };
    stack.add_resource(&oac_id, oac.to_resource())?;

    // 7. Link the OAC to the origin
    attach_origin_access_control(stack, &distribution_id, &oac_id)?;

    // 8. Invoke permission for this distribution only
    let permission_id = logical_id(&[id, "CloudFrontServicePermission"])?;
    let source_arn = join(
        "",
        vec![
            json!("arn:"),
            Pseudo::Partition.to_value(),
            json!(":cloudfront::"),
            Pseudo::AccountId.to_value(),
            json!(":distribution/"),
            stack.reference(&distribution_id)?,
        ],
    );
    let permission = PermissionProps {
        action: "lambda:InvokeFunctionUrl".to_string(),
        function_name: stack.get_att(&function_id, "Arn")?,
        principal: CLOUDFRONT_SERVICE_PRINCIPAL.to_string(),
        source_arn,
        function_url_auth_type: Some(FunctionUrlAuthType::AwsIam),
    };
    stack.add_resource(&permission_id, permission.to_resource())?;

    // 9. Output
    let output = if settings.cfn_output {
        Some(export_distribution_domain_name(stack, id, domain, &distribution_id)?)
    } else {
        None
    };

    info!(domain, distribution = %distribution_id, image = %settings.image.asset_path, "declared server-rendered website");

    Ok(SsrWebsite {
        log_group: log_group_id,
        role: role_id,
        function: function_id,
        function_url: url_id,
        cache_policy: cache_policy_id,
        distribution: distribution_id,
        origin_access_control: oac_id,
        permission: permission_id,
        output,
    })
}

/// Escape hatch: the distribution description has no typed field for an origin
/// access control, so the id is patched into the default origin.
///
/// Remove once `Origin::Https` can carry the access control itself.
pub fn attach_origin_access_control(
    stack: &mut Stack,
    distribution_id: &str,
    oac_id: &str,
) -> Result<()> {
    let oac = stack.get_att(oac_id, "Id")?;
    stack.add_property_override(distribution_id, ORIGIN_ACCESS_CONTROL_PATH, oac)
}

/// Cache key is the path plus every query string; cookies and headers are
/// neither part of the key nor forwarded.
fn dynamic_cache_policy(domain: &str) -> CachePolicyConfig {
    let base = domain.replace('.', "");

    CachePolicyConfig {
        name: bounded_name(&base, CACHE_POLICY_SUFFIX, MAX_CACHE_POLICY_NAME_LEN),
        cookie_behavior: CookieBehavior::None,
        query_string_behavior: QueryStringBehavior::All,
        header_behavior: HeaderBehavior::None,
        min_ttl: MIN_TTL,
        default_ttl: DEFAULT_TTL,
        max_ttl: MAX_TTL,
        enable_accept_encoding_gzip: true,
        enable_accept_encoding_brotli: true,
    }
}
