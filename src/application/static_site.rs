//! Static website: private bucket behind a CloudFront distribution.

use super::export_distribution_domain_name;
use crate::domain::cloudfront::{
    origin_access_identity, DefaultBehavior, DistributionProps, ErrorResponse, HttpVersion,
    ManagedCachePolicy, Origin, OriginRequestPolicy, PriceClass, SecurityPolicyProtocol,
    ViewerProtocolPolicy,
};
use crate::domain::iam::{lambda_execution_role, PolicyDocument, PolicyStatement};
use crate::domain::lambda::inline_python_function;
use crate::domain::options::StaticWebsiteOptions;
use crate::domain::s3::{bucket_policy, enforce_ssl_statement, BucketProps};
use crate::domain::template::{join, logical_id, RemovalPolicy, Resource, Stack};
use crate::error::Result;
use serde_json::{json, Value};
use tracing::info;

/// Empties the bucket when the custom resource is deleted, so that stack
/// teardown can remove the bucket itself.
const AUTO_DELETE_OBJECTS_HANDLER: &str = r#"import boto3
import cfnresponse


def handler(event, context):
    status = cfnresponse.SUCCESS
    try:
        if event["RequestType"] == "Delete":
            bucket = boto3.resource("s3").Bucket(event["ResourceProperties"]["BucketName"])
            bucket.object_versions.delete()
    except Exception as err:
        if "NoSuchBucket" not in str(err):
            print(err)
            status = cfnresponse.FAILED
    cfnresponse.send(event, context, status, {})
"#;

/// Logical ids declared by [`static_website`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticWebsite {
    pub bucket: String,
    pub auto_delete_objects: String,
    pub origin_access_identity: String,
    pub bucket_policy: String,
    pub distribution: String,
    pub output: Option<String>,
}

/// Declares the whole site or nothing: on error `stack` is left unchanged.
pub fn static_website(
    stack: &mut Stack,
    id: &str,
    options: &StaticWebsiteOptions,
) -> Result<StaticWebsite> {
    let mut draft = stack.clone();
    let site = declare(&mut draft, id, options)?;
    *stack = draft;
    Ok(site)
}

fn declare(stack: &mut Stack, id: &str, options: &StaticWebsiteOptions) -> Result<StaticWebsite> {
    let settings = options.resolve()?;
    let domain = settings.domain_name.as_str();

    // 1. Bucket
    let bucket_id = logical_id(&[id, "Bucket"])?;
    let bucket = BucketProps {
        bucket_name: domain.to_string(),
        cors: vec![settings.bucket_cors.clone()],
        auto_delete_objects: true,
        removal_policy: RemovalPolicy::Destroy,
    };
    stack.add_resource(&bucket_id, bucket.to_resource())?;
    let bucket_arn = stack.get_att(&bucket_id, "Arn")?;
    let objects_arn = join("", vec![bucket_arn.clone(), json!("/*")]);

    let auto_delete_id = auto_delete_objects(stack, id, &bucket_id, &bucket_arn, &objects_arn)?;

    // 2. Access identity + read-only bucket policy
    let oai_id = logical_id(&[id, "OAI"])?;
    stack.add_resource(&oai_id, origin_access_identity(&format!("OAI for {domain}")))?;

    let read_objects = PolicyStatement::allow(&["s3:GetObject"])
        .principal(json!({ "CanonicalUser": stack.get_att(&oai_id, "S3CanonicalUserId")? }))
        .resources(vec![objects_arn.clone()]);
    let document = PolicyDocument::new(vec![
        enforce_ssl_statement(&bucket_arn, &objects_arn),
        read_objects,
    ]);
    let policy_id = logical_id(&[id, "BucketPolicy"])?;
    let policy = bucket_policy(stack.reference(&bucket_id)?, document);
    stack.add_resource(&policy_id, policy)?;

    // 3. Distribution
    let distribution_id = logical_id(&[id, "Distribution"])?;
    let distribution = DistributionProps {
        origin_id: logical_id(&[id, "Origin"])?,
        default_behavior: DefaultBehavior {
            origin: Origin::S3 {
                domain_name: stack.get_att(&bucket_id, "RegionalDomainName")?,
                origin_access_identity: stack.reference(&oai_id)?,
            },
            allowed_methods: settings.cloud_front_methods,
            cache_policy_id: json!(ManagedCachePolicy::CachingOptimized.id()),
            origin_request_policy: Some(OriginRequestPolicy::CorsS3Origin),
            response_headers_policy: Some(settings.response_headers_policy.clone()),
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            compress: true,
        },
        domain_names: vec![domain.to_string()],
        certificate_arn: settings.certificate.arn().to_string(),
        minimum_protocol_version: SecurityPolicyProtocol::TlsV1_2_2021,
        price_class: PriceClass::All,
        http_version: HttpVersion::Http2,
        default_root_object: Some(settings.default_root_object.clone()),
        error_responses: soft_not_found(&settings.default_not_found_root_object),
    };
    stack.add_resource(&distribution_id, distribution.to_resource())?;

    // 4. Output
    let output = if settings.cfn_output {
        Some(export_distribution_domain_name(stack, id, domain, &distribution_id)?)
    } else {
        None
    };

    info!(domain, distribution = %distribution_id, "declared static website");

    Ok(StaticWebsite {
        bucket: bucket_id,
        auto_delete_objects: auto_delete_id,
        origin_access_identity: oai_id,
        bucket_policy: policy_id,
        distribution: distribution_id,
        output,
    })
}

/// 403 and 404 from the bucket both become a 200 with the not-found page.
fn soft_not_found(not_found_object: &str) -> Vec<ErrorResponse> {
    [403, 404]
        .into_iter()
        .map(|http_status| ErrorResponse {
            http_status,
            response_http_status: 200,
            response_page_path: format!("/{not_found_object}"),
        })
        .collect()
}

fn auto_delete_objects(
    stack: &mut Stack,
    id: &str,
    bucket_id: &str,
    bucket_arn: &Value,
    objects_arn: &Value,
) -> Result<String> {
    let role_id = logical_id(&[id, "AutoDeleteObjectsRole"])?;
    let role = lambda_execution_role(vec![PolicyStatement::allow(&[
        "s3:DeleteObject*",
        "s3:GetBucket*",
        "s3:List*",
    ])
    .resources(vec![bucket_arn.clone(), objects_arn.clone()])]);
    stack.add_resource(&role_id, role)?;

    let function_id = logical_id(&[id, "AutoDeleteObjectsFunction"])?;
    let function = inline_python_function(
        AUTO_DELETE_OBJECTS_HANDLER,
        stack.get_att(&role_id, "Arn")?,
        900,
    );
    stack.add_resource(&function_id, function)?;

    let resource_id = logical_id(&[id, "AutoDeleteObjects"])?;
    let resource = Resource::new(
        "Custom::S3AutoDeleteObjects",
        json!({
            "ServiceToken": stack.get_att(&function_id, "Arn")?,
            "BucketName": stack.reference(bucket_id)?,
        }),
    )
    .with_removal_policy(RemovalPolicy::Destroy);
    stack.add_resource(&resource_id, resource)?;
    Ok(resource_id)
}
