//! CloudFormation resource graph.
//!
//! A [`Stack`] owns one [`Template`]. Resources and outputs live in sorted maps so
//! that the same input always serializes to the same bytes.

use crate::error::{Result, SynthError};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// CloudFormation caps logical ids at 255 characters.
const MAX_LOGICAL_ID_LEN: usize = 255;
/// Hex digits of the SHA-256 tag appended to shortened names.
const NAME_TAG_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: None,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }
}

impl Template {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Logical ids of every resource of the given CloudFormation type.
    pub fn resources_of_type<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a String, &'a Resource)> {
        self.resources.iter().filter(move |(_, r)| r.ty == ty)
    }
}

/// What happens to a resource's data when the stack deletes or replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    #[serde(rename = "Delete")]
    Destroy,
    Retain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub ty: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Resource {
    pub fn new(ty: impl Into<String>, properties: Value) -> Self {
        Self {
            ty: ty.into(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
            metadata: None,
        }
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Pseudo parameters resolved by CloudFormation at deploy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    AccountId,
    Region,
    Partition,
    UrlSuffix,
}

impl Pseudo {
    pub fn name(self) -> &'static str {
        match self {
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::Region => "AWS::Region",
            Pseudo::Partition => "AWS::Partition",
            Pseudo::UrlSuffix => "AWS::URLSuffix",
        }
    }

    pub fn to_value(self) -> Value {
        json!({ "Ref": self.name() })
    }
}

pub fn sub(template: impl Into<String>) -> Value {
    json!({ "Fn::Sub": template.into() })
}

pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index, list] })
}

pub fn split(delimiter: &str, source: Value) -> Value {
    json!({ "Fn::Split": [delimiter, source] })
}

/// Concatenates `parts` and keeps only `[A-Za-z0-9]`.
pub fn logical_id(parts: &[&str]) -> Result<String> {
    let joined = parts.concat();
    let id: String = joined.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if id.is_empty() || id.len() > MAX_LOGICAL_ID_LEN {
        return Err(SynthError::InvalidLogicalId(joined));
    }
    Ok(id)
}

/// `<base><suffix>` when it fits in `max` bytes. A longer `base` is cut and
/// tagged with the start of its SHA-256 (`<cut>-<tag><suffix>`), so two bases
/// sharing a long prefix still get different names.
pub fn bounded_name(base: &str, suffix: &str, max: usize) -> String {
    if base.len() + suffix.len() <= max {
        return format!("{base}{suffix}");
    }
    let digest = hex::encode(Sha256::digest(base.as_bytes()));
    let tag = &digest[..NAME_TAG_LEN];

    let mut cut = max.saturating_sub(suffix.len() + tag.len() + 1).min(base.len());
    while !base.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}-{tag}{suffix}", &base[..cut])
}

/// A named template under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    name: String,
    template: Template,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: Template::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.template.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn into_template(self) -> Template {
        self.template
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.template.resources.get(logical_id)
    }

    pub fn add_resource(&mut self, logical_id: &str, resource: Resource) -> Result<()> {
        if self.template.resources.contains_key(logical_id) {
            return Err(SynthError::DuplicateLogicalId(logical_id.to_string()));
        }
        debug!(logical_id, ty = %resource.ty, "declared resource");
        self.template
            .resources
            .insert(logical_id.to_string(), resource);
        Ok(())
    }

    pub fn add_output(&mut self, logical_id: &str, output: Output) -> Result<()> {
        if self.template.outputs.contains_key(logical_id) {
            return Err(SynthError::DuplicateLogicalId(logical_id.to_string()));
        }
        self.template.outputs.insert(logical_id.to_string(), output);
        Ok(())
    }

    /// `{"Ref": id}` for a resource that is already declared.
    pub fn reference(&self, logical_id: &str) -> Result<Value> {
        self.ensure_declared(logical_id)?;
        Ok(json!({ "Ref": logical_id }))
    }

    /// `{"Fn::GetAtt": [id, attr]}` for a resource that is already declared.
    pub fn get_att(&self, logical_id: &str, attribute: &str) -> Result<Value> {
        self.ensure_declared(logical_id)?;
        Ok(json!({ "Fn::GetAtt": [logical_id, attribute] }))
    }

    /// Low-level escape hatch: sets `path` inside the resource's properties.
    ///
    /// `path` is dot separated. Numeric segments index into arrays, missing object
    /// keys are created along the way.
    pub fn add_property_override(&mut self, logical_id: &str, path: &str, value: Value) -> Result<()> {
        let resource = self
            .template
            .resources
            .get_mut(logical_id)
            .ok_or_else(|| SynthError::UnknownResource(logical_id.to_string()))?;

        apply_override(&mut resource.properties, path, value).map_err(|reason| {
            SynthError::PropertyOverride {
                logical_id: logical_id.to_string(),
                path: path.to_string(),
                reason,
            }
        })?;
        debug!(logical_id, path, "applied property override");
        Ok(())
    }

    fn ensure_declared(&self, logical_id: &str) -> Result<()> {
        if self.template.resources.contains_key(logical_id) {
            Ok(())
        } else {
            Err(SynthError::UnknownResource(logical_id.to_string()))
        }
    }
}

fn apply_override(target: &mut Value, path: &str, value: Value) -> std::result::Result<(), String> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err("path has an empty segment".to_string());
    }
    let Some((last, parents)) = segments.split_last() else {
        return Err("path is empty".to_string());
    };

    let mut cursor = target;
    for segment in parents {
        cursor = step(cursor, segment)?;
    }

    match cursor {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let slot = array_slot(items, last)?;
            *slot = value;
            Ok(())
        }
        _ => Err(format!("{last:?} is set on a scalar value")),
    }
}

fn step<'a>(cursor: &'a mut Value, segment: &str) -> std::result::Result<&'a mut Value, String> {
    match cursor {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => array_slot(items, segment),
        _ => Err(format!("{segment:?} crosses a scalar value")),
    }
}

fn array_slot<'a>(items: &'a mut [Value], segment: &str) -> std::result::Result<&'a mut Value, String> {
    let len = items.len();
    let index: usize = segment
        .parse()
        .map_err(|_| format!("{segment:?} is not an array index"))?;
    items
        .get_mut(index)
        .ok_or_else(|| format!("index {index} is out of range for {len} items"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with_distribution() -> Stack {
        let mut stack = Stack::new("TestStack");
        stack
            .add_resource(
                "Distribution",
                Resource::new(
                    "AWS::CloudFront::Distribution",
                    json!({ "DistributionConfig": { "Origins": [{ "Id": "origin1" }] } }),
                ),
            )
            .unwrap();
        stack
    }

    #[test]
    fn test_logical_id_strips_punctuation() {
        assert_eq!(logical_id(&["example.com", "-OAI"]).unwrap(), "examplecomOAI");
        assert_eq!(logical_id(&["my_site", "Bucket"]).unwrap(), "mysiteBucket");
    }

    #[test]
    fn test_logical_id_rejects_empty_result() {
        assert!(matches!(
            logical_id(&["..", "--"]),
            Err(SynthError::InvalidLogicalId(_))
        ));
    }

    #[test]
    fn test_bounded_name_keeps_short_names() {
        assert_eq!(bounded_name("example.com", "-OAC", 64), "example.com-OAC");
    }

    #[test]
    fn test_bounded_name_tags_long_names() {
        let prefix = "a".repeat(70);
        let first = bounded_name(&format!("{prefix}.example.com"), "-OAC", 64);
        let second = bounded_name(&format!("{prefix}.example.org"), "-OAC", 64);

        assert_eq!(first.len(), 64);
        assert_eq!(second.len(), 64);
        assert!(first.ends_with("-OAC"));
        assert_ne!(first, second);
        assert_eq!(first, bounded_name(&format!("{prefix}.example.com"), "-OAC", 64));
    }

    #[test]
    fn test_duplicate_resource_is_rejected() {
        let mut stack = stack_with_distribution();
        let result = stack.add_resource("Distribution", Resource::new("AWS::S3::Bucket", json!({})));
        assert!(matches!(result, Err(SynthError::DuplicateLogicalId(id)) if id == "Distribution"));
    }

    #[test]
    fn test_get_att_requires_declared_resource() {
        let stack = stack_with_distribution();
        assert_eq!(
            stack.get_att("Distribution", "DomainName").unwrap(),
            json!({ "Fn::GetAtt": ["Distribution", "DomainName"] })
        );
        assert!(matches!(
            stack.get_att("OAC", "Id"),
            Err(SynthError::UnknownResource(id)) if id == "OAC"
        ));
        assert!(stack.reference("OAC").is_err());
    }

    #[test]
    fn test_property_override_walks_arrays() {
        let mut stack = stack_with_distribution();
        stack
            .add_property_override(
                "Distribution",
                "DistributionConfig.Origins.0.OriginAccessControlId",
                json!("oac-id"),
            )
            .unwrap();

        let origin = &stack.resource("Distribution").unwrap().properties["DistributionConfig"]["Origins"][0];
        assert_eq!(origin["Id"], "origin1");
        assert_eq!(origin["OriginAccessControlId"], "oac-id");
    }

    #[test]
    fn test_property_override_creates_missing_keys() {
        let mut stack = stack_with_distribution();
        stack
            .add_property_override("Distribution", "Tags.Owner", json!("web"))
            .unwrap();
        assert_eq!(
            stack.resource("Distribution").unwrap().properties["Tags"]["Owner"],
            "web"
        );
    }

    #[test]
    fn test_property_override_out_of_range() {
        let mut stack = stack_with_distribution();
        let err = stack
            .add_property_override("Distribution", "DistributionConfig.Origins.3.Id", json!("x"))
            .unwrap_err();
        assert!(matches!(err, SynthError::PropertyOverride { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_property_override_unknown_resource() {
        let mut stack = Stack::new("Empty");
        assert!(matches!(
            stack.add_property_override("Missing", "A.B", json!(1)),
            Err(SynthError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_serialized_template_shape() {
        let mut stack = stack_with_distribution().with_description("test");
        stack
            .add_output("DomainName", Output::new(json!("d111.cloudfront.net")))
            .unwrap();
        let value = serde_json::to_value(stack.template()).unwrap();

        assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(value["Description"], "test");
        assert_eq!(value["Resources"]["Distribution"]["Type"], "AWS::CloudFront::Distribution");
        assert!(value["Resources"]["Distribution"].get("DependsOn").is_none());
        assert_eq!(value["Outputs"]["DomainName"]["Value"], "d111.cloudfront.net");
    }

    #[test]
    fn test_removal_policy_serializes_as_delete() {
        let resource = Resource::new("AWS::Logs::LogGroup", json!({}))
            .with_removal_policy(RemovalPolicy::Destroy);
        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["DeletionPolicy"], "Delete");
        assert_eq!(value["UpdateReplacePolicy"], "Delete");
    }
}
