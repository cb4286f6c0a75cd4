//! IAM policy documents and roles.

use super::template::{join, Pseudo, Resource};
use serde::Serialize;
use serde_json::{json, Value};

pub const POLICY_VERSION: &str = "2012-10-17";
pub const LAMBDA_BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Value>,
    pub action: Vec<String>,
    pub resource: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str]) -> Self {
        Self::new(Effect::Allow, actions)
    }

    pub fn deny(actions: &[&str]) -> Self {
        Self::new(Effect::Deny, actions)
    }

    fn new(effect: Effect, actions: &[&str]) -> Self {
        Self {
            effect,
            principal: None,
            action: actions.iter().map(|a| a.to_string()).collect(),
            resource: Vec::new(),
            condition: None,
        }
    }

    pub fn principal(mut self, principal: Value) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn resources(mut self, resources: Vec<Value>) -> Self {
        self.resource = resources;
        self
    }

    pub fn condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: &'static str,
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION,
            statement,
        }
    }
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// `{"Service": "<name>"}`
pub fn service_principal(service: &str) -> Value {
    json!({ "Service": service })
}

/// Managed policy ARN in the deploying partition.
pub fn managed_policy_arn(name: &str) -> Value {
    join(
        "",
        vec![
            json!("arn:"),
            Pseudo::Partition.to_value(),
            json!(format!(":iam::aws:policy/{name}")),
        ],
    )
}

/// `AWS::IAM::Role` that Lambda can assume, with basic log permissions and any
/// inline statements.
pub fn lambda_execution_role(inline: Vec<PolicyStatement>) -> Resource {
    let assume = PolicyDocument::new(vec![PolicyStatement::allow(&["sts:AssumeRole"])
        .principal(service_principal("lambda.amazonaws.com"))]);

    let mut properties = json!({
        "AssumeRolePolicyDocument": assume,
        "ManagedPolicyArns": [managed_policy_arn(LAMBDA_BASIC_EXECUTION_POLICY)],
    });
    if !inline.is_empty() {
        properties["Policies"] = json!([{
            "PolicyName": "inline",
            "PolicyDocument": PolicyDocument::new(inline),
        }]);
    }
    Resource::new("AWS::IAM::Role", properties)
}
