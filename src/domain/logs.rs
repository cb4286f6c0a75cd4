//! CloudWatch Logs log groups.

use super::template::{RemovalPolicy, Resource};
use serde_json::json;

/// Retention periods CloudWatch Logs accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionDays {
    OneDay,
    ThreeDays,
    FiveDays,
    OneWeek,
    TwoWeeks,
    OneMonth,
    TwoMonths,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl RetentionDays {
    pub fn days(self) -> u32 {
        match self {
            RetentionDays::OneDay => 1,
            RetentionDays::ThreeDays => 3,
            RetentionDays::FiveDays => 5,
            RetentionDays::OneWeek => 7,
            RetentionDays::TwoWeeks => 14,
            RetentionDays::OneMonth => 30,
            RetentionDays::TwoMonths => 60,
            RetentionDays::ThreeMonths => 90,
            RetentionDays::SixMonths => 180,
            RetentionDays::OneYear => 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogGroupProps {
    pub log_group_name: String,
    pub retention: RetentionDays,
    pub removal_policy: RemovalPolicy,
}

impl LogGroupProps {
    pub fn to_resource(&self) -> Resource {
        Resource::new(
            "AWS::Logs::LogGroup",
            json!({
                "LogGroupName": self.log_group_name,
                "RetentionInDays": self.retention.days(),
            }),
        )
        .with_removal_policy(self.removal_policy)
    }
}
