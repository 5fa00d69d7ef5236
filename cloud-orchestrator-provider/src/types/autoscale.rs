use serde::{Deserialize, Serialize};

use super::Extra;

/// Which members a group removes first when scaling in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoScaleTerminationPolicy {
    /// Remove the longest-running member.
    OldestInstance,
    /// Remove the most recently created member.
    NewestInstance,
    /// Remove the member closest to its next billing hour.
    ClosestToNextCharge,
    /// Vendor default.
    Default,
}

/// How a policy's `scaling_adjustment` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoScaleAdjustmentType {
    /// Add/remove this many members.
    ChangeInCapacity,
    /// Set the member count to exactly this value.
    ExactCapacity,
    /// Grow/shrink by this percentage of the current size.
    PercentChangeInCapacity,
}

/// An autoscaling group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScaleGroup {
    /// Vendor group identifier.
    pub id: String,
    /// Group name.
    pub name: String,
    /// Minimum member count.
    pub min_size: u32,
    /// Maximum member count.
    pub max_size: u32,
    /// Seconds to wait between scaling actions.
    pub cooldown: u32,
    /// Scale-in order.
    pub termination_policies: Vec<AutoScaleTerminationPolicy>,
    /// Vendor-specific attributes (status, datacenter, member template, ...).
    #[serde(default)]
    pub extra: Extra,
}

/// A scaling policy attached to a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalePolicy {
    /// Vendor policy identifier.
    pub id: String,
    /// Policy name.
    pub name: String,
    /// Group the policy belongs to.
    pub group_id: String,
    /// Interpretation of `scaling_adjustment`.
    pub adjustment_type: AutoScaleAdjustmentType,
    /// Signed adjustment amount.
    pub scaling_adjustment: i32,
    /// Vendor-specific attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// Request to create an autoscaling group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAutoScaleGroupRequest {
    /// Group name.
    pub name: String,
    /// Minimum member count.
    pub min_size: u32,
    /// Maximum member count.
    pub max_size: u32,
    /// Seconds between scaling actions.
    pub cooldown: u32,
    /// Scale-in order.
    #[serde(default)]
    pub termination_policies: Vec<AutoScaleTerminationPolicy>,
    /// Size identifier for members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Image identifier for members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Location for members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Vendor-specific request attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// Request to create a scaling policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAutoScalePolicyRequest {
    /// Group to attach the policy to.
    pub group_id: String,
    /// Policy name.
    pub name: String,
    /// Interpretation of `scaling_adjustment`.
    pub adjustment_type: AutoScaleAdjustmentType,
    /// Signed adjustment amount.
    pub scaling_adjustment: i32,
}
