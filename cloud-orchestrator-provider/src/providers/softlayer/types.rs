//! SoftLayer API 类型定义

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Extra;

/// 错误响应体 `{"error": "...", "code": "SoftLayer_Exception_..."}`
#[derive(Debug, Deserialize)]
pub struct SlError {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// `{"keyName": "ACTIVE", "name": "Active"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlKeyName {
    pub key_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SlKeyName {
    pub fn new(key_name: &str) -> Self {
        Self {
            key_name: key_name.to_string(),
            name: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlScaleGroup {
    pub id: u64,
    pub name: String,
    pub minimum_member_count: u32,
    pub maximum_member_count: u32,
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default)]
    pub status: Option<SlKeyName>,
    #[serde(default)]
    pub termination_policy: Option<SlKeyName>,
    /// regionalGroup, virtualGuestMemberTemplate, createDate ...
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlScalePolicy {
    pub id: u64,
    pub name: String,
    pub scale_group_id: u64,
    #[serde(default)]
    pub scale_actions: Vec<SlScaleAction>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlScaleAction {
    pub amount: i32,
    /// RELATIVE, ABSOLUTE, PERCENT
    pub scale_type: String,
}

// ============ 请求体 ============

/// SoftLayer 方法参数包装 `{"parameters": [...]}`
#[derive(Debug, Serialize)]
pub struct Parameters<T> {
    pub parameters: [T; 1],
}

impl<T> Parameters<T> {
    pub fn one(value: T) -> Self {
        Self { parameters: [value] }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleGroupBody<'a> {
    pub name: &'a str,
    pub minimum_member_count: u32,
    pub maximum_member_count: u32,
    pub cooldown: u32,
    pub termination_policy: SlKeyName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regional_group: Option<Value>,
    pub virtual_guest_member_template: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalePolicyBody<'a> {
    pub name: &'a str,
    pub scale_group_id: u64,
    pub complex_type: &'static str,
    pub scale_actions: Vec<ScaleActionBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleActionBody {
    pub amount: i32,
    pub scale_type: &'static str,
    pub complex_type: &'static str,
}
