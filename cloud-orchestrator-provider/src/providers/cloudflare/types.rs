//! Cloudflare v4 payloads

use serde::{Deserialize, Serialize};

use crate::types::Extra;

/// Every v4 response is wrapped in this envelope, errors included.
#[derive(Debug, Deserialize)]
pub struct CfEnvelope<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<CfMessage>,
    pub result_info: Option<CfResultInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CfMessage {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CfResultInfo {
    #[serde(default)]
    pub total_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct CfZone {
    pub id: String,
    pub name: String,
    /// `full`, `partial` or `secondary`
    #[serde(rename = "type", default)]
    pub zone_type: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Deserialize)]
pub struct CfRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully qualified.
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Serialize)]
pub struct RecordBody {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: String,
    pub content: String,
    /// `1` asks Cloudflare to pick the TTL.
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ZoneBody {
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountRef>,
}

#[derive(Debug, Serialize)]
pub struct AccountRef {
    pub id: String,
}
