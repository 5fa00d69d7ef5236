//! DigitalOcean API 类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Extra;

/// 错误响应体 `{"id": "not_found", "message": "..."}`
#[derive(Debug, Deserialize)]
pub struct DoErrorBody {
    pub id: String,
    pub message: String,
}

/// 分页链接 `links.pages.next`
#[derive(Debug, Default, Deserialize)]
pub struct DoLinks {
    #[serde(default)]
    pub pages: Option<DoPages>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DoPages {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DoDroplet {
    pub id: u64,
    pub name: String,
    /// new, active, off, archive
    pub status: String,
    #[serde(default)]
    pub size_slug: Option<String>,
    #[serde(default)]
    pub image: Option<DoImage>,
    #[serde(default)]
    pub region: Option<DoRegion>,
    #[serde(default)]
    pub networks: DoNetworks,
    #[serde(default, deserialize_with = "crate::utils::datetime::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    /// memory, vcpus, disk, tags, features, volume_ids ...
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Default, Deserialize)]
pub struct DoNetworks {
    #[serde(default)]
    pub v4: Vec<DoNetwork>,
    #[serde(default)]
    pub v6: Vec<DoNetwork>,
}

#[derive(Debug, Deserialize)]
pub struct DoNetwork {
    pub ip_address: String,
    /// public / private
    #[serde(rename = "type")]
    pub network_type: String,
}

#[derive(Debug, Deserialize)]
pub struct DoImage {
    pub id: u64,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Deserialize)]
pub struct DoRegion {
    pub slug: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Deserialize)]
pub struct DoSize {
    pub slug: String,
    pub memory: u64,
    pub vcpus: u32,
    pub disk: u64,
    #[serde(default)]
    pub price_hourly: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Deserialize)]
pub struct DoVolume {
    pub id: String,
    pub name: String,
    pub size_gigabytes: u64,
    #[serde(default)]
    pub droplet_ids: Vec<u64>,
    #[serde(default)]
    pub region: Option<DoRegion>,
    /// description, filesystem_type, created_at, tags ...
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Deserialize)]
pub struct DoAction {
    pub id: u64,
    /// in-progress, completed, errored
    pub status: String,
    #[serde(rename = "type", default)]
    pub action_type: Option<String>,
}

// ============ 响应包装 ============

#[derive(Debug, Deserialize)]
pub struct DropletEnvelope {
    pub droplet: DoDroplet,
}

#[derive(Debug, Deserialize)]
pub struct VolumeEnvelope {
    pub volume: DoVolume,
}

#[derive(Debug, Deserialize)]
pub struct ActionEnvelope {
    pub action: DoAction,
}

#[derive(Debug, Deserialize)]
pub struct AccountEnvelope {
    pub account: DoAccount,
}

#[derive(Debug, Deserialize)]
pub struct DoAccount {
    /// active, warning, locked
    pub status: String,
}

// ============ 请求体 ============

#[derive(Debug, Serialize)]
pub struct CreateDropletBody<'a> {
    pub name: &'a str,
    pub size: &'a str,
    pub image: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub ssh_keys: &'a [String],
    /// backups, ipv6, user_data, tags ...
    #[serde(flatten)]
    pub extra: &'a Extra,
}

#[derive(Debug, Serialize)]
pub struct CreateVolumeBody<'a> {
    pub name: &'a str,
    pub size_gigabytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ActionBody<'a> {
    #[serde(rename = "type")]
    pub action_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub droplet_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<&'a str>,
}
