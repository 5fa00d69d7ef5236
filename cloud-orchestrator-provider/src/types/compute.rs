use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Extra;

/// Lifecycle state of a node, normalized across vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// Booted and reachable.
    Running,
    /// Boot in progress.
    Starting,
    /// Restart in progress.
    Rebooting,
    /// Shutdown in progress.
    Stopping,
    /// Powered off but still allocated.
    Stopped,
    /// Accepted by the vendor, not yet provisioned.
    Pending,
    /// Suspended by the vendor (billing, abuse, ...).
    Suspended,
    /// Destroyed or being destroyed.
    Terminated,
    /// Vendor reports an error state.
    Error,
    /// Paused (memory preserved).
    Paused,
    /// Resize or other reconfiguration in progress.
    Reconfiguring,
    /// Moving between hosts.
    Migrating,
    /// State could not be determined.
    Unknown,
}

impl NodeState {
    /// Whether the node has reached a state from which it will not become `Running` by itself.
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, Self::Terminated | Self::Error | Self::Suspended)
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Starting => "starting",
            Self::Rebooting => "rebooting",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Pending => "pending",
            Self::Suspended => "suspended",
            Self::Terminated => "terminated",
            Self::Error => "error",
            Self::Paused => "paused",
            Self::Reconfiguring => "reconfiguring",
            Self::Migrating => "migrating",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A virtual machine managed by a compute driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Vendor node identifier.
    pub id: String,
    /// Node name.
    pub name: String,
    /// Normalized state.
    pub state: NodeState,
    /// Publicly routable addresses.
    pub public_ips: Vec<String>,
    /// Private network addresses.
    pub private_ips: Vec<String>,
    /// Size identifier the node was created with, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Image identifier the node was created from, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// When the node was created, if known.
    #[serde(with = "crate::utils::datetime")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Vendor-specific attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// A hardware profile nodes can be created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSize {
    /// Vendor size identifier (e.g. `"s-1vcpu-1gb"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Memory in MiB.
    pub ram_mb: u64,
    /// Root disk in GiB.
    pub disk_gb: u64,
    /// Virtual CPU count.
    pub vcpus: u32,
    /// Hourly price in USD, when the vendor publishes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_hourly: Option<f64>,
    /// Vendor-specific attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// An operating system image nodes can boot from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeImage {
    /// Vendor image identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Vendor-specific attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// A region/datacenter nodes can be placed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLocation {
    /// Vendor location identifier (e.g. `"nyc3"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// ISO country code, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Vendor-specific attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// Request to create a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    /// Node name.
    pub name: String,
    /// Size identifier.
    pub size: String,
    /// Image identifier.
    pub image: String,
    /// Location identifier; vendor default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// SSH key identifiers or fingerprints to install.
    #[serde(default)]
    pub ssh_keys: Vec<String>,
    /// Vendor-specific request attributes, passed through verbatim.
    #[serde(default)]
    pub extra: Extra,
}

/// Lifecycle state of a block volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeState {
    /// Provisioning in progress.
    Creating,
    /// Ready and detached.
    Available,
    /// Attach in progress.
    Attaching,
    /// Attached to a node.
    InUse,
    /// Deletion in progress.
    Deleting,
    /// Vendor reports an error state.
    Error,
    /// State could not be determined.
    Unknown,
}

/// A block storage volume managed by a compute driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageVolume {
    /// Vendor volume identifier.
    pub id: String,
    /// Volume name.
    pub name: String,
    /// Size in GiB.
    pub size: u64,
    /// Normalized state.
    pub state: VolumeState,
    /// Vendor-specific attributes (attachments, region, filesystem, ...).
    #[serde(default)]
    pub extra: Extra,
}

/// Request to create a block volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolumeRequest {
    /// Volume name.
    pub name: String,
    /// Size in GiB.
    pub size: u64,
    /// Location identifier; vendor default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form description, when the vendor supports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
