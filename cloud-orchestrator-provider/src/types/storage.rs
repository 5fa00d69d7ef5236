use serde::{Deserialize, Serialize};

use super::Extra;

/// A bucket/container holding objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name, unique per account.
    pub name: String,
    /// Vendor-specific attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// An object stored in a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Object name (may contain `/`).
    pub name: String,
    /// Name of the container holding the object.
    pub container: String,
    /// Size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the content, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Vendor-specific attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// Handle of an in-progress multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartUpload {
    /// Vendor upload identifier.
    pub id: String,
    /// Target container.
    pub container: String,
    /// Target object name.
    pub object_name: String,
}

/// Receipt for one uploaded part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPart {
    /// 1-based part number.
    pub part_number: u32,
    /// Size of the part in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the part.
    pub hash: String,
}
