//! Domain types shared by every driver family.

mod autoscale;
mod compute;
mod dns;
mod storage;

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use autoscale::{
    AutoScaleAdjustmentType, AutoScaleGroup, AutoScalePolicy, AutoScaleTerminationPolicy,
    CreateAutoScaleGroupRequest, CreateAutoScalePolicyRequest,
};
pub use compute::{
    CreateNodeRequest, CreateVolumeRequest, Node, NodeImage, NodeLocation, NodeSize, NodeState,
    StorageVolume, VolumeState,
};
pub use dns::{
    BatchCreateFailure, BatchCreateResult, CreateRecordRequest, CreateZoneRequest, Record,
    RecordQueryParams, RecordType, UpdateRecordRequest, Zone, ZoneType,
};
pub use storage::{Container, MultipartUpload, StoredObject, UploadedPart};

use crate::connection::ConnectionConfig;
use crate::poller::PollOptions;
use crate::pool::WorkerPoolConfig;

/// Vendor-specific attributes with no cross-vendor representation.
pub type Extra = serde_json::Map<String, serde_json::Value>;

// ============ Pagination ============

/// Pagination parameters for list operations.
///
/// Pages are 1-indexed. The default is `page = 1, page_size = 20`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl PaginationParams {
    /// Clamp pagination values to valid ranges.
    ///
    /// - `page` is clamped to `>= 1`
    /// - `page_size` is clamped to `1..=max_page_size`
    #[must_use]
    pub fn validated(&self, max_page_size: u32) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max_page_size),
        }
    }

    /// Zero-based offset of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

/// A paginated response wrapper returned by list operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Items in the current page.
    pub items: Vec<T>,
    /// Current page number.
    pub page: u32,
    /// Page size used for this request.
    pub page_size: u32,
    /// Total number of items across all pages.
    pub total_count: u32,
    /// Whether there are more pages after this one.
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response, automatically computing [`has_more`](Self::has_more).
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total_count: u32) -> Self {
        let has_more = page.saturating_mul(page_size) < total_count;
        Self {
            items,
            page,
            page_size,
            total_count,
            has_more,
        }
    }

    /// Slice one page out of a fully materialized list (in-memory drivers).
    pub fn from_full_list(all: Vec<T>, params: &PaginationParams) -> Self {
        let total_count = u32::try_from(all.len()).unwrap_or(u32::MAX);
        let items = all
            .into_iter()
            .skip(params.offset())
            .take(params.page_size as usize)
            .collect();
        Self::new(items, params.page, params.page_size, total_count)
    }
}

// ============ Provider identity ============

/// The service family a driver belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverFamily {
    /// Virtual machines and block volumes.
    Compute,
    /// Object storage.
    Storage,
    /// Hosted DNS.
    Dns,
    /// Autoscaling groups and policies.
    #[serde(rename = "autoscale")]
    AutoScale,
}

impl DriverFamily {
    /// Lowercase identifier used in provider keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Storage => "storage",
            Self::Dns => "dns",
            Self::AutoScale => "autoscale",
        }
    }
}

impl std::fmt::Display for DriverFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DriverFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compute" => Ok(Self::Compute),
            "storage" => Ok(Self::Storage),
            "dns" => Ok(Self::Dns),
            "autoscale" => Ok(Self::AutoScale),
            other => Err(format!("unknown driver family: {other}")),
        }
    }
}

/// Opaque identifier naming one vendor+service combination.
///
/// Keys are compared by equality and displayed as `family:name`
/// (for example `dns:cloudflare`). Built-in keys live in [`provider_keys`](crate::provider_keys);
/// plugins build their own with [`ProviderKey::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderKey {
    family: DriverFamily,
    name: Cow<'static, str>,
}

impl ProviderKey {
    /// Build a key from a static name, usable in `const` context.
    pub const fn from_static(family: DriverFamily, name: &'static str) -> Self {
        Self {
            family,
            name: Cow::Borrowed(name),
        }
    }

    /// Build a key with an owned name.
    pub fn new(family: DriverFamily, name: impl Into<String>) -> Self {
        Self {
            family,
            name: Cow::Owned(name.into()),
        }
    }

    /// Service family of this key.
    pub fn family(&self) -> DriverFamily {
        self.family
    }

    /// Vendor name part of this key.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.family, self.name)
    }
}

impl std::str::FromStr for ProviderKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (family, name) = s
            .split_once(':')
            .ok_or_else(|| format!("provider key must look like 'family:name', got '{s}'"))?;
        if name.is_empty() {
            return Err(format!("provider key '{s}' has an empty name"));
        }
        Ok(Self::new(family.parse()?, name))
    }
}

// ============ Provider Metadata Types ============

/// The input type of a credential field (affects UI rendering).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Plain text input.
    Text,
    /// Masked/password input.
    Password,
}

/// Definition of a single credential field required by a driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentialField {
    /// Machine-readable field key: `"key"` or `"secret"`.
    pub key: String,
    /// Human-readable label (e.g., `"API Token"`).
    pub label: String,
    /// Input type for UI rendering.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Optional help/description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl ProviderCredentialField {
    pub(crate) fn new(key: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            field_type,
            help_text: None,
        }
    }
}

/// Static metadata describing a driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    /// Provider key this driver is registered under by default.
    pub key: ProviderKey,
    /// Human-readable provider name.
    pub name: String,
    /// Short description of the driver.
    pub description: String,
    /// Vendor website.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Credential fields required to authenticate with this vendor.
    pub required_fields: Vec<ProviderCredentialField>,
}

// ============ Credential Types ============

/// Validation error for driver credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialValidationError {
    /// A required credential field is missing entirely.
    MissingField {
        /// Which provider the error relates to.
        provider: ProviderKey,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A credential field is present but empty/whitespace-only.
    EmptyField {
        /// Which provider the error relates to.
        provider: ProviderKey,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
}

impl std::fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { label, .. } => write!(f, "Missing required field: {label}"),
            Self::EmptyField { label, .. } => write!(f, "Field must not be empty: {label}"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Credentials handed to a driver constructor.
///
/// `key` is the API token, user name or access key depending on the vendor;
/// `secret` is the matching secret when the vendor needs one. The local storage
/// driver takes its root directory as `key`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DriverCredentials {
    /// Primary credential.
    pub key: String,
    /// Secondary credential, if the vendor uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl std::fmt::Debug for DriverCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverCredentials")
            .field("key", &"***")
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .finish()
    }
}

impl DriverCredentials {
    /// Credentials consisting of a single key/token.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: None,
        }
    }

    /// Credentials consisting of a key and a secret.
    pub fn with_secret(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: Some(secret.into()),
        }
    }

    /// Construct credentials from a flat map, validating the fields the driver requires.
    pub fn from_map(
        metadata: &ProviderMetadata,
        map: &HashMap<String, String>,
    ) -> Result<Self, CredentialValidationError> {
        for field in &metadata.required_fields {
            match map.get(&field.key) {
                None => {
                    return Err(CredentialValidationError::MissingField {
                        provider: metadata.key.clone(),
                        field: field.key.clone(),
                        label: field.label.clone(),
                    });
                }
                Some(v) if v.trim().is_empty() => {
                    return Err(CredentialValidationError::EmptyField {
                        provider: metadata.key.clone(),
                        field: field.key.clone(),
                        label: field.label.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            key: map.get("key").cloned().unwrap_or_default(),
            secret: map.get("secret").cloned(),
        })
    }

    /// Convert credentials to a flat map for key-value storage.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::from([("key".to_string(), self.key.clone())]);
        if let Some(secret) = &self.secret {
            map.insert("secret".to_string(), secret.clone());
        }
        map
    }
}

// ============ Driver options ============

/// Runtime configuration handed to a driver constructor.
///
/// Every field has a default, so applications can embed this struct in their
/// own configuration files and only override what they need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverOptions {
    /// Override the vendor API base URL (e.g. `http://127.0.0.1:8080` for tests or proxies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// HTTP timeouts and retry bounds.
    pub connection: ConnectionConfig,
    /// Interval/timeout used when waiting on asynchronous vendor operations.
    pub poll: PollOptions,
    /// Worker pool used by fan-out helpers such as multipart upload.
    pub pool: WorkerPoolConfig,
}

impl DriverOptions {
    /// Options pointing at a custom API host, everything else default.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            key: ProviderKey::from_static(DriverFamily::AutoScale, "softlayer"),
            name: "SoftLayer".to_string(),
            description: String::new(),
            website: None,
            required_fields: vec![
                ProviderCredentialField::new("key", "Username", FieldType::Text),
                ProviderCredentialField::new("secret", "API Key", FieldType::Password),
            ],
        }
    }

    #[test]
    fn provider_key_display_and_parse() {
        let key = ProviderKey::from_static(DriverFamily::Dns, "cloudflare");
        assert_eq!(key.to_string(), "dns:cloudflare");
        let parsed: ProviderKey = "dns:cloudflare".parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn provider_key_static_and_owned_compare_equal() {
        let a = ProviderKey::from_static(DriverFamily::Compute, "dummy");
        let b = ProviderKey::new(DriverFamily::Compute, "dummy".to_string());
        assert_eq!(a, b);
        assert_ne!(a, ProviderKey::from_static(DriverFamily::Dns, "dummy"));
    }

    #[test]
    fn provider_key_parse_rejects_garbage() {
        assert!("cloudflare".parse::<ProviderKey>().is_err());
        assert!("dns:".parse::<ProviderKey>().is_err());
        assert!("blob:s3".parse::<ProviderKey>().is_err());
    }

    #[test]
    fn credentials_roundtrip_through_map() {
        let map: HashMap<String, String> = [
            ("key".to_string(), "user".to_string()),
            ("secret".to_string(), "api-key".to_string()),
        ]
        .into();
        let res = DriverCredentials::from_map(&metadata(), &map);
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(cred) = res else {
            return;
        };
        assert_eq!(cred.key, "user");
        assert_eq!(cred.secret.as_deref(), Some("api-key"));
        assert_eq!(cred.to_map(), map);
    }

    #[test]
    fn credentials_missing_field() {
        let map: HashMap<String, String> = [("key".to_string(), "user".to_string())].into();
        let res = DriverCredentials::from_map(&metadata(), &map);
        assert!(
            matches!(&res, Err(CredentialValidationError::MissingField { field, .. }) if field == "secret"),
            "unexpected result: {res:?}"
        );
    }

    #[test]
    fn credentials_empty_field() {
        let map: HashMap<String, String> = [
            ("key".to_string(), "  ".to_string()),
            ("secret".to_string(), "x".to_string()),
        ]
        .into();
        let res = DriverCredentials::from_map(&metadata(), &map);
        assert!(
            matches!(&res, Err(CredentialValidationError::EmptyField { .. })),
            "unexpected result: {res:?}"
        );
    }

    #[test]
    fn credentials_debug_hides_values() {
        let cred = DriverCredentials::with_secret("user", "hunter2");
        let dbg = format!("{cred:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("user"));
    }

    #[test]
    fn paginated_response_has_more() {
        let resp = PaginatedResponse::new(vec![1, 2, 3], 1, 3, 10);
        assert!(resp.has_more);
        assert_eq!(resp.total_count, 10);
    }

    #[test]
    fn paginated_response_no_more() {
        let resp = PaginatedResponse::new(vec![1, 2], 2, 3, 5);
        assert!(!resp.has_more);
    }

    #[test]
    fn paginated_response_from_full_list_slices_page() {
        let params = PaginationParams {
            page: 2,
            page_size: 2,
        };
        let resp = PaginatedResponse::from_full_list(vec![1, 2, 3, 4, 5], &params);
        assert_eq!(resp.items, vec![3, 4]);
        assert_eq!(resp.total_count, 5);
        assert!(resp.has_more);
    }

    #[test]
    fn pagination_validated_clamps() {
        let p = PaginationParams {
            page: 0,
            page_size: 500,
        }
        .validated(100);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 100);
    }

    #[test]
    fn driver_options_deserialize_with_defaults() {
        let opts: DriverOptions =
            serde_json::from_str(r#"{"host":"http://localhost:9000","poll":{"intervalSecs":1}}"#)
                .unwrap();
        assert_eq!(opts.host.as_deref(), Some("http://localhost:9000"));
        assert_eq!(opts.poll.interval_secs, 1);
        assert_eq!(opts.poll.timeout_secs, PollOptions::default().timeout_secs);
        assert_eq!(opts.connection.max_retries, 5);
    }
}
