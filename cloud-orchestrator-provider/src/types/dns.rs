use serde::{Deserialize, Serialize};

use super::Extra;

/// Whether the zone is authoritative here or replicated from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    /// Records are managed through this driver.
    #[default]
    Master,
    /// Records are transferred from an external primary.
    Slave,
}

/// DNS record type.
///
/// Serialized as uppercase strings (`"A"`, `"AAAA"`, `"CNAME"`, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical name (alias) record.
    Cname,
    /// Mail exchange record.
    Mx,
    /// Text record.
    Txt,
    /// Name server record.
    Ns,
    /// Service locator record.
    Srv,
    /// Certificate Authority Authorization record.
    Caa,
    /// Reverse pointer record.
    Ptr,
    /// Start of authority record.
    Soa,
}

impl RecordType {
    /// Uppercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ns => "NS",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
            Self::Ptr => "PTR",
            Self::Soa => "SOA",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Vendor zone identifier.
    pub id: String,
    /// Domain name (e.g. `"example.com"`).
    pub domain: String,
    /// Master or slave.
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    /// Default TTL in seconds, if the vendor exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Vendor-specific attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// A DNS record inside a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Vendor record identifier.
    pub id: String,
    /// Zone the record belongs to.
    pub zone_id: String,
    /// Name relative to the zone (`"www"`, `"@"` for the apex).
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record value (address, target, text, ...).
    pub data: String,
    /// TTL in seconds, if set on the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Vendor-specific attributes (priority, proxied, ...).
    #[serde(default)]
    pub extra: Extra,
}

/// Query parameters for record listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQueryParams {
    /// Page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
    /// Optional keyword matched against record names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Optional record type filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
}

impl Default for RecordQueryParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            keyword: None,
            record_type: None,
        }
    }
}

impl RecordQueryParams {
    /// Convert to basic [`PaginationParams`](super::PaginationParams), discarding filters.
    pub fn to_pagination(&self) -> super::PaginationParams {
        super::PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// Whether a record passes the keyword and type filters.
    pub fn matches(&self, record: &Record) -> bool {
        let type_ok = self.record_type.is_none_or(|t| t == record.record_type);
        let keyword_ok = self
            .keyword
            .as_deref()
            .filter(|k| !k.is_empty())
            .is_none_or(|k| record.name.contains(k));
        type_ok && keyword_ok
    }
}

/// Request to create a zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneRequest {
    /// Domain name.
    pub domain: String,
    /// Master or slave.
    #[serde(default)]
    pub zone_type: ZoneType,
    /// Default TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Vendor-specific request attributes.
    #[serde(default)]
    pub extra: Extra,
}

/// Request to create a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    /// Zone to create the record in.
    pub zone_id: String,
    /// Name relative to the zone.
    pub name: String,
    /// Record type.
    pub record_type: RecordType,
    /// Record value.
    pub data: String,
    /// TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Vendor-specific request attributes (priority, proxied, ...).
    #[serde(default)]
    pub extra: Extra,
}

/// Request to update an existing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    /// Zone the record belongs to.
    pub zone_id: String,
    /// New name relative to the zone.
    pub name: String,
    /// New record type.
    pub record_type: RecordType,
    /// New record value.
    pub data: String,
    /// New TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Vendor-specific request attributes.
    #[serde(default)]
    pub extra: Extra,
}

// ============ Batch Operation Types ============

/// Result of a batch create operation.
///
/// Contains both successfully created records and any per-record failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResult {
    /// Number of records successfully created.
    pub success_count: usize,
    /// Number of records that failed to create.
    pub failed_count: usize,
    /// Successfully created records.
    pub created_records: Vec<Record>,
    /// Details about each failed creation.
    pub failures: Vec<BatchCreateFailure>,
}

/// Information about a single failed record creation in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateFailure {
    /// Index of the failed request in the original request slice.
    pub request_index: usize,
    /// Name of the record that failed.
    pub record_name: String,
    /// Human-readable reason for the failure.
    pub reason: String,
}
