//! Provider 公共工具函数

use std::borrow::Cow;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::connection::{Connection, RequestSigner};
use crate::error::{ProviderError, Result};
use crate::types::{
    DriverOptions, FieldType, ProviderCredentialField, ProviderKey, ProviderMetadata,
    RecordType,
};

// ============ Connection ============

/// 创建 Connection，`options.host` 优先于默认 API 地址
pub fn connect(
    provider: &'static str,
    default_base: &str,
    signer: Arc<dyn RequestSigner>,
    options: &DriverOptions,
) -> Result<Connection> {
    let base = options.host.as_deref().unwrap_or(default_base);
    Connection::new(provider, base, signer, options.connection.clone())
}

/// 取出必需的 secret 字段
pub fn require_secret(provider: &str, secret: Option<String>) -> Result<String> {
    secret
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ProviderError::InvalidParameter {
            provider: provider.to_string(),
            param: "secret".to_string(),
            detail: "this driver needs a secret".to_string(),
        })
}

// ============ Metadata ============

pub fn metadata(
    key: ProviderKey,
    name: &str,
    description: &str,
    website: Option<&str>,
    fields: &[(&str, &str, FieldType)],
) -> ProviderMetadata {
    ProviderMetadata {
        key,
        name: name.to_string(),
        description: description.to_string(),
        website: website.map(str::to_string),
        required_fields: fields
            .iter()
            .map(|(k, label, ty)| ProviderCredentialField::new(k, label, ty.clone()))
            .collect(),
    }
}

/// 转义调用方传入的 id，用作 URL 路径段
pub fn path_segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

/// 十六进制 SHA-256
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// ============ 记录类型转换 ============

/// 将字符串转换为 `RecordType`
pub fn parse_record_type(record_type: &str, provider: &str) -> Result<RecordType> {
    match record_type.to_uppercase().as_str() {
        "A" => Ok(RecordType::A),
        "AAAA" => Ok(RecordType::Aaaa),
        "CNAME" => Ok(RecordType::Cname),
        "MX" => Ok(RecordType::Mx),
        "TXT" => Ok(RecordType::Txt),
        "NS" => Ok(RecordType::Ns),
        "SRV" => Ok(RecordType::Srv),
        "CAA" => Ok(RecordType::Caa),
        "PTR" => Ok(RecordType::Ptr),
        "SOA" => Ok(RecordType::Soa),
        _ => Err(ProviderError::InvalidParameter {
            provider: provider.to_string(),
            param: "record_type".to_string(),
            detail: format!("unsupported record type: {record_type}"),
        }),
    }
}

// ============ 域名名称处理 ============

/// 去掉域名末尾的点
pub fn normalize_domain_name(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// 将完整域名转换为相对名称
/// 如: "www.example.com" + "example.com" -> "www"
/// 如: "example.com" + "example.com" -> "@"
pub fn full_name_to_relative(full_name: &str, zone_name: &str) -> String {
    let full = normalize_domain_name(full_name);
    let zone = normalize_domain_name(zone_name);

    if full == zone {
        "@".to_string()
    } else if let Some(subdomain) = full.strip_suffix(&format!(".{zone}")) {
        subdomain.to_string()
    } else {
        full
    }
}

/// 将相对名称转换为完整域名
/// 如: "www" + "example.com" -> "www.example.com"
/// 如: "@" + "example.com" -> "example.com"
pub fn relative_to_full_name(relative_name: &str, zone_name: &str) -> String {
    let zone = normalize_domain_name(zone_name);

    if relative_name == "@" || relative_name.is_empty() {
        zone
    } else {
        format!("{relative_name}.{zone}")
    }
}
