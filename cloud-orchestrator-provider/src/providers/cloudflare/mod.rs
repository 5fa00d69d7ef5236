//! Cloudflare DNS driver

mod error;
mod http;
mod provider;
mod types;

use std::sync::Arc;

use crate::connection::{BearerToken, Connection};
use crate::error::Result;
use crate::factory::{DriverClass, DriverModule};
use crate::provider_keys;
use crate::providers::common::{connect, metadata};
use crate::traits::DnsDriver;
use crate::types::{DriverCredentials, DriverOptions, FieldType, ProviderMetadata};

pub(crate) use types::{CfRecord, CfEnvelope, CfZone};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Cloudflare Zones API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE_ZONES: u32 = 50;
/// Cloudflare DNS Records API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 100;

pub const CLASS_NAME: &str = "CloudflareDnsDriver";

/// Cloudflare DNS driver (API v4, bearer token).
pub struct CloudflareDnsDriver {
    pub(crate) conn: Connection,
}

impl CloudflareDnsDriver {
    pub fn new(api_token: String, options: &DriverOptions) -> Result<Self> {
        let signer = Arc::new(BearerToken(api_token));
        Ok(Self {
            conn: connect("cloudflare", CF_API_BASE, signer, options)?,
        })
    }

    pub fn metadata() -> ProviderMetadata {
        metadata(
            provider_keys::dns::CLOUDFLARE,
            "Cloudflare",
            "Cloudflare DNS zones and records",
            Some("https://www.cloudflare.com/"),
            &[("key", "API Token", FieldType::Password)],
        )
    }
}

/// Module table for `cloudflare`.
pub fn module() -> DriverModule {
    DriverModule::new().with_class(DriverClass::dns(
        CLASS_NAME,
        CloudflareDnsDriver::metadata(),
        |credentials: DriverCredentials, options: &DriverOptions| {
            let driver: Arc<dyn DnsDriver> =
                Arc::new(CloudflareDnsDriver::new(credentials.key, options)?);
            Ok(driver)
        },
    ))
}
