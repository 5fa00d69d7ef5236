//! DigitalOcean compute driver

mod error;
mod http;
mod provider;
mod types;

use std::sync::Arc;

use crate::connection::{BearerToken, Connection};
use crate::error::Result;
use crate::factory::{DriverClass, DriverModule};
use crate::poller::PollPolicy;
use crate::provider_keys;
use crate::providers::common::{connect, metadata};
use crate::traits::NodeDriver;
use crate::types::{DriverCredentials, DriverOptions, FieldType, ProviderMetadata};

pub(crate) const DO_API_BASE: &str = "https://api.digitalocean.com/v2";
/// DigitalOcean 列表接口单页最大条数
pub(crate) const MAX_PAGE_SIZE: u32 = 200;

pub const CLASS_NAME: &str = "DigitalOceanNodeDriver";

/// DigitalOcean droplets and block storage volumes (API v2, bearer token).
///
/// Power actions and volume attachments are asynchronous on the vendor side; the driver
/// waits for the resulting action using the poll settings from [`DriverOptions`].
pub struct DigitalOceanNodeDriver {
    pub(crate) conn: Connection,
    pub(crate) poll: PollPolicy,
}

impl DigitalOceanNodeDriver {
    pub fn new(api_token: String, options: &DriverOptions) -> Result<Self> {
        let signer = Arc::new(BearerToken(api_token));
        Ok(Self {
            conn: connect("digitalocean", DO_API_BASE, signer, options)?,
            poll: options.poll.policy(),
        })
    }

    pub fn metadata() -> ProviderMetadata {
        metadata(
            provider_keys::compute::DIGITAL_OCEAN,
            "DigitalOcean",
            "DigitalOcean droplets and block storage volumes",
            Some("https://www.digitalocean.com/"),
            &[("key", "API Token", FieldType::Password)],
        )
    }
}

/// Module table for `digitalocean`.
pub fn module() -> DriverModule {
    DriverModule::new().with_class(DriverClass::compute(
        CLASS_NAME,
        DigitalOceanNodeDriver::metadata(),
        |credentials: DriverCredentials, options: &DriverOptions| {
            let driver: Arc<dyn NodeDriver> =
                Arc::new(DigitalOceanNodeDriver::new(credentials.key, options)?);
            Ok(driver)
        },
    ))
}
