//! SoftLayer autoscale driver

mod error;
mod http;
mod provider;
mod types;

use std::sync::Arc;

use crate::connection::{BasicAuth, Connection};
use crate::error::Result;
use crate::factory::{DriverClass, DriverModule};
use crate::poller::PollPolicy;
use crate::provider_keys;
use crate::providers::common::{connect, metadata, require_secret};
use crate::traits::AutoScaleDriver;
use crate::types::{DriverCredentials, DriverOptions, FieldType, ProviderMetadata};

pub(crate) const SL_API_BASE: &str = "https://api.softlayer.com/rest/v3.1";

pub const CLASS_NAME: &str = "SoftlayerAutoScaleDriver";

/// SoftLayer scale groups and policies (REST, HTTP basic auth with user name and API key).
pub struct SoftlayerAutoScaleDriver {
    pub(crate) conn: Connection,
    pub(crate) poll: PollPolicy,
}

impl SoftlayerAutoScaleDriver {
    pub fn new(username: String, api_key: String, options: &DriverOptions) -> Result<Self> {
        let signer = Arc::new(BasicAuth {
            username,
            password: api_key,
        });
        Ok(Self {
            conn: connect("softlayer", SL_API_BASE, signer, options)?,
            poll: options.poll.policy(),
        })
    }

    pub fn metadata() -> ProviderMetadata {
        metadata(
            provider_keys::autoscale::SOFTLAYER,
            "SoftLayer",
            "IBM Cloud (SoftLayer) auto scale groups",
            Some("https://cloud.ibm.com/"),
            &[
                ("key", "Username", FieldType::Text),
                ("secret", "API Key", FieldType::Password),
            ],
        )
    }
}

/// Module table for `softlayer`.
pub fn module() -> DriverModule {
    DriverModule::new().with_class(DriverClass::autoscale(
        CLASS_NAME,
        SoftlayerAutoScaleDriver::metadata(),
        |credentials: DriverCredentials, options: &DriverOptions| {
            let api_key = require_secret("softlayer", credentials.secret)?;
            let driver: Arc<dyn AutoScaleDriver> = Arc::new(SoftlayerAutoScaleDriver::new(
                credentials.key,
                api_key,
                options,
            )?);
            Ok(driver)
        },
    ))
}
