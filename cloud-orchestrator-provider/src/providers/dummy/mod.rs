//! In-memory drivers for every family.
//!
//! They need no credentials and keep all state in the driver instance, which makes
//! them the reference implementation of the trait contracts and the default fixture
//! for registry and session tests.

mod autoscale;
mod compute;
mod dns;
mod storage;

use std::sync::Arc;

use crate::factory::{DriverClass, DriverModule};
use crate::provider_keys;
use crate::providers::common::metadata;
use crate::traits::{AutoScaleDriver, DnsDriver, NodeDriver, StorageDriver};
use crate::types::{DriverCredentials, DriverOptions, ProviderMetadata};

pub use autoscale::DummyAutoScaleDriver;
pub use compute::DummyNodeDriver;
pub use dns::DummyDnsDriver;
pub use storage::DummyStorageDriver;

const PROVIDER: &str = "dummy";

fn dummy_metadata(key: crate::types::ProviderKey, what: &str) -> ProviderMetadata {
    metadata(key, "Dummy", &format!("In-memory {what} driver"), None, &[])
}

/// Module table for `dummy`.
pub fn module() -> DriverModule {
    DriverModule::new()
        .with_class(DriverClass::compute(
            "DummyNodeDriver",
            dummy_metadata(provider_keys::compute::DUMMY, "compute"),
            |_: DriverCredentials, _: &DriverOptions| {
                let driver: Arc<dyn NodeDriver> = Arc::new(DummyNodeDriver::new());
                Ok(driver)
            },
        ))
        .with_class(DriverClass::storage(
            "DummyStorageDriver",
            dummy_metadata(provider_keys::storage::DUMMY, "object storage"),
            |_: DriverCredentials, _: &DriverOptions| {
                let driver: Arc<dyn StorageDriver> = Arc::new(DummyStorageDriver::new());
                Ok(driver)
            },
        ))
        .with_class(DriverClass::dns(
            "DummyDnsDriver",
            dummy_metadata(provider_keys::dns::DUMMY, "DNS"),
            |_: DriverCredentials, _: &DriverOptions| {
                let driver: Arc<dyn DnsDriver> = Arc::new(DummyDnsDriver::new());
                Ok(driver)
            },
        ))
        .with_class(DriverClass::autoscale(
            "DummyAutoScaleDriver",
            dummy_metadata(provider_keys::autoscale::DUMMY, "autoscale"),
            |_: DriverCredentials, _: &DriverOptions| {
                let driver: Arc<dyn AutoScaleDriver> = Arc::new(DummyAutoScaleDriver::new());
                Ok(driver)
            },
        ))
}
