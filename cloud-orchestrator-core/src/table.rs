//! Default key → driver table loaded by [`DriverRegistry::with_defaults`](crate::DriverRegistry::with_defaults).

use cloud_orchestrator_provider::provider_keys::{autoscale, compute, dns, locators, storage};
use cloud_orchestrator_provider::ProviderKey;

/// One static registry row: key, module locator, class name.
pub type DriverEntry = (ProviderKey, &'static str, &'static str);

/// Every driver shipped with `cloud-orchestrator-provider`.
///
/// Rows for drivers compiled out by feature flags stay registered; resolving them
/// fails with a module load error naming the locator.
pub const DEFAULT_DRIVERS: &[DriverEntry] = &[
    (compute::DUMMY, locators::DUMMY, "DummyNodeDriver"),
    (
        compute::DIGITAL_OCEAN,
        locators::DIGITAL_OCEAN,
        "DigitalOceanNodeDriver",
    ),
    (storage::DUMMY, locators::DUMMY, "DummyStorageDriver"),
    (storage::LOCAL, locators::LOCAL_STORAGE, "LocalStorageDriver"),
    (dns::DUMMY, locators::DUMMY, "DummyDnsDriver"),
    (dns::CLOUDFLARE, locators::CLOUDFLARE, "CloudflareDnsDriver"),
    (autoscale::DUMMY, locators::DUMMY, "DummyAutoScaleDriver"),
    (
        autoscale::SOFTLAYER,
        locators::SOFTLAYER,
        "SoftlayerAutoScaleDriver",
    ),
];
