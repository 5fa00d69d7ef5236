//! Built-in provider keys, grouped per driver family.
//!
//! New keys may be added; existing ones never change meaning.

use crate::types::{DriverFamily, ProviderKey};

pub mod compute {
    use super::{DriverFamily, ProviderKey};

    pub const DUMMY: ProviderKey = ProviderKey::from_static(DriverFamily::Compute, "dummy");
    pub const DIGITAL_OCEAN: ProviderKey =
        ProviderKey::from_static(DriverFamily::Compute, "digitalocean");
}

pub mod storage {
    use super::{DriverFamily, ProviderKey};

    pub const DUMMY: ProviderKey = ProviderKey::from_static(DriverFamily::Storage, "dummy");
    pub const LOCAL: ProviderKey = ProviderKey::from_static(DriverFamily::Storage, "local");
}

pub mod dns {
    use super::{DriverFamily, ProviderKey};

    pub const DUMMY: ProviderKey = ProviderKey::from_static(DriverFamily::Dns, "dummy");
    pub const CLOUDFLARE: ProviderKey = ProviderKey::from_static(DriverFamily::Dns, "cloudflare");
}

pub mod autoscale {
    use super::{DriverFamily, ProviderKey};

    pub const DUMMY: ProviderKey = ProviderKey::from_static(DriverFamily::AutoScale, "dummy");
    pub const SOFTLAYER: ProviderKey =
        ProviderKey::from_static(DriverFamily::AutoScale, "softlayer");
}

/// Module locators of the drivers shipped with this crate.
pub mod locators {
    pub const DUMMY: &str = "cloud_orchestrator_provider::providers::dummy";
    pub const DIGITAL_OCEAN: &str = "cloud_orchestrator_provider::providers::digitalocean";
    pub const LOCAL_STORAGE: &str = "cloud_orchestrator_provider::providers::local";
    pub const CLOUDFLARE: &str = "cloud_orchestrator_provider::providers::cloudflare";
    pub const SOFTLAYER: &str = "cloud_orchestrator_provider::providers::softlayer";
}
