//! # cloud-orchestrator-provider
//!
//! Uniform driver interfaces over independent cloud vendors: compute, object storage,
//! DNS and autoscaling. Each concrete driver translates generic operations into one
//! vendor's protocol, handles its authentication and maps its payloads back into the
//! shared domain types ([`Node`], [`StorageVolume`], [`Zone`], [`Record`],
//! [`AutoScaleGroup`]).
//!
//! ## Bundled Drivers
//!
//! | Key | Class | Feature Flag | Auth Method |
//! |-----|-------|-------------|-------------|
//! | `compute:dummy`, `storage:dummy`, `dns:dummy`, `autoscale:dummy` | `Dummy*Driver` | `dummy` | none |
//! | `compute:digitalocean` | `DigitalOceanNodeDriver` | `digitalocean` | Bearer Token |
//! | `storage:local` | `LocalStorageDriver` | `local-storage` | none (root directory) |
//! | `dns:cloudflare` | `CloudflareDnsDriver` | `cloudflare` | Bearer Token |
//! | `autoscale:softlayer` | `SoftlayerAutoScaleDriver` | `softlayer` | HTTP Basic |
//!
//! ## Feature Flags
//!
//! - **`all-providers`** *(default)*: enable every bundled driver.
//! - **`native-tls`** *(default)* / **`rustls`**: TLS backend for the HTTP drivers.
//!
//! ## Building blocks
//!
//! - [`Connection`]: signs requests, retries rate limits and transport failures, follows
//!   redirects and turns failures into typed [`ProviderError`]s.
//! - [`poller`]: waits on asynchronous vendor operations until a terminal [`PollOutcome`].
//! - [`pool`]: bounded fan-out used by multipart upload.
//! - [`DriverModule`] / [`DriverClass`]: what a driver registry resolves keys to.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cloud_orchestrator_provider::{builtin_modules, provider_keys, DriverCredentials, DriverOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (_, load) = builtin_modules()
//!     .into_iter()
//!     .find(|(locator, _)| *locator == provider_keys::locators::CLOUDFLARE)
//!     .ok_or("cloudflare driver not compiled in")?;
//! let module = load()?;
//! let class = module.class("CloudflareDnsDriver").ok_or("missing class")?;
//! let driver = class
//!     .instantiate(DriverCredentials::new("your-token"), &DriverOptions::default())?
//!     .into_dns()
//!     .ok_or("not a DNS driver")?;
//! let zones = driver.list_zones(&Default::default()).await?;
//! for zone in &zones.items {
//!     println!("{} ({})", zone.domain, zone.id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Most applications go through the registry in `cloud-orchestrator-core` instead.
//!
//! ## Error Handling
//!
//! All driver operations return [`Result<T, ProviderError>`](ProviderError).
//! Transient errors (`NetworkError`, `Timeout`, `RateLimited`) are retried by the
//! connection with bounded exponential backoff; everything else surfaces with the
//! vendor's code and message.

pub mod connection;
mod error;
mod factory;
pub mod poller;
pub mod pool;
pub mod provider_keys;
mod providers;
mod traits;
mod types;
mod utils;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export factory
pub use factory::{
    Driver, DriverClass, DriverConstructor, DriverModule, ModuleLoader, builtin_modules,
    get_all_provider_metadata,
};

// Re-export driver traits (internal traits are not exported)
pub use traits::{AutoScaleDriver, DnsDriver, NodeDriver, ProviderDriver, StorageDriver};

pub use connection::{ConnectionConfig, HttpRequest, HttpResponse, Transport};
pub use poller::{PollOptions, PollOutcome, PollPolicy};
pub use pool::WorkerPoolConfig;

// Re-export types
pub use types::{
    AutoScaleAdjustmentType, AutoScaleGroup, AutoScalePolicy, AutoScaleTerminationPolicy,
    BatchCreateFailure, BatchCreateResult, Container, CreateAutoScaleGroupRequest,
    CreateAutoScalePolicyRequest, CreateNodeRequest, CreateRecordRequest, CreateVolumeRequest,
    CreateZoneRequest, CredentialValidationError, DriverCredentials, DriverFamily, DriverOptions,
    Extra, FieldType, MultipartUpload, Node, NodeImage, NodeLocation, NodeSize, NodeState,
    PaginatedResponse, PaginationParams, ProviderCredentialField, ProviderKey, ProviderMetadata,
    Record, RecordQueryParams, RecordType, StorageVolume, StoredObject, UpdateRecordRequest,
    UploadedPart, VolumeState, Zone, ZoneType,
};

// Re-export utils module
pub use utils::datetime;

// Re-export concrete drivers (behind feature flags)
#[cfg(feature = "dummy")]
pub use providers::dummy::{
    DummyAutoScaleDriver, DummyDnsDriver, DummyNodeDriver, DummyStorageDriver,
};

#[cfg(feature = "digitalocean")]
pub use providers::digitalocean::DigitalOceanNodeDriver;

#[cfg(feature = "local-storage")]
pub use providers::local::LocalStorageDriver;

#[cfg(feature = "cloudflare")]
pub use providers::cloudflare::CloudflareDnsDriver;

#[cfg(feature = "softlayer")]
pub use providers::softlayer::SoftlayerAutoScaleDriver;
