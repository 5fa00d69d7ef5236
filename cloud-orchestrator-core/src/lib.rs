//! Cloud Orchestrator Core Library
//!
//! Turns provider keys into live drivers:
//! - [`DriverRegistry`]: key → `(module locator, class name)`, lazy module loading,
//!   runtime registration with last-write-wins semantics
//! - [`SessionManager`]: one driver instance per caller session
//!
//! ```rust,no_run
//! use cloud_orchestrator_core::DriverRegistry;
//! use cloud_orchestrator_provider::{provider_keys, DriverCredentials, DriverOptions};
//!
//! # async fn example() -> cloud_orchestrator_core::CoreResult<()> {
//! let registry = DriverRegistry::with_defaults();
//! let dns = registry
//!     .create_dns_driver(
//!         &provider_keys::dns::CLOUDFLARE,
//!         DriverCredentials::new("your-token"),
//!         &DriverOptions::default(),
//!     )
//!     .await?;
//! let zones = dns.list_zones(&Default::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod registry;
pub mod session;
pub mod table;

// Re-export common types
pub use error::{CoreError, CoreResult, DriverLoadError};
pub use registry::{DriverRegistry, RegisteredProvider};
pub use session::{InMemorySessionStore, SessionInfo, SessionManager, SessionStore};
pub use table::{DriverEntry, DEFAULT_DRIVERS};
