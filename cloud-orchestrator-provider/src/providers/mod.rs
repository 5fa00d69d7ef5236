//! Concrete driver implementations

/// Shared utilities used by driver implementations.
pub mod common;

#[cfg(feature = "cloudflare")]
pub mod cloudflare;
#[cfg(feature = "digitalocean")]
pub mod digitalocean;
#[cfg(feature = "dummy")]
pub mod dummy;
#[cfg(feature = "local-storage")]
pub mod local;
#[cfg(feature = "softlayer")]
pub mod softlayer;
