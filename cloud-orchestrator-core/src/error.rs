//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

use cloud_orchestrator_provider::{DriverFamily, ProviderKey};

// Re-export library error type
pub use cloud_orchestrator_provider::{CredentialValidationError, ProviderError};

/// A registered key whose driver could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum DriverLoadError {
    /// The module locator has no loader, or its loader failed.
    #[error("Cannot load driver module '{locator}': {reason}")]
    ModuleLoad { locator: String, reason: String },

    /// The module loaded but has no class with that name.
    #[error("Driver module '{locator}' has no class '{class_name}'")]
    ClassNotFound { locator: String, class_name: String },
}

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// No registry entry for this key
    #[error("Provider not found: {0}")]
    ProviderNotFound(ProviderKey),

    /// Entry exists but resolution failed
    #[error("{0}")]
    DriverLoad(#[from] DriverLoadError),

    /// The key or class belongs to another driver family than the one asked for
    #[error("Provider {key} is a {actual} driver, expected {expected}")]
    FamilyMismatch {
        key: ProviderKey,
        expected: DriverFamily,
        actual: DriverFamily,
    },

    /// No open driver session with this id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ProviderNotFound(_) | Self::FamilyMismatch { .. } | Self::SessionNotFound(_) => {
                true
            }
            Self::Provider(e) => e.is_expected(),
            Self::DriverLoad(_) => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
