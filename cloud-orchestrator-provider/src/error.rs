use serde::{Deserialize, Serialize};

/// Unified error type for all driver operations.
///
/// Each variant includes a `provider` field identifying which driver produced the error,
/// plus variant-specific context. All variants are serializable for structured error reporting.
///
/// # Retryable Errors
///
/// The following variants represent transient failures that may succeed on retry:
/// - [`NetworkError`](Self::NetworkError): network connectivity issues
/// - [`Timeout`](Self::Timeout): request timed out
/// - [`RateLimited`](Self::RateLimited): API rate limit exceeded
///
/// The connection layer retries these a bounded number of times before surfacing them.
/// The operation poller never retries anything itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    ///
    /// This is a transient error and is automatically retried.
    NetworkError {
        /// Driver that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    ///
    /// This is a transient error and is automatically retried.
    Timeout {
        /// Driver that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The provided credentials are invalid or expired.
    InvalidCredentials {
        /// Driver that produced the error.
        provider: String,
        /// Original error message from the vendor API, if available.
        raw_message: Option<String>,
    },

    /// The authenticated user lacks permission for the requested operation.
    PermissionDenied {
        /// Driver that produced the error.
        provider: String,
        /// Original error message from the vendor API, if available.
        raw_message: Option<String>,
    },

    /// The API rate limit has been exceeded (HTTP 429 or equivalent).
    ///
    /// Unlike [`QuotaExceeded`](Self::QuotaExceeded), the request should succeed after waiting.
    /// Surfaces to callers only once the connection's retry bound is exhausted.
    RateLimited {
        /// Driver that produced the error.
        provider: String,
        /// Suggested wait time in seconds before retrying, if provided by the API.
        retry_after: Option<u64>,
        /// Original error message from the vendor API, if available.
        raw_message: Option<String>,
    },

    /// The vendor kept redirecting past the connection's redirect bound.
    TooManyRedirects {
        /// Driver that produced the error.
        provider: String,
        /// Number of redirects followed before giving up.
        redirects: u32,
        /// The last `Location` the vendor pointed to.
        location: String,
    },

    /// A non-success HTTP status with no more specific classification.
    HttpStatus {
        /// Driver that produced the error.
        provider: String,
        /// HTTP status code returned by the vendor.
        status: u16,
        /// Response body returned by the vendor, if any.
        raw_message: Option<String>,
    },

    /// The requested resource (node, volume, zone, record, group, ...) does not exist.
    ResourceNotFound {
        /// Driver that produced the error.
        provider: String,
        /// Kind of resource (e.g. `"node"`, `"zone"`).
        resource: String,
        /// Identifier that was looked up.
        id: String,
        /// Original error message from the vendor API, if available.
        raw_message: Option<String>,
    },

    /// A resource with the same identity already exists.
    ResourceExists {
        /// Driver that produced the error.
        provider: String,
        /// Kind of resource.
        resource: String,
        /// Name of the conflicting resource.
        name: String,
        /// Original error message from the vendor API, if available.
        raw_message: Option<String>,
    },

    /// A request parameter is invalid (e.g., bad TTL value, zero poll interval).
    InvalidParameter {
        /// Driver that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The account's resource quota has been exceeded.
    ///
    /// Unlike [`RateLimited`](Self::RateLimited), this is not a transient condition.
    QuotaExceeded {
        /// Driver that produced the error.
        provider: String,
        /// Original error message from the vendor API, if available.
        raw_message: Option<String>,
    },

    /// An asynchronous vendor operation finished in an error state.
    OperationFailed {
        /// Driver that produced the error.
        provider: String,
        /// Operation handle.
        operation: String,
        /// Vendor message describing the failure.
        raw_message: String,
    },

    /// An asynchronous vendor operation was canceled on the vendor side.
    OperationCanceled {
        /// Driver that produced the error.
        provider: String,
        /// Operation handle.
        operation: String,
    },

    /// Polling an asynchronous vendor operation exceeded its timeout.
    OperationTimedOut {
        /// Driver that produced the error.
        provider: String,
        /// Operation handle.
        operation: String,
        /// Timeout that was exceeded, in seconds.
        timeout_secs: u64,
    },

    /// The driver does not implement this operation.
    Unsupported {
        /// Driver that produced the error.
        provider: String,
        /// Name of the unsupported operation.
        operation: String,
    },

    /// A local I/O operation failed (local storage driver).
    IoError {
        /// Driver that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// Failed to parse the vendor's API response.
    ParseError {
        /// Driver that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    SerializationError {
        /// Driver that produced the error.
        provider: String,
        /// Details about the serialization failure.
        detail: String,
    },

    /// An unrecognized error from the vendor API.
    ///
    /// This is a catch-all for error codes not yet mapped to a specific variant.
    Unknown {
        /// Driver that produced the error.
        provider: String,
        /// Raw error code from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

impl ProviderError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::PermissionDenied { .. }
                | Self::ResourceNotFound { .. }
                | Self::ResourceExists { .. }
                | Self::InvalidParameter { .. }
                | Self::QuotaExceeded { .. }
                | Self::Unsupported { .. }
        )
    }

    /// Whether the connection layer may retry the request that produced this error.
    ///
    /// Network errors, timeouts and rate limiting are transient; business errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// Name of the driver that produced the error.
    pub fn provider(&self) -> &str {
        match self {
            Self::NetworkError { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::InvalidCredentials { provider, .. }
            | Self::PermissionDenied { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::TooManyRedirects { provider, .. }
            | Self::HttpStatus { provider, .. }
            | Self::ResourceNotFound { provider, .. }
            | Self::ResourceExists { provider, .. }
            | Self::InvalidParameter { provider, .. }
            | Self::QuotaExceeded { provider, .. }
            | Self::OperationFailed { provider, .. }
            | Self::OperationCanceled { provider, .. }
            | Self::OperationTimedOut { provider, .. }
            | Self::Unsupported { provider, .. }
            | Self::IoError { provider, .. }
            | Self::ParseError { provider, .. }
            | Self::SerializationError { provider, .. }
            | Self::Unknown { provider, .. } => provider,
        }
    }

    /// Shorthand for [`Unsupported`](Self::Unsupported).
    pub fn unsupported(provider: &str, operation: &str) -> Self {
        Self::Unsupported {
            provider: provider.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Shorthand for [`ResourceNotFound`](Self::ResourceNotFound) without a vendor message.
    pub fn not_found(provider: &str, resource: &str, id: &str) -> Self {
        Self::ResourceNotFound {
            provider: provider.to_string(),
            resource: resource.to_string(),
            id: id.to_string(),
            raw_message: None,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Invalid credentials: {msg}")
                } else {
                    write!(f, "[{provider}] Invalid credentials")
                }
            }
            Self::PermissionDenied {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Permission denied: {msg}")
                } else {
                    write!(f, "[{provider}] Permission denied")
                }
            }
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => {
                if let Some(secs) = retry_after {
                    write!(f, "[{provider}] Rate limited (retry after {secs}s)")
                } else {
                    write!(f, "[{provider}] Rate limited")
                }
            }
            Self::TooManyRedirects {
                provider,
                redirects,
                location,
            } => {
                write!(
                    f,
                    "[{provider}] Too many redirects ({redirects}), last location: {location}"
                )
            }
            Self::HttpStatus {
                provider,
                status,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] HTTP {status}: {msg}")
                } else {
                    write!(f, "[{provider}] HTTP {status}")
                }
            }
            Self::ResourceNotFound {
                provider,
                resource,
                id,
                ..
            } => {
                write!(f, "[{provider}] {resource} '{id}' not found")
            }
            Self::ResourceExists {
                provider,
                resource,
                name,
                ..
            } => {
                write!(f, "[{provider}] {resource} '{name}' already exists")
            }
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => {
                write!(f, "[{provider}] Invalid parameter '{param}': {detail}")
            }
            Self::QuotaExceeded { provider, .. } => {
                write!(f, "[{provider}] Quota exceeded")
            }
            Self::OperationFailed {
                provider,
                operation,
                raw_message,
            } => {
                write!(f, "[{provider}] Operation '{operation}' failed: {raw_message}")
            }
            Self::OperationCanceled {
                provider,
                operation,
            } => {
                write!(f, "[{provider}] Operation '{operation}' was canceled")
            }
            Self::OperationTimedOut {
                provider,
                operation,
                timeout_secs,
            } => {
                write!(
                    f,
                    "[{provider}] Operation '{operation}' timed out after {timeout_secs}s"
                )
            }
            Self::Unsupported {
                provider,
                operation,
            } => {
                write!(f, "[{provider}] Operation not supported: {operation}")
            }
            Self::IoError { provider, detail } => {
                write!(f, "[{provider}] I/O error: {detail}")
            }
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::SerializationError { provider, detail } => {
                write!(f, "[{provider}] Serialization error: {detail}")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => {
                write!(f, "[{provider}] {raw_message}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_network_error() {
        let e = ProviderError::NetworkError {
            provider: "test".to_string(),
            detail: "connection refused".to_string(),
        };
        assert_eq!(e.to_string(), "[test] Network error: connection refused");
    }

    #[test]
    fn display_invalid_credentials_with_message() {
        let e = ProviderError::InvalidCredentials {
            provider: "digitalocean".to_string(),
            raw_message: Some("bad token".to_string()),
        };
        assert_eq!(e.to_string(), "[digitalocean] Invalid credentials: bad token");
    }

    #[test]
    fn display_invalid_credentials_without_message() {
        let e = ProviderError::InvalidCredentials {
            provider: "softlayer".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[softlayer] Invalid credentials");
    }

    #[test]
    fn display_rate_limited_with_retry() {
        let e = ProviderError::RateLimited {
            provider: "cloudflare".to_string(),
            retry_after: Some(30),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[cloudflare] Rate limited (retry after 30s)");
    }

    #[test]
    fn display_rate_limited_without_retry() {
        let e = ProviderError::RateLimited {
            provider: "cloudflare".to_string(),
            retry_after: None,
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[cloudflare] Rate limited");
    }

    #[test]
    fn display_http_status_keeps_vendor_body() {
        let e = ProviderError::HttpStatus {
            provider: "digitalocean".to_string(),
            status: 422,
            raw_message: Some("size is invalid".to_string()),
        };
        assert_eq!(e.to_string(), "[digitalocean] HTTP 422: size is invalid");
    }

    #[test]
    fn display_resource_not_found() {
        let e = ProviderError::not_found("dummy", "node", "42");
        assert_eq!(e.to_string(), "[dummy] node '42' not found");
    }

    #[test]
    fn display_resource_exists() {
        let e = ProviderError::ResourceExists {
            provider: "cloudflare".to_string(),
            resource: "record".to_string(),
            name: "www".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[cloudflare] record 'www' already exists");
    }

    #[test]
    fn display_operation_failed() {
        let e = ProviderError::OperationFailed {
            provider: "softlayer".to_string(),
            operation: "group-7".to_string(),
            raw_message: "quota exceeded".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[softlayer] Operation 'group-7' failed: quota exceeded"
        );
    }

    #[test]
    fn display_operation_canceled() {
        let e = ProviderError::OperationCanceled {
            provider: "digitalocean".to_string(),
            operation: "1234".to_string(),
        };
        assert_eq!(e.to_string(), "[digitalocean] Operation '1234' was canceled");
    }

    #[test]
    fn display_operation_timed_out() {
        let e = ProviderError::OperationTimedOut {
            provider: "digitalocean".to_string(),
            operation: "1234".to_string(),
            timeout_secs: 600,
        };
        assert_eq!(
            e.to_string(),
            "[digitalocean] Operation '1234' timed out after 600s"
        );
    }

    #[test]
    fn display_too_many_redirects() {
        let e = ProviderError::TooManyRedirects {
            provider: "test".to_string(),
            redirects: 5,
            location: "https://elsewhere.example".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[test] Too many redirects (5), last location: https://elsewhere.example"
        );
    }

    #[test]
    fn display_unsupported() {
        let e = ProviderError::unsupported("local", "create_volume");
        assert_eq!(e.to_string(), "[local] Operation not supported: create_volume");
    }

    #[test]
    fn display_unknown() {
        let e = ProviderError::Unknown {
            provider: "test".to_string(),
            raw_code: Some("E001".to_string()),
            raw_message: "something broke".to_string(),
        };
        assert_eq!(e.to_string(), "[test] something broke");
    }

    #[test]
    fn serialize_is_tagged_by_code() {
        let e = ProviderError::RateLimited {
            provider: "cloudflare".to_string(),
            retry_after: Some(60),
            raw_message: Some("too many requests".to_string()),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"RateLimited\""));
        assert!(json.contains("\"retry_after\":60"));
    }

    #[test]
    fn deserialize_preserves_display() {
        let original = ProviderError::OperationTimedOut {
            provider: "softlayer".to_string(),
            operation: "9".to_string(),
            timeout_secs: 10,
        };
        let json = serde_json::to_string(&original).unwrap();
        let back: ProviderError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), original.to_string());
    }

    #[test]
    fn retryable_and_expected_are_disjoint() {
        let transient = [
            ProviderError::NetworkError {
                provider: "t".into(),
                detail: "x".into(),
            },
            ProviderError::Timeout {
                provider: "t".into(),
                detail: "x".into(),
            },
            ProviderError::RateLimited {
                provider: "t".into(),
                retry_after: None,
                raw_message: None,
            },
        ];
        for e in &transient {
            assert!(e.is_retryable(), "{e} should be retryable");
            assert!(!e.is_expected(), "{e} should not be expected");
        }

        let business = [
            ProviderError::InvalidCredentials {
                provider: "t".into(),
                raw_message: None,
            },
            ProviderError::not_found("t", "zone", "z"),
            ProviderError::QuotaExceeded {
                provider: "t".into(),
                raw_message: None,
            },
        ];
        for e in &business {
            assert!(!e.is_retryable(), "{e} should not be retryable");
            assert!(e.is_expected(), "{e} should be expected");
        }
    }

    #[test]
    fn operation_failures_are_neither_retryable_nor_expected() {
        let e = ProviderError::OperationFailed {
            provider: "t".into(),
            operation: "op".into(),
            raw_message: "boom".into(),
        };
        assert!(!e.is_retryable());
        assert!(!e.is_expected());
        assert_eq!(e.provider(), "t");
    }
}
