//! DigitalOcean error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::DigitalOceanNodeDriver;

/// DigitalOcean 错误 id 映射
/// Reference: <https://docs.digitalocean.com/reference/api/api-reference/#section/Introduction/HTTP-Statuses>
impl ProviderErrorMapper for DigitalOceanNodeDriver {
    fn provider_name(&self) -> &'static str {
        "digitalocean"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match raw.code.as_deref() {
            Some("unauthorized") => ProviderError::InvalidCredentials {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },
            Some("forbidden") => ProviderError::PermissionDenied {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },
            Some("not_found") => ProviderError::ResourceNotFound {
                provider: self.provider_name().to_string(),
                resource: context.resource_or_default().to_string(),
                id: context.id.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },
            Some("conflict") => ProviderError::ResourceExists {
                provider: self.provider_name().to_string(),
                resource: context.resource_or_default().to_string(),
                name: context.name.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },
            // 422 同时用于参数错误和配额超限（"will exceed your droplet limit"）
            Some("unprocessable_entity") if raw.message.contains("limit") => {
                ProviderError::QuotaExceeded {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                }
            }
            Some("unprocessable_entity" | "bad_request") => ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "general".to_string(),
                detail: raw.message,
            },
            _ => self.unknown_error(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DriverOptions;

    fn driver() -> DigitalOceanNodeDriver {
        DigitalOceanNodeDriver::new("token".to_string(), &DriverOptions::default()).unwrap()
    }

    #[test]
    fn not_found_carries_context() {
        let err = driver().map_error(
            RawApiError::with_code("not_found", "The resource could not be found."),
            ErrorContext::resource("droplet").id("42"),
        );
        assert!(matches!(
            err,
            ProviderError::ResourceNotFound { ref resource, ref id, .. }
                if resource == "droplet" && id == "42"
        ));
    }

    #[test]
    fn droplet_limit_is_quota() {
        let err = driver().map_error(
            RawApiError::with_code(
                "unprocessable_entity",
                "creating this/these droplet(s) will exceed your droplet limit",
            ),
            ErrorContext::resource("droplet"),
        );
        assert!(matches!(err, ProviderError::QuotaExceeded { .. }));
    }

    #[test]
    fn validation_error_is_invalid_parameter() {
        let err = driver().map_error(
            RawApiError::with_code("unprocessable_entity", "Size is not available in this region."),
            ErrorContext::default(),
        );
        assert!(matches!(err, ProviderError::InvalidParameter { .. }));
    }

    #[test]
    fn unauthorized_is_invalid_credentials() {
        let err = driver().map_error(
            RawApiError::with_code("unauthorized", "Unable to authenticate you"),
            ErrorContext::default(),
        );
        assert!(matches!(err, ProviderError::InvalidCredentials { .. }));
    }

    #[test]
    fn unknown_id_falls_back() {
        let err = driver().map_error(
            RawApiError::with_code("server_error", "boom"),
            ErrorContext::default(),
        );
        assert!(matches!(
            err,
            ProviderError::Unknown { raw_code: Some(ref c), .. } if c == "server_error"
        ));
    }
}
