//! SoftLayer error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::SoftlayerAutoScaleDriver;

/// SoftLayer 异常类型映射
/// Reference: <https://sldn.softlayer.com/article/understanding-softlayer-api-exceptions/>
impl ProviderErrorMapper for SoftlayerAutoScaleDriver {
    fn provider_name(&self) -> &'static str {
        "softlayer"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match raw.code.as_deref() {
            Some("SoftLayer_Exception_InvalidLogin" | "SoftLayer_Exception_Public_InvalidLogin") => {
                ProviderError::InvalidCredentials {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                }
            }
            Some("SoftLayer_Exception_PermissionDenied" | "SoftLayer_Exception_AccessDenied") => {
                ProviderError::PermissionDenied {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                }
            }
            Some("SoftLayer_Exception_ObjectNotFound" | "SoftLayer_Exception_NotFound") => {
                ProviderError::ResourceNotFound {
                    provider: self.provider_name().to_string(),
                    resource: context.resource_or_default().to_string(),
                    id: context.id.unwrap_or_else(|| "<unknown>".to_string()),
                    raw_message: Some(raw.message),
                }
            }
            Some("SoftLayer_Exception_Public") if raw.message.contains("already exists") => {
                ProviderError::ResourceExists {
                    provider: self.provider_name().to_string(),
                    resource: context.resource_or_default().to_string(),
                    name: context.name.unwrap_or_else(|| "<unknown>".to_string()),
                    raw_message: Some(raw.message),
                }
            }
            Some(
                "SoftLayer_Exception_InvalidValue"
                | "SoftLayer_Exception_MissingCreationProperty"
                | "SoftLayer_Exception_InvalidData",
            ) => ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "general".to_string(),
                detail: raw.message,
            },
            Some("SoftLayer_Exception_Public") if raw.message.contains("limit") => {
                ProviderError::QuotaExceeded {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                }
            }
            _ => self.unknown_error(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DriverOptions;

    fn driver() -> SoftlayerAutoScaleDriver {
        SoftlayerAutoScaleDriver::new("user".to_string(), "key".to_string(), &DriverOptions::default())
            .unwrap()
    }

    #[test]
    fn object_not_found() {
        let err = driver().map_error(
            RawApiError::with_code(
                "SoftLayer_Exception_ObjectNotFound",
                "Unable to find object with id of '7'.",
            ),
            ErrorContext::resource("autoscale group").id("7"),
        );
        assert!(matches!(
            err,
            ProviderError::ResourceNotFound { ref resource, ref id, .. }
                if resource == "autoscale group" && id == "7"
        ));
    }

    #[test]
    fn duplicate_name() {
        let err = driver().map_error(
            RawApiError::with_code(
                "SoftLayer_Exception_Public",
                "A group with name 'web' already exists.",
            ),
            ErrorContext::resource("autoscale group").name("web"),
        );
        assert!(matches!(
            err,
            ProviderError::ResourceExists { ref name, .. } if name == "web"
        ));
    }

    #[test]
    fn invalid_login() {
        let err = driver().map_error(
            RawApiError::with_code("SoftLayer_Exception_InvalidLogin", "Invalid API token."),
            ErrorContext::default(),
        );
        assert!(matches!(err, ProviderError::InvalidCredentials { .. }));
    }

    #[test]
    fn unmapped_public_exception() {
        let err = driver().map_error(
            RawApiError::with_code("SoftLayer_Exception_Public", "Something odd"),
            ErrorContext::default(),
        );
        assert!(matches!(err, ProviderError::Unknown { .. }));
    }
}
