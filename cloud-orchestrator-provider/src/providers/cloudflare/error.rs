//! Cloudflare error codes to [`ProviderError`]
//!
//! Codes: <https://developers.cloudflare.com/api/>

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareDnsDriver;

/// What a Cloudflare error code means to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeClass {
    Auth,
    Forbidden,
    Invalid(&'static str),
    ZoneExists,
    RecordExists,
    RecordMissing,
    /// Unroutable path, usually a bad zone or record id.
    NoRoute,
    Quota,
}

fn classify(code: &str) -> Option<CodeClass> {
    Some(match code {
        "6003" | "6103" | "6111" | "9103" | "9106" | "9109" | "10000" => CodeClass::Auth,
        "9108" | "10001" => CodeClass::Forbidden,
        "9000" | "9007" => CodeClass::Invalid("name"),
        "9005" | "9006" | "9009" | "9101" => CodeClass::Invalid("data"),
        "9021" => CodeClass::Invalid("ttl"),
        "9041" => CodeClass::Invalid("proxied"),
        "1049" | "1097" => CodeClass::Invalid("domain"),
        "1004" => CodeClass::Invalid("general"),
        "1061" => CodeClass::ZoneExists,
        "81053" | "81054" | "81055" | "81056" | "81057" | "81058" => CodeClass::RecordExists,
        "81044" => CodeClass::RecordMissing,
        "7000" | "7003" => CodeClass::NoRoute,
        "81045" | "1105" => CodeClass::Quota,
        _ => return None,
    })
}

const UNKNOWN: &str = "<unknown>";

impl ProviderErrorMapper for CloudflareDnsDriver {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let Some(class) = raw.code.as_deref().and_then(classify) else {
            return self.unknown_error(raw);
        };
        let provider = self.provider_name().to_string();
        let message = Some(raw.message.clone());
        let name = || context.name.clone().unwrap_or_else(|| UNKNOWN.to_string());
        let id = || context.id.clone().unwrap_or_else(|| UNKNOWN.to_string());

        match class {
            CodeClass::Auth => ProviderError::InvalidCredentials {
                provider,
                raw_message: message,
            },
            CodeClass::Forbidden => ProviderError::PermissionDenied {
                provider,
                raw_message: message,
            },
            CodeClass::Invalid(param) => ProviderError::InvalidParameter {
                provider,
                param: param.to_string(),
                detail: raw.message,
            },
            CodeClass::ZoneExists => ProviderError::ResourceExists {
                provider,
                resource: "zone".to_string(),
                name: name(),
                raw_message: message,
            },
            CodeClass::RecordExists => ProviderError::ResourceExists {
                provider,
                resource: "record".to_string(),
                name: name(),
                raw_message: message,
            },
            CodeClass::RecordMissing => ProviderError::ResourceNotFound {
                provider,
                resource: "record".to_string(),
                id: id(),
                raw_message: message,
            },
            CodeClass::NoRoute => ProviderError::ResourceNotFound {
                provider,
                resource: context.resource_or_default().to_string(),
                id: id(),
                raw_message: message,
            },
            CodeClass::Quota => ProviderError::QuotaExceeded {
                provider,
                raw_message: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DriverOptions;

    fn driver() -> CloudflareDnsDriver {
        CloudflareDnsDriver::new(String::new(), &DriverOptions::default()).unwrap()
    }

    fn map(code: &str, context: ErrorContext) -> ProviderError {
        driver().map_error(RawApiError::with_code(code, format!("cf {code}")), context)
    }

    #[test]
    fn classification_table() {
        let cases = [
            ("10000", Some(CodeClass::Auth)),
            ("9109", Some(CodeClass::Auth)),
            ("10001", Some(CodeClass::Forbidden)),
            ("9005", Some(CodeClass::Invalid("data"))),
            ("9021", Some(CodeClass::Invalid("ttl"))),
            ("1004", Some(CodeClass::Invalid("general"))),
            ("1061", Some(CodeClass::ZoneExists)),
            ("81058", Some(CodeClass::RecordExists)),
            ("81044", Some(CodeClass::RecordMissing)),
            ("7003", Some(CodeClass::NoRoute)),
            ("81045", Some(CodeClass::Quota)),
            ("42", None),
        ];
        for (code, expected) in cases {
            assert_eq!(classify(code), expected, "code {code}");
        }
    }

    #[test]
    fn invalid_parameter_names_the_field() {
        let err = map("9041", ErrorContext::default());
        assert!(matches!(
            err,
            ProviderError::InvalidParameter { ref param, ref detail, .. }
                if param == "proxied" && detail == "cf 9041"
        ));
    }

    #[test]
    fn exists_and_missing_use_context() {
        let ctx = ErrorContext::resource("record").id("rec-1").name("www");
        assert!(matches!(
            map("81057", ctx.clone()),
            ProviderError::ResourceExists { ref resource, ref name, .. }
                if resource == "record" && name == "www"
        ));
        assert!(matches!(
            map("81044", ctx),
            ProviderError::ResourceNotFound { ref id, .. } if id == "rec-1"
        ));
        assert!(matches!(
            map("1061", ErrorContext::resource("zone").name("example.com")),
            ProviderError::ResourceExists { ref resource, ref name, .. }
                if resource == "zone" && name == "example.com"
        ));
    }

    #[test]
    fn no_route_falls_back_to_generic_resource() {
        assert!(matches!(
            map("7000", ErrorContext::default()),
            ProviderError::ResourceNotFound { ref resource, ref id, .. }
                if resource == "resource" && id == UNKNOWN
        ));
        assert!(matches!(
            map("7003", ErrorContext::resource("zone").id("z9")),
            ProviderError::ResourceNotFound { ref resource, ref id, .. }
                if resource == "zone" && id == "z9"
        ));
    }

    #[test]
    fn unmapped_codes_keep_raw_details() {
        let err = driver().map_error(RawApiError::with_code("99999", "odd"), ErrorContext::default());
        assert!(matches!(
            err,
            ProviderError::Unknown { ref raw_code, ref raw_message, .. }
                if raw_code.as_deref() == Some("99999") && raw_message == "odd"
        ));
        let err = driver().map_error(RawApiError::new("bare"), ErrorContext::default());
        assert!(matches!(err, ProviderError::Unknown { raw_code: None, .. }));
        assert_eq!(err.provider(), "cloudflare");
    }
}
