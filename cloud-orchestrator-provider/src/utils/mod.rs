//! Utility modules.

/// Timestamp (de)serialization shared by driver payloads.
pub mod datetime;

/// Log redaction for request and response payloads.
pub mod redact;
