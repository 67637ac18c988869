//! Unified error model for the authentication broker.
//! One enum covers the failure families the gate distinguishes internally
//! (extraction, validation, authorization, configuration). The external
//! rejection page never reveals which one fired; callers log the full error
//! and answer with the same generic page.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateError {
    /// A plugin could not read a required trust-boundary header. Non-fatal:
    /// the gate treats the plugin as having abstained.
    Extraction { code: String, message: String },
    /// An assertion violated a role-cardinality or missing-field invariant.
    Validation { code: String, message: String },
    /// Directory lookup/creation failed, or a referenced role does not exist.
    Authorization { code: String, message: String },
    /// The gate cannot start (bad extractor chain configuration).
    Config { code: String, message: String },
}

impl GateError {
    pub fn code_str(&self) -> &str {
        match self {
            GateError::Extraction { code, .. }
            | GateError::Validation { code, .. }
            | GateError::Authorization { code, .. }
            | GateError::Config { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GateError::Extraction { message, .. }
            | GateError::Validation { message, .. }
            | GateError::Authorization { message, .. }
            | GateError::Config { message, .. } => message.as_str(),
        }
    }

    pub fn extraction<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        GateError::Extraction { code: code.into(), message: msg.into() }
    }
    pub fn validation<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        GateError::Validation { code: code.into(), message: msg.into() }
    }
    pub fn authorization<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        GateError::Authorization { code: code.into(), message: msg.into() }
    }
    pub fn config<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        GateError::Config { code: code.into(), message: msg.into() }
    }

    /// Map to the HTTP status a rejected request reports. Every runtime
    /// failure maps to 401: the caller is never told why authentication
    /// failed. Config failures abort startup and only surface as 500.
    pub fn http_status(&self) -> u16 {
        match self {
            GateError::Extraction { .. }
            | GateError::Validation { .. }
            | GateError::Authorization { .. } => 401,
            GateError::Config { .. } => 500,
        }
    }
}

impl Display for GateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for GateError {}

pub type GateResult<T> = Result<T, GateError>;

impl From<crate::directory::DirectoryError> for GateError {
    fn from(err: crate::directory::DirectoryError) -> Self {
        // Directory I/O problems are authorization failures: the request is
        // rejected rather than bound to a partial principal.
        GateError::Authorization { code: "directory_failure".into(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(GateError::extraction("missing_header", "x").http_status(), 401);
        assert_eq!(GateError::validation("no_admin_level", "x").http_status(), 401);
        assert_eq!(GateError::authorization("role_not_found", "x").http_status(), 401);
        assert_eq!(GateError::config("unknown_extractor", "x").http_status(), 500);
    }

    #[test]
    fn code_and_message_accessors() {
        let e = GateError::validation("too_many_roles", "listing: [a, b]");
        assert_eq!(e.code_str(), "too_many_roles");
        assert_eq!(e.message(), "listing: [a, b]");
        assert_eq!(e.to_string(), "too_many_roles: listing: [a, b]");
    }

    #[test]
    fn directory_error_maps_to_authorization() {
        let dir_err = crate::directory::DirectoryError::Unavailable("timeout".into());
        let e: GateError = dir_err.into();
        assert!(matches!(e, GateError::Authorization { .. }));
        assert_eq!(e.code_str(), "directory_failure");
    }
}
