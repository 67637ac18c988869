//! Gate configuration surface: extractor chain order, bypass extensions,
//! admin landing route and the session cookie name. All fields have
//! defaults so an empty document yields a working gate.

use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Extractor plugin identifiers, invoked in this order. Unknown
    /// identifiers are a startup error, not a runtime fallback.
    pub extractors: Vec<String>,
    /// Resource-path extensions (no dot) that skip authentication entirely,
    /// e.g. static assets.
    pub bypass_extensions: HashSet<String>,
    /// Landing route that Write/AllScopes administrators are redirected to
    /// when they request a shallow path.
    pub admin_home: String,
    /// Name of the cookie carrying the session identifier.
    pub session_cookie: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            extractors: vec![crate::extract::sso_headers::EXTRACTOR_ID.to_string()],
            bypass_extensions: ["js", "gif", "png", "css"].iter().map(|s| s.to_string()).collect(),
            admin_home: "/pages/admin/roles".to_string(),
            session_cookie: "ssogate_session".to_string(),
        }
    }
}
