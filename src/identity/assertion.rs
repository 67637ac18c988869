//! The parsed, unvalidated claim set read from one request's trust-boundary
//! headers. Produced fresh per request by an extractor, immutable once
//! built, never persisted.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAssertion {
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Organization-scope identifier. Optional only for all-scopes admins.
    pub scope: Option<String>,
    /// Raw role tokens as sent by the proxy. Unordered; duplicates are
    /// tolerated here and counted during validation.
    pub roles: Vec<String>,
}

impl IdentityAssertion {
    /// Identity for change-detection purposes is (login, scope); role and
    /// name fields do not participate.
    pub fn same_identity(&self, login: &str, scope: Option<&str>) -> bool {
        if self.login != login {
            return false;
        }
        match (self.scope.as_deref(), scope) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        }
    }
}

// Full dump used in audit logs: every validation failure reports the whole
// offending assertion.
impl Display for IdentityAssertion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "login={} first_name={:?} last_name={:?} scope={:?} roles={:?}",
            self.login, self.first_name, self.last_name, self.scope, self.roles
        )
    }
}
