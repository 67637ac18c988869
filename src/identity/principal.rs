//! Admin privilege tiers and the validated, session-bound principal.

use serde::{Deserialize, Serialize};

use crate::directory::Role;

/// Coarse privilege tier carried by every principal, distinct from the
/// scope-bound service roles. Ordered: None < Read < Write < AllScopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    None,
    Read,
    Write,
    AllScopes,
}

/// The four reserved admin-role tokens the perimeter proxy may assert.
const RESERVED: [(&str, AdminLevel); 4] = [
    ("admin_none", AdminLevel::None),
    ("admin_read", AdminLevel::Read),
    ("admin_write", AdminLevel::Write),
    ("admin_allmco", AdminLevel::AllScopes),
];

impl AdminLevel {
    /// Case-insensitive classification of one raw role token against the
    /// reserved admin names. Non-admin tokens return `None`.
    pub fn classify(token: &str) -> Option<AdminLevel> {
        RESERVED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
            .map(|(_, level)| *level)
    }

    /// Write and AllScopes imply a global grant that needs no service role.
    pub fn is_global(self) -> bool {
        matches!(self, AdminLevel::Write | AdminLevel::AllScopes)
    }
}

/// The validated, bound identity for a session.
///
/// Owned by the session for its lifetime; replaced, never mutated, when
/// re-authentication succeeds. `service_role` is populated iff the admin
/// level is None or Read; `scope` is populated iff the level is not
/// AllScopes (AllScopes may still carry one, it is simply not required).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Organization scope, uppercased from the resolved directory record.
    pub scope: Option<String>,
    pub admin_level: AdminLevel,
    pub service_role: Option<Role>,
    /// Preferred language code seeded from the scope defaults.
    pub language: Option<String>,
}

impl Principal {
    /// True when this principal holds at least the given admin level.
    pub fn has_admin_level(&self, level: AdminLevel) -> bool {
        self.admin_level >= level
    }
}
