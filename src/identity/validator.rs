//! Role-cardinality validation of an identity assertion.
//! Pure function, no I/O: the binder and the gate build on its output.

use crate::error::GateError;

use super::assertion::IdentityAssertion;
use super::principal::AdminLevel;

/// Fields proven valid by [`validate`], consumed by the session binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAssertion {
    pub admin_level: AdminLevel,
    /// The single non-admin role token; present iff the level is None/Read.
    pub service_role_name: Option<String>,
}

/// Enforce the role-cardinality and missing-field invariants:
/// exactly one reserved admin token; exactly one remaining service token
/// unless the level is Write/AllScopes; a non-blank scope unless the level
/// is AllScopes. Every failure embeds the full assertion for audit.
pub fn validate(assertion: &IdentityAssertion) -> Result<ValidatedAssertion, GateError> {
    if assertion.login.trim().is_empty() {
        return Err(GateError::validation(
            "empty_login",
            format!("access denied: login is null or empty ({assertion})"),
        ));
    }

    // Classify every raw token; duplicates count, so two copies of the same
    // admin token are still "too many".
    let mut admin_matches: Vec<&str> = Vec::new();
    let mut level: Option<AdminLevel> = None;
    for token in &assertion.roles {
        if let Some(l) = AdminLevel::classify(token) {
            level = Some(l);
            admin_matches.push(token.as_str());
        }
    }

    if admin_matches.len() > 1 {
        return Err(GateError::validation(
            "too_many_admin_levels",
            format!("access denied: too many admin levels defined: {admin_matches:?} ({assertion})"),
        ));
    }
    let Some(level) = level else {
        return Err(GateError::validation(
            "no_admin_level",
            format!("access denied: no admin level defined ({assertion})"),
        ));
    };

    let service_role_name = if level.is_global() {
        // A global grant needs no service-scoped role; extra tokens are
        // simply ignored.
        None
    } else {
        let service: Vec<&str> = assertion
            .roles
            .iter()
            .map(String::as_str)
            .filter(|t| AdminLevel::classify(t).is_none())
            .collect();
        match service.as_slice() {
            [] => {
                return Err(GateError::validation(
                    "no_service_role",
                    format!("access denied: no service role defined ({assertion})"),
                ));
            }
            [sole] => Some((*sole).to_string()),
            _ => {
                return Err(GateError::validation(
                    "too_many_roles",
                    format!("access denied: too many roles defined: {service:?} ({assertion})"),
                ));
            }
        }
    };

    if level != AdminLevel::AllScopes
        && assertion.scope.as_deref().map(str::trim).unwrap_or("").is_empty()
    {
        return Err(GateError::validation(
            "no_scope",
            format!("access denied: no organization scope defined ({assertion})"),
        ));
    }

    Ok(ValidatedAssertion { admin_level: level, service_role_name })
}
