//! Session binder: resolves or creates the durable user record, loads the
//! scope-bound service role, and assembles the immutable principal.
//!
//! Collaborators are injected trait objects, never process-wide accessors.
//! Any directory failure is terminal for the request: the gate rejects
//! rather than binding a partial principal or keeping a stale one.

use std::sync::Arc;

use tracing::{debug, info};

use crate::directory::{Directory, Role, ScopeRegistry, UserRecord};
use crate::error::GateError;
use crate::identity::{IdentityAssertion, Principal, ValidatedAssertion};

pub struct SessionBinder {
    directory: Arc<dyn Directory>,
    scopes: Arc<dyn ScopeRegistry>,
}

impl SessionBinder {
    pub fn new(directory: Arc<dyn Directory>, scopes: Arc<dyn ScopeRegistry>) -> Self {
        Self { directory, scopes }
    }

    /// Bind one validated assertion to a principal.
    pub fn bind(
        &self,
        assertion: &IdentityAssertion,
        validated: &ValidatedAssertion,
    ) -> Result<Principal, GateError> {
        let record = self.notify_connection(assertion)?;
        let service_role = self.load_service_role(assertion, validated)?;
        Ok(Principal {
            login: record.login,
            first_name: record.first_name,
            last_name: record.last_name,
            scope: record.scope,
            admin_level: validated.admin_level,
            service_role,
            language: record.language,
        })
    }

    /// Load the record for this login, creating it on first sight. New
    /// records are seeded from the assertion plus the scope's first default
    /// language; repeat sightings record a connection event instead.
    fn notify_connection(&self, assertion: &IdentityAssertion) -> Result<UserRecord, GateError> {
        let existing = self.directory.lookup_user(&assertion.login, assertion.scope.as_deref())?;
        let mut record = match existing {
            Some(record) => {
                self.directory.record_connection(&record)?;
                debug!("connection recorded for {}", record.login);
                record
            }
            None => {
                let language = assertion
                    .scope
                    .as_deref()
                    .and_then(|s| self.scopes.default_languages(s).into_iter().next());
                let record = UserRecord {
                    login: assertion.login.clone(),
                    scope: assertion.scope.clone(),
                    first_name: assertion.first_name.clone(),
                    last_name: assertion.last_name.clone(),
                    language,
                };
                self.directory.create_user(&record)?;
                info!("directory record created for first-seen user {}", record.login);
                record
            }
        };
        // Scope is normalized on the resolved record, not on the assertion.
        if let Some(scope) = record.scope.take() {
            record.scope = Some(scope.trim().to_uppercase());
        }
        Ok(record)
    }

    /// Resolve the service role object for None/Read levels. A missing role
    /// is a data/configuration problem, not a malformed assertion, and is
    /// reported as an authorization failure.
    fn load_service_role(
        &self,
        assertion: &IdentityAssertion,
        validated: &ValidatedAssertion,
    ) -> Result<Option<Role>, GateError> {
        if validated.admin_level.is_global() {
            return Ok(None);
        }
        let Some(name) = validated.service_role_name.as_deref() else {
            // validate() guarantees presence for None/Read; kept as a
            // terminal failure rather than a panic
            return Err(GateError::authorization(
                "missing_service_role",
                format!("no service role name resolved ({assertion})"),
            ));
        };
        let scope = assertion.scope.as_deref().unwrap_or("");
        match self.directory.lookup_role(name, scope)? {
            Some(role) => Ok(Some(role)),
            None => Err(GateError::authorization(
                "role_not_found",
                format!("role \"{name}\" not found for scope \"{scope}\""),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, InMemoryDirectory, StaticScopeRegistry};
    use crate::identity::{validate, AdminLevel};

    fn assertion(scope: Option<&str>, roles: &[&str]) -> IdentityAssertion {
        IdentityAssertion {
            login: "jdoe".into(),
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            scope: scope.map(str::to_string),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn binder_with(directory: Arc<InMemoryDirectory>) -> SessionBinder {
        let scopes = Arc::new(StaticScopeRegistry::with_languages([("FR", vec!["fr", "en"])]));
        SessionBinder::new(directory, scopes)
    }

    #[test]
    fn first_sight_creates_record_seeded_with_default_language() {
        let dir = Arc::new(InMemoryDirectory::default());
        dir.add_role(crate::directory::Role { name: "service_support".into(), scope: "FR".into() });
        let binder = binder_with(dir.clone());

        let a = assertion(Some("fr"), &["admin_none", "service_support"]);
        let v = validate(&a).unwrap();
        let p = binder.bind(&a, &v).unwrap();

        assert_eq!(dir.user_count(), 1);
        assert_eq!(dir.connection_count(), 0);
        assert_eq!(p.login, "jdoe");
        assert_eq!(p.scope.as_deref(), Some("FR")); // uppercased
        assert_eq!(p.language.as_deref(), Some("fr"));
        assert_eq!(p.admin_level, AdminLevel::None);
        assert_eq!(p.service_role.as_ref().map(|r| r.name.as_str()), Some("service_support"));
    }

    #[test]
    fn repeat_sight_records_connection_instead_of_creating() {
        let dir = Arc::new(InMemoryDirectory::default());
        dir.add_role(crate::directory::Role { name: "service_support".into(), scope: "FR".into() });
        let binder = binder_with(dir.clone());

        let a = assertion(Some("FR"), &["admin_none", "service_support"]);
        let v = validate(&a).unwrap();
        binder.bind(&a, &v).unwrap();
        binder.bind(&a, &v).unwrap();

        assert_eq!(dir.user_count(), 1);
        assert_eq!(dir.connection_count(), 1);
    }

    #[test]
    fn global_admin_skips_role_lookup() {
        // no roles registered at all; Write must still bind
        let dir = Arc::new(InMemoryDirectory::default());
        let binder = binder_with(dir);

        let a = assertion(Some("FR"), &["admin_write", "whatever"]);
        let v = validate(&a).unwrap();
        let p = binder.bind(&a, &v).unwrap();
        assert!(p.service_role.is_none());
        assert_eq!(p.admin_level, AdminLevel::Write);
    }

    #[test]
    fn missing_role_is_an_authorization_failure() {
        let dir = Arc::new(InMemoryDirectory::default());
        let binder = binder_with(dir);

        let a = assertion(Some("FR"), &["admin_none", "service_support"]);
        let v = validate(&a).unwrap();
        let err = binder.bind(&a, &v).unwrap_err();
        assert!(matches!(err, GateError::Authorization { .. }));
        assert_eq!(err.code_str(), "role_not_found");
        assert!(err.message().contains("service_support"));
    }

    struct FailingDirectory;

    impl Directory for FailingDirectory {
        fn lookup_user(
            &self,
            _login: &str,
            _scope: Option<&str>,
        ) -> Result<Option<UserRecord>, DirectoryError> {
            Err(DirectoryError::Unavailable("connection refused".into()))
        }
        fn create_user(&self, _record: &UserRecord) -> Result<(), DirectoryError> {
            Err(DirectoryError::Unavailable("connection refused".into()))
        }
        fn record_connection(&self, _record: &UserRecord) -> Result<(), DirectoryError> {
            Err(DirectoryError::Unavailable("connection refused".into()))
        }
        fn lookup_role(&self, _name: &str, _scope: &str) -> Result<Option<Role>, DirectoryError> {
            Err(DirectoryError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn directory_failure_is_terminal() {
        let scopes = Arc::new(StaticScopeRegistry::default());
        let binder = SessionBinder::new(Arc::new(FailingDirectory), scopes);
        let a = assertion(Some("FR"), &["admin_none", "service_support"]);
        let v = validate(&a).unwrap();
        let err = binder.bind(&a, &v).unwrap_err();
        assert!(matches!(err, GateError::Authorization { .. }));
        assert_eq!(err.code_str(), "directory_failure");
    }
}
