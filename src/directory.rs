//! Directory collaborator seam.
//!
//! The persistent store of user records and role definitions lives outside
//! this crate; the session binder talks to it through these injected traits
//! so the core stays independently testable. An in-memory implementation is
//! provided for tests and the demo server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The backing store could not be reached (timeout, connection loss).
    #[error("directory unavailable: {0}")]
    Unavailable(String),
    /// Any other backend failure.
    #[error("directory backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Durable record for one (login, scope) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub login: String,
    pub scope: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Preferred language code, seeded from the scope defaults on creation.
    pub language: Option<String>,
}

/// A scope-bound service role definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub scope: String,
}

pub trait Directory: Send + Sync {
    fn lookup_user(&self, login: &str, scope: Option<&str>)
        -> Result<Option<UserRecord>, DirectoryError>;
    fn create_user(&self, record: &UserRecord) -> Result<(), DirectoryError>;
    /// Record a "connection observed" event against an existing record.
    fn record_connection(&self, record: &UserRecord) -> Result<(), DirectoryError>;
    fn lookup_role(&self, name: &str, scope: &str) -> Result<Option<Role>, DirectoryError>;
}

/// Organization-scope collaborator: per-scope defaults that are not part of
/// the directory proper.
pub trait ScopeRegistry: Send + Sync {
    /// Ordered preference of language codes for one organization scope.
    fn default_languages(&self, scope: &str) -> Vec<String>;
}

fn user_key(login: &str, scope: Option<&str>) -> (String, String) {
    (login.to_string(), scope.unwrap_or("").trim().to_uppercase())
}

fn role_key(name: &str, scope: &str) -> (String, String) {
    (name.to_string(), scope.trim().to_uppercase())
}

/// In-memory directory used by tests and the demo binary. Counters expose
/// how often the store was touched so idempotence can be asserted.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<(String, String), UserRecord>>,
    roles: RwLock<HashMap<(String, String), Role>>,
    lookups: AtomicUsize,
    connections: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn add_role(&self, role: Role) {
        self.roles.write().insert(role_key(&role.name, &role.scope), role);
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Number of `lookup_user` calls made against this directory.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Number of "connection observed" events recorded.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

impl Directory for InMemoryDirectory {
    fn lookup_user(
        &self,
        login: &str,
        scope: Option<&str>,
    ) -> Result<Option<UserRecord>, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.users.read().get(&user_key(login, scope)).cloned())
    }

    fn create_user(&self, record: &UserRecord) -> Result<(), DirectoryError> {
        self.users
            .write()
            .insert(user_key(&record.login, record.scope.as_deref()), record.clone());
        Ok(())
    }

    fn record_connection(&self, _record: &UserRecord) -> Result<(), DirectoryError> {
        self.connections.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn lookup_role(&self, name: &str, scope: &str) -> Result<Option<Role>, DirectoryError> {
        Ok(self.roles.read().get(&role_key(name, scope)).cloned())
    }
}

/// Static scope registry with a configurable language table and fallback.
pub struct StaticScopeRegistry {
    languages: HashMap<String, Vec<String>>,
    fallback: Vec<String>,
}

impl Default for StaticScopeRegistry {
    fn default() -> Self {
        Self { languages: HashMap::new(), fallback: vec!["en".to_string()] }
    }
}

impl StaticScopeRegistry {
    pub fn with_languages<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let languages = entries
            .into_iter()
            .map(|(scope, langs)| {
                (scope.into().to_uppercase(), langs.into_iter().map(Into::into).collect())
            })
            .collect();
        Self { languages, ..Self::default() }
    }
}

impl ScopeRegistry for StaticScopeRegistry {
    fn default_languages(&self, scope: &str) -> Vec<String> {
        self.languages
            .get(&scope.trim().to_uppercase())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
