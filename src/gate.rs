//! The authentication gate: axum middleware sitting in front of every
//! protected route.
//!
//! Per request the gate resolves the session, runs the extractor chain,
//! validates and binds any fresh assertion, installs a request-scoped
//! context, and either forwards to the inner service or answers with the
//! rejection page. Administrators with a global level who request a shallow
//! path are redirected to the admin landing route before dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::RwLock;
use tracing::{error, info, trace, warn};

use crate::binder::SessionBinder;
use crate::config::GateConfig;
use crate::directory::{Directory, ScopeRegistry};
use crate::error::GateError;
use crate::extract::{build_extractors, Extraction, Extractor};
use crate::identity::{validate, Principal, RequestContext};
use crate::reject::{rejection_page, RejectKind};

/// Sessions keyed by opaque identifier. One bound principal per session;
/// rebinding replaces the entry wholesale.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, Arc<Principal>>>,
}

impl SessionStore {
    pub fn get(&self, session_id: &str) -> Option<Arc<Principal>> {
        self.inner.read().get(session_id).cloned()
    }

    pub fn put(&self, session_id: &str, principal: Arc<Principal>) {
        self.inner.write().insert(session_id.to_string(), principal);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

pub struct Gate {
    config: GateConfig,
    extractors: Vec<Arc<dyn Extractor>>,
    binder: SessionBinder,
    sessions: SessionStore,
}

impl Gate {
    /// Assemble the gate. Fails when the configured extractor chain cannot
    /// be built, so a misconfigured deployment never serves traffic.
    pub fn new(
        config: GateConfig,
        directory: Arc<dyn Directory>,
        scopes: Arc<dyn ScopeRegistry>,
    ) -> Result<Self, GateError> {
        let extractors = build_extractors(&config.extractors)?;
        Ok(Self {
            config,
            extractors,
            binder: SessionBinder::new(directory, scopes),
            sessions: SessionStore::default(),
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Static-asset bypass, decided on the path's final extension.
    fn bypass(&self, path: &str) -> bool {
        match path.rsplit_once('.') {
            Some((_, ext)) => self.config.bypass_extensions.contains(ext),
            None => false,
        }
    }

    /// Run the chain in configured order; first plugin that does not abstain
    /// wins. A plugin error counts as abstention and is logged.
    fn run_extractors(&self, headers: &HeaderMap, current: Option<&Principal>) -> Extraction {
        for extractor in &self.extractors {
            match extractor.extract(headers, current) {
                Ok(Extraction::Absent) => continue,
                Ok(outcome) => return outcome,
                Err(err) => {
                    warn!(target: "ssogate::gate", "extractor {} abstained: {err}", extractor.id());
                    continue;
                }
            }
        }
        Extraction::Absent
    }

    /// Validate and bind one fresh assertion under the given session.
    fn authenticate(
        &self,
        assertion: &crate::identity::IdentityAssertion,
        session_id: &str,
    ) -> Result<Arc<Principal>, GateError> {
        let validated = validate(assertion)?;
        let principal = Arc::new(self.binder.bind(assertion, &validated)?);
        self.sessions.put(session_id, principal.clone());
        info!(
            target: "ssogate::gate",
            "principal bound: login={} scope={:?} level={:?}",
            principal.login, principal.scope, principal.admin_level
        );
        Ok(principal)
    }
}

/// Wrap a router with the gate middleware.
pub fn guard(router: Router, gate: Arc<Gate>) -> Router {
    router.layer(middleware::from_fn_with_state(gate, authorize_request))
}

/// The per-request gate logic, mounted via [`guard`].
pub async fn authorize_request(
    State(gate): State<Arc<Gate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if gate.bypass(&path) {
        return next.run(request).await;
    }

    let (session_id, fresh_session) =
        match session_cookie(request.headers(), &gate.config.session_cookie) {
            Some(sid) => (sid, false),
            None => match new_session_id() {
                Ok(sid) => (sid, true),
                Err(err) => {
                    error!(target: "ssogate::gate", "session not minted: {err}");
                    return rejection_page(RejectKind::AuthenticationFailure);
                }
            },
        };
    let current = gate.sessions.get(&session_id);

    let principal = match gate.run_extractors(request.headers(), current.as_deref()) {
        Extraction::Asserted(assertion) => {
            match gate.authenticate(&assertion, &session_id) {
                Ok(principal) => principal,
                Err(err) => {
                    // The failure kind stays internal; every rejection
                    // renders the same page.
                    error!(target: "ssogate::gate", "authentication rejected: {err}");
                    dump_headers(request.headers());
                    return with_session_cookie(
                        rejection_page(RejectKind::AuthenticationFailure),
                        &gate.config.session_cookie,
                        &session_id,
                        fresh_session,
                    );
                }
            }
        }
        Extraction::Unchanged | Extraction::Absent => match current {
            Some(principal) => principal,
            None => {
                error!(target: "ssogate::gate", "no identity on request and no bound session");
                dump_headers(request.headers());
                return with_session_cookie(
                    rejection_page(RejectKind::AuthenticationFailure),
                    &gate.config.session_cookie,
                    &session_id,
                    fresh_session,
                );
            }
        },
    };

    // Global administrators land on the admin console when they request a
    // shallow path. The landing route itself must pass through.
    if principal.admin_level.is_global()
        && !addresses_deep_route(&path)
        && path != gate.config.admin_home
    {
        info!(
            target: "ssogate::gate",
            "redirecting administrator {} from {path} to {}",
            principal.login, gate.config.admin_home
        );
        return with_session_cookie(
            Redirect::temporary(&gate.config.admin_home).into_response(),
            &gate.config.session_cookie,
            &session_id,
            fresh_session,
        );
    }

    request.extensions_mut().insert(RequestContext {
        principal: Some(principal),
        session_id: Some(session_id.clone()),
    });

    with_session_cookie(
        next.run(request).await,
        &gate.config.session_cookie,
        &session_id,
        fresh_session,
    )
}

/// Opaque session identifier: 32 random bytes, URL-safe base64.
///
/// An entropy failure is terminal: a predictable or repeated id would let
/// two sessions share one store slot and serve one user's principal to
/// another, so the request is rejected instead of minting a weak id.
fn new_session_id() -> Result<String, GateError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|err| {
        GateError::authorization("entropy_failure", format!("entropy source failure: {err}"))
    })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Pull the session cookie value out of the Cookie header, if present.
fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == cookie_name && !value.is_empty()).then(|| value.to_string())
    })
}

/// Append the Set-Cookie header when the session was minted this request.
fn with_session_cookie(
    mut response: Response,
    cookie_name: &str,
    session_id: &str,
    fresh: bool,
) -> Response {
    if !fresh {
        return response;
    }
    let cookie = format!("{cookie_name}={session_id}; Path=/; HttpOnly");
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(err) => {
            error!(target: "ssogate::gate", "session cookie not serializable: {err}");
        }
    }
    response
}

/// A route is "deep" when it carries at least three path segments, i.e.
/// addresses a concrete application page rather than a landing area.
fn addresses_deep_route(path: &str) -> bool {
    path.split('/').filter(|seg| !seg.is_empty()).count() >= 3
}

/// Trace-level dump of the request headers to aid diagnosing proxy issues.
fn dump_headers(headers: &HeaderMap) {
    if !tracing::enabled!(tracing::Level::TRACE) {
        return;
    }
    for (name, value) in headers {
        trace!(target: "ssogate::gate", "header {name}: {:?}", value);
    }
}
