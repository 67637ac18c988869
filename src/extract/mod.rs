//! Extractor plugin chain: interchangeable strategies that read a request's
//! trust-boundary headers and produce an identity assertion.
//!
//! Plugins are selected by configured identifier from a static registry at
//! gate construction; unknown identifiers fail startup instead of falling
//! back to a runtime lookup.

pub mod sso_headers;

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::error::GateError;
use crate::identity::{IdentityAssertion, Principal};

pub use sso_headers::SsoHeaderExtractor;

/// Outcome of one extractor invocation.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// A fresh claim set was read from the request.
    Asserted(IdentityAssertion),
    /// The upstream claim equals the currently bound principal; no need to
    /// decode and re-bind.
    Unchanged,
    /// This strategy found no identity on the request.
    Absent,
}

pub trait Extractor: Send + Sync + std::fmt::Debug {
    /// Identifier this plugin is registered under.
    fn id(&self) -> &'static str;

    /// Read the trust-boundary headers. Plugins that can tell the identity
    /// did not change must compare against `current` before doing the full
    /// decode. An `Err` means the plugin abstains; the gate moves on to the
    /// next one.
    fn extract(
        &self,
        headers: &HeaderMap,
        current: Option<&Principal>,
    ) -> Result<Extraction, GateError>;
}

/// Build the extractor chain from configured identifiers, preserving order.
///
/// An unknown identifier or an empty chain is a configuration error: the
/// gate must fail to start rather than run without a trust boundary.
pub fn build_extractors(ids: &[String]) -> Result<Vec<Arc<dyn Extractor>>, GateError> {
    let mut chain: Vec<Arc<dyn Extractor>> = Vec::with_capacity(ids.len());
    for id in ids {
        match id.as_str() {
            sso_headers::EXTRACTOR_ID => chain.push(Arc::new(SsoHeaderExtractor::default())),
            other => {
                return Err(GateError::config(
                    "unknown_extractor",
                    format!("unknown extractor identifier: {other}"),
                ));
            }
        }
    }
    if chain.is_empty() {
        return Err(GateError::config("no_extractors", "no authentication extractor configured"));
    }
    Ok(chain)
}
