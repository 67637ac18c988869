//! Fixed bilingual rejection page.
//!
//! Every rejected request receives the same page regardless of the internal
//! failure kind; the true cause is only logged. Titles and messages come
//! from a small message catalog and fall back to hardcoded literals when a
//! key is missing for the requested locale.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

/// Error categories the page distinguishes. Both render with status 401;
/// only the wording differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    /// The request could not be authenticated at all.
    AuthenticationFailure,
    /// The upstream assertion was present but carried unusable parameters.
    InvalidAuthParameter,
}

const TITLE_KEY_AUTH: &str = "error.user.not_authenticated.title";
const MESSAGE_KEY_AUTH: &str = "error.user.not_authenticated.message";
const TITLE_KEY_PARAM: &str = "error.user.invalid_auth_param.title";
const MESSAGE_KEY_PARAM: &str = "error.user.invalid_auth_param.message";

// Fallback literals, used when the catalog has no entry for a key.
const FALLBACK_TITLE_AUTH_FR: &str = "Authentification invalide.";
const FALLBACK_TITLE_AUTH_EN: &str = "Bad authorization to access this application.";
const FALLBACK_MESSAGE_AUTH_FR: &str =
    "Avertissement : tout acc\u{e8}s non autoris\u{e9} \u{e0} ce syst\u{e8}me est interdit.";
const FALLBACK_MESSAGE_AUTH_EN: &str =
    "Warning: any unauthorized access to this system is prohibited.";
const FALLBACK_TITLE_PARAM_FR: &str = "Param\u{e8}tre d'authentification invalide.";
const FALLBACK_TITLE_PARAM_EN: &str = "Bad authorization parameter.";
const FALLBACK_MESSAGE_PARAM_FR: &str = FALLBACK_MESSAGE_AUTH_FR;
const FALLBACK_MESSAGE_PARAM_EN: &str = FALLBACK_MESSAGE_AUTH_EN;

// Only the not_authenticated keys are localized; invalid_auth_param
// exercises the fallback path.
static CATALOG: Lazy<HashMap<(&'static str, &'static str), &'static str>> = Lazy::new(|| {
    HashMap::from([
        (("fr", TITLE_KEY_AUTH), "Authentification invalide."),
        (
            ("fr", MESSAGE_KEY_AUTH),
            "Avertissement : tout acc\u{e8}s non autoris\u{e9} \u{e0} ce syst\u{e8}me est interdit.",
        ),
        (("en", TITLE_KEY_AUTH), "Bad authorization to access this application."),
        (("en", MESSAGE_KEY_AUTH), "Warning: any unauthorized access to this system is prohibited."),
    ])
});

/// Catalog lookup; `None` when the key is not localized for that locale.
fn message(locale: &'static str, key: &'static str) -> Option<&'static str> {
    CATALOG.get(&(locale, key)).copied()
}

fn localized(
    locale: &'static str,
    key: &'static str,
    fallback: &'static str,
) -> &'static str {
    message(locale, key).unwrap_or_else(|| {
        warn!("no catalog entry for ({locale}, {key}); using fallback literal");
        fallback
    })
}

struct PageText {
    title_fr: &'static str,
    message_fr: &'static str,
    title_en: &'static str,
    message_en: &'static str,
}

fn page_text(kind: RejectKind) -> PageText {
    match kind {
        RejectKind::AuthenticationFailure => PageText {
            title_fr: localized("fr", TITLE_KEY_AUTH, FALLBACK_TITLE_AUTH_FR),
            message_fr: localized("fr", MESSAGE_KEY_AUTH, FALLBACK_MESSAGE_AUTH_FR),
            title_en: localized("en", TITLE_KEY_AUTH, FALLBACK_TITLE_AUTH_EN),
            message_en: localized("en", MESSAGE_KEY_AUTH, FALLBACK_MESSAGE_AUTH_EN),
        },
        RejectKind::InvalidAuthParameter => PageText {
            title_fr: localized("fr", TITLE_KEY_PARAM, FALLBACK_TITLE_PARAM_FR),
            message_fr: localized("fr", MESSAGE_KEY_PARAM, FALLBACK_MESSAGE_PARAM_FR),
            title_en: localized("en", TITLE_KEY_PARAM, FALLBACK_TITLE_PARAM_EN),
            message_en: localized("en", MESSAGE_KEY_PARAM, FALLBACK_MESSAGE_PARAM_EN),
        },
    }
}

fn render(text: &PageText) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str("<html><head><title>ssogate: authentication problem</title></head><body>");
    for (title, message) in [(text.title_fr, text.message_fr), (text.title_en, text.message_en)] {
        html.push_str("<table align=\"center\"><tr><th>");
        html.push_str(title);
        html.push_str("</th></tr><tr><td><hr/><font color=\"red\">");
        html.push_str(message);
        html.push_str("</font></td></tr></table><br/><br/>");
    }
    html.push_str("</body></html>");
    html
}

/// Build the rejection response: 401 plus the fixed bilingual page.
pub fn rejection_page(kind: RejectKind) -> Response {
    let body = render(&page_text(kind));
    (
        StatusCode::UNAUTHORIZED,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}
