//! Reference extractor for the perimeter SSO proxy headers.
//!
//! Three headers carry the claim set:
//! - `sso-universal-id`: the login; required, its absence is an extraction
//!   error (the gate then treats this plugin as having abstained).
//! - `sso-user-credentials`: proxy prefix, a space, then `;`-separated
//!   fields: the organization scope followed by up to two role tokens.
//! - `sso-application-roles`: comma-separated, prefix-carrying role tokens;
//!   consulted only when the credentials header did not carry roles.
//! Optional `sso-given-name` / `sso-surname` seed new directory records.

use axum::http::HeaderMap;

use crate::error::GateError;
use crate::identity::{IdentityAssertion, Principal};

use super::{Extraction, Extractor};

pub const EXTRACTOR_ID: &str = "sso_headers";

pub const UNIVERSAL_ID_HEADER: &str = "sso-universal-id";
pub const CREDENTIALS_HEADER: &str = "sso-user-credentials";
pub const APPLICATION_ROLES_HEADER: &str = "sso-application-roles";
pub const GIVEN_NAME_HEADER: &str = "sso-given-name";
pub const SURNAME_HEADER: &str = "sso-surname";

#[derive(Debug, Default)]
pub struct SsoHeaderExtractor;

impl Extractor for SsoHeaderExtractor {
    fn id(&self) -> &'static str {
        EXTRACTOR_ID
    }

    fn extract(
        &self,
        headers: &HeaderMap,
        current: Option<&Principal>,
    ) -> Result<Extraction, GateError> {
        let Some(login) = header_str(headers, UNIVERSAL_ID_HEADER) else {
            return Err(GateError::extraction(
                "missing_header",
                format!("required header not present: {UNIVERSAL_ID_HEADER}"),
            ));
        };

        let fields = credential_fields(headers);
        let scope = fields
            .as_deref()
            .and_then(|f| f.first().copied())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        // Short-circuit before decoding roles when nothing changed.
        if let Some(cur) = current {
            if same_identity(cur, login, scope.as_deref()) {
                return Ok(Extraction::Unchanged);
            }
        }

        let roles = roles(headers, fields.as_deref())?;
        Ok(Extraction::Asserted(IdentityAssertion {
            login: login.to_string(),
            first_name: header_str(headers, GIVEN_NAME_HEADER).map(str::to_string),
            last_name: header_str(headers, SURNAME_HEADER).map(str::to_string),
            scope,
            roles,
        }))
    }
}

/// Header value, trimmed, empty treated as absent.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Remove the proxy prefix: everything up to and including the first space.
/// A value without a space is returned unchanged.
fn strip_proxy_prefix(s: &str) -> &str {
    match s.find(' ') {
        Some(i) => &s[i + 1..],
        None => s,
    }
}

/// The `;`-separated fields of the credentials header, prefix stripped.
fn credential_fields<'a>(headers: &'a HeaderMap) -> Option<Vec<&'a str>> {
    header_str(headers, CREDENTIALS_HEADER)
        .map(|raw| strip_proxy_prefix(raw).split(';').map(str::trim).collect())
}

fn same_identity(current: &Principal, login: &str, scope: Option<&str>) -> bool {
    if current.login != login {
        return false;
    }
    // The bound scope was uppercased during binding; compare loosely.
    match (current.scope.as_deref(), scope) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

/// Role tokens: from the credentials header when it carried them (at least
/// three fields), otherwise from the application-roles header, which is then
/// required.
fn roles(headers: &HeaderMap, fields: Option<&[&str]>) -> Result<Vec<String>, GateError> {
    if let Some(fields) = fields {
        if fields.len() >= 3 {
            return Ok(fields[1..3]
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect());
        }
    }
    let Some(raw) = header_str(headers, APPLICATION_ROLES_HEADER) else {
        return Err(GateError::extraction(
            "missing_header",
            format!("required header not present: {APPLICATION_ROLES_HEADER}"),
        ));
    };
    Ok(raw
        .split(',')
        .map(|t| strip_proxy_prefix(t.trim()).trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AdminLevel;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn principal(login: &str, scope: Option<&str>) -> Principal {
        Principal {
            login: login.to_string(),
            first_name: None,
            last_name: None,
            scope: scope.map(str::to_string),
            admin_level: AdminLevel::None,
            service_role: None,
            language: None,
        }
    }

    fn asserted(result: Result<Extraction, GateError>) -> IdentityAssertion {
        match result.unwrap() {
            Extraction::Asserted(a) => a,
            other => panic!("expected an assertion, got {other:?}"),
        }
    }

    #[test]
    fn parses_credentials_with_roles() {
        let h = headers(&[
            (UNIVERSAL_ID_HEADER, "jdoe"),
            (CREDENTIALS_HEADER, "PROXY01 FR;admin_none;service_support"),
            (GIVEN_NAME_HEADER, "John"),
            (SURNAME_HEADER, "Doe"),
        ]);
        let a = asserted(SsoHeaderExtractor.extract(&h, None));
        assert_eq!(a.login, "jdoe");
        assert_eq!(a.scope.as_deref(), Some("FR"));
        assert_eq!(a.roles, vec!["admin_none", "service_support"]);
        assert_eq!(a.first_name.as_deref(), Some("John"));
        assert_eq!(a.last_name.as_deref(), Some("Doe"));
    }

    #[test]
    fn falls_back_to_application_roles() {
        // credentials carries only the scope; roles come from the fallback
        // header, one proxy prefix per token
        let h = headers(&[
            (UNIVERSAL_ID_HEADER, "jdoe"),
            (CREDENTIALS_HEADER, "PROXY01 FR"),
            (APPLICATION_ROLES_HEADER, "PROXY01 admin_none,PROXY01 service_support"),
        ]);
        let a = asserted(SsoHeaderExtractor.extract(&h, None));
        assert_eq!(a.scope.as_deref(), Some("FR"));
        assert_eq!(a.roles, vec!["admin_none", "service_support"]);
    }

    #[test]
    fn application_roles_without_credentials_header() {
        let h = headers(&[
            (UNIVERSAL_ID_HEADER, "root"),
            (APPLICATION_ROLES_HEADER, "PROXY01 admin_allmco"),
        ]);
        let a = asserted(SsoHeaderExtractor.extract(&h, None));
        assert!(a.scope.is_none());
        assert_eq!(a.roles, vec!["admin_allmco"]);
    }

    #[test]
    fn missing_universal_id_is_an_extraction_error() {
        let h = headers(&[(CREDENTIALS_HEADER, "PROXY01 FR;admin_none;x")]);
        let err = SsoHeaderExtractor.extract(&h, None).unwrap_err();
        assert!(matches!(err, GateError::Extraction { .. }));
        assert!(err.message().contains(UNIVERSAL_ID_HEADER));

        // blank counts as absent too
        let h = headers(&[(UNIVERSAL_ID_HEADER, "  ")]);
        assert!(SsoHeaderExtractor.extract(&h, None).is_err());
    }

    #[test]
    fn no_roles_anywhere_is_an_extraction_error() {
        let h = headers(&[(UNIVERSAL_ID_HEADER, "jdoe"), (CREDENTIALS_HEADER, "PROXY01 FR")]);
        let err = SsoHeaderExtractor.extract(&h, None).unwrap_err();
        assert!(err.message().contains(APPLICATION_ROLES_HEADER));
    }

    #[test]
    fn unchanged_identity_short_circuits() {
        let h = headers(&[
            (UNIVERSAL_ID_HEADER, "jdoe"),
            (CREDENTIALS_HEADER, "PROXY01 fr;admin_none;service_support"),
        ]);
        // scope case differs (bound principal is uppercased); still unchanged
        let cur = principal("jdoe", Some("FR"));
        assert!(matches!(
            SsoHeaderExtractor.extract(&h, Some(&cur)).unwrap(),
            Extraction::Unchanged
        ));
    }

    #[test]
    fn changed_login_or_scope_re_extracts() {
        let h = headers(&[
            (UNIVERSAL_ID_HEADER, "jdoe"),
            (CREDENTIALS_HEADER, "PROXY01 FR;admin_none;service_support"),
        ]);
        let other_user = principal("asmith", Some("FR"));
        assert!(matches!(
            SsoHeaderExtractor.extract(&h, Some(&other_user)).unwrap(),
            Extraction::Asserted(_)
        ));
        let other_scope = principal("jdoe", Some("UK"));
        assert!(matches!(
            SsoHeaderExtractor.extract(&h, Some(&other_scope)).unwrap(),
            Extraction::Asserted(_)
        ));
    }

    #[test]
    fn prefix_stripping() {
        assert_eq!(strip_proxy_prefix("PROXY01 FR;a;b"), "FR;a;b");
        assert_eq!(strip_proxy_prefix("no-prefix"), "no-prefix");
        assert_eq!(strip_proxy_prefix("two words here"), "words here");
    }
}
