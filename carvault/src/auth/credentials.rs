//! Locating a candidate session token in an inbound request.
//!
//! The session cookie is consulted first; the `Authorization: Bearer` header is only used when no
//! usable cookie is present. A cookie carrying the logged-out sentinel counts as absent.

use axum::http::{HeaderMap, header};

use crate::config::SessionConfig;

/// Return the token presented with the request, if any.
///
/// Absence is not an error: callers decide whether a credential is required.
pub fn extract(headers: &HeaderMap, session: &SessionConfig) -> Option<String> {
    from_cookie(headers, session).or_else(|| from_bearer(headers))
}

fn from_cookie(headers: &HeaderMap, session: &SessionConfig) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == session.cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty() && *value != session.logged_out_value)
        .map(str::to_string)
}

fn from_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_no_credentials() {
        assert_eq!(extract(&HeaderMap::new(), &SessionConfig::default()), None);
    }

    #[test]
    fn test_cookie_only() {
        let h = headers(&[(header::COOKIE, "theme=dark; jwt=abc.def.ghi")]);
        assert_eq!(extract(&h, &SessionConfig::default()).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_only() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract(&h, &SessionConfig::default()).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_takes_precedence_over_header() {
        let h = headers(&[
            (header::COOKIE, "jwt=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(extract(&h, &SessionConfig::default()).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_sentinel_cookie_falls_back_to_header() {
        let h = headers(&[
            (header::COOKIE, "jwt=loggedout"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(extract(&h, &SessionConfig::default()).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_sentinel_cookie_alone_is_absent() {
        let h = headers(&[(header::COOKIE, "jwt=loggedout")]);
        assert_eq!(extract(&h, &SessionConfig::default()), None);
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract(&h, &SessionConfig::default()), None);

        let h = headers(&[(header::AUTHORIZATION, "Bearer ")]);
        assert_eq!(extract(&h, &SessionConfig::default()), None);
    }

    #[test]
    fn test_custom_cookie_name() {
        let session = SessionConfig {
            cookie_name: "session".to_string(),
            ..Default::default()
        };
        let h = headers(&[(header::COOKIE, "jwt=ignored; session=token")]);
        assert_eq!(extract(&h, &session).as_deref(), Some("token"));
    }

    #[test]
    fn test_non_utf8_header_is_absent() {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_bytes(b"jwt=\xff\xfe").unwrap());
        assert_eq!(extract(&h, &SessionConfig::default()), None);
    }
}
