// crates/quill-rpc/src/middleware.rs
//
// Request preprocessing shared by all handlers: query and cookie parsing,
// caller identification, and request logging.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http::header::{AUTHORIZATION, COOKIE};
use http::{HeaderMap, Method, StatusCode, Uri};

use quill_core::identity::Caller;
use quill_federation::ConnectionEstablisher;

/// Name of the cookie that persists the visitor's claimed home origin.
pub const AS_COOKIE: &str = "as";

/// A request after preprocessing, as handlers see it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    /// Computed once from the bearer token and the `as` cookie.
    pub caller: Caller,
    pub body: Bytes,
}

impl ApiRequest {
    pub fn from_parts(
        method: Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
        establisher: &ConnectionEstablisher,
    ) -> Self {
        let cookies = parse_cookies(headers);
        let caller = identify_caller(headers, &cookies, establisher);
        Self {
            method,
            path: uri.path().to_string(),
            query: parse_query(uri),
            cookies,
            caller,
            body,
        }
    }

    /// Non-empty query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Non-empty cookie value.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Decode the query string into a map. Repeated keys keep the last value.
pub fn parse_query(uri: &Uri) -> HashMap<String, String> {
    uri.query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// Parse every `Cookie` header into name/value pairs.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some((name, val)) = pair.trim().split_once('=') {
                cookies.insert(name.trim().to_string(), val.trim().to_string());
            }
        }
    }
    cookies
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Admin when the bearer token matches the admin secret, otherwise a
/// visitor whose home origin is whatever the `as` cookie claims.
pub fn identify_caller(
    headers: &HeaderMap,
    cookies: &HashMap<String, String>,
    establisher: &ConnectionEstablisher,
) -> Caller {
    if let Some(token) = bearer_token(headers) {
        if establisher.verify(token) {
            return Caller::Admin;
        }
        tracing::debug!("Ignoring bearer token that does not match the admin secret");
    }
    Caller::Visitor {
        home_origin: cookies
            .get(AS_COOKIE)
            .filter(|v| !v.trim().is_empty())
            .cloned(),
    }
}

/// `Set-Cookie` value persisting a claimed home origin.
pub fn as_cookie(origin: &str) -> String {
    format!("{}={}; Path=/; SameSite=Lax; HttpOnly", AS_COOKIE, origin)
}

/// One log line per request.
pub fn log_request(method: &Method, path: &str, status: StatusCode, elapsed: Duration) {
    if status.is_server_error() {
        tracing::warn!("{} {} -> {} ({:?})", method, path, status.as_u16(), elapsed);
    } else {
        tracing::info!("{} {} -> {} ({:?})", method, path, status.as_u16(), elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::traits::TrustStore;
    use std::sync::Arc;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, v.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_parse_query_decodes() {
        let uri: Uri = "/api/check-connection?origin=b.example%3A8080&x=1".parse().unwrap();
        let q = parse_query(&uri);
        assert_eq!(q["origin"], "b.example:8080");
        assert_eq!(q["x"], "1");
        assert!(parse_query(&"/health".parse().unwrap()).is_empty());
    }

    #[test]
    fn test_parse_cookies() {
        let h = headers(&[("cookie", "as=b.example; theme=dark"), ("cookie", "x=1")]);
        let c = parse_cookies(&h);
        assert_eq!(c["as"], "b.example");
        assert_eq!(c["theme"], "dark");
        assert_eq!(c["x"], "1");
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers(&[("authorization", "Bearer s3cret")])), Some("s3cret"));
        assert_eq!(bearer_token(&headers(&[("authorization", "Basic abc")])), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_as_cookie_attributes() {
        assert_eq!(
            as_cookie("b.example"),
            "as=b.example; Path=/; SameSite=Lax; HttpOnly"
        );
    }

    fn establisher(secret: &str) -> ConnectionEstablisher {
        let path = std::env::temp_dir().join(format!("quill_test_mw_{}", uuid::Uuid::now_v7()));
        let store: Arc<dyn TrustStore> =
            Arc::new(quill_store::RocksStore::open(&path.to_string_lossy()).unwrap());
        ConnectionEstablisher::new(store, secret)
    }

    #[test]
    fn test_identify_caller() {
        let est = establisher("s3cret");
        let mut cookies = HashMap::new();
        cookies.insert("as".to_string(), "b.example".to_string());

        let admin = identify_caller(&headers(&[("authorization", "Bearer s3cret")]), &cookies, &est);
        assert_eq!(admin, Caller::Admin);

        let visitor = identify_caller(&headers(&[("authorization", "Bearer wrong")]), &cookies, &est);
        assert_eq!(visitor.home_origin(), Some("b.example"));

        let anonymous = identify_caller(&HeaderMap::new(), &HashMap::new(), &est);
        assert_eq!(anonymous, Caller::Visitor { home_origin: None });
    }

    #[test]
    fn test_unset_secret_never_admin() {
        let est = establisher("");
        let caller = identify_caller(&headers(&[("authorization", "Bearer ")]), &HashMap::new(), &est);
        assert!(!caller.is_admin());
    }
}
