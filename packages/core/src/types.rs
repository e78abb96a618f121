use std::fmt;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RequestError;

/// HTTP method for requests
///
/// | Verb   | Meaning                   | Documented success |
/// |--------|---------------------------|--------------------|
/// | GET    | Select one or more items  | 200                |
/// | POST   | Create a new item         | 201                |
/// | PUT    | Update an item            | 200                |
/// | DELETE | Delete an item            | 200 or 204         |
///
/// The success codes are informational. Status validation always uses the
/// accepted range supplied to the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
}

impl Method {
    /// Parse an uppercase method name.
    pub fn parse(method: &str) -> Result<Self, RequestError> {
        match method {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            other => Err(RequestError::InvalidMethod {
                method: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        }
    }

    /// Status codes a well-behaved server returns on success for this verb.
    pub fn documented_success_codes(&self) -> &'static [u16] {
        match self {
            Method::GET => &[200],
            Method::POST => &[201],
            Method::PUT => &[200],
            Method::DELETE => &[200, 204],
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// A single `name[=value]` pair of a query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl QueryItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A bare key with no `=value` part.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// How the transport may use its local response cache for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Let the transport decide.
    #[default]
    UseProtocolDefault,
    /// Ignore any cached copy and always hit the network.
    ReloadIgnoringLocalCache,
    /// Serve only from the cache; never hit the network.
    ReturnCacheDataDontLoad,
}

/// An outbound HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub cache_policy: CachePolicy,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            cache_policy: CachePolicy::default(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: Url) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Set a header, replacing any existing value under the same name.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), RequestError> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, RequestError> {
        self.set_header(name, value)?;
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `body` as JSON and mark the request as carrying JSON.
    pub fn with_json_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, RequestError> {
        let encoded = serde_json::to_vec(body)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Bytes::from(encoded));
        Ok(self)
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// HTTP response as handed back by a transport
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Raw body bytes
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://api.example.com/titles").unwrap()
    }

    #[test]
    fn method_parse_accepts_known_verbs() {
        assert_eq!(Method::parse("GET").unwrap(), Method::GET);
        assert_eq!(Method::parse("DELETE").unwrap(), Method::DELETE);
    }

    #[test]
    fn method_parse_rejects_unknown_verb() {
        let err = Method::parse("PATCH").unwrap_err();
        assert!(matches!(err, RequestError::InvalidMethod { method } if method == "PATCH"));
    }

    #[test]
    fn method_documented_success_codes() {
        assert_eq!(Method::GET.documented_success_codes(), &[200]);
        assert_eq!(Method::POST.documented_success_codes(), &[201]);
        assert_eq!(Method::PUT.documented_success_codes(), &[200]);
        assert_eq!(Method::DELETE.documented_success_codes(), &[200, 204]);
    }

    #[test]
    fn method_converts_to_http_method() {
        let method: http::Method = Method::PUT.into();
        assert_eq!(method, http::Method::PUT);
    }

    #[test]
    fn method_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Method::POST).unwrap(), "\"POST\"");
    }

    #[test]
    fn request_defaults() {
        let request = HttpRequest::get(url());
        assert_eq!(request.method, Method::GET);
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
        assert_eq!(request.cache_policy, CachePolicy::UseProtocolDefault);
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let request = HttpRequest::get(url())
            .with_header("X-Api-Key", "one")
            .unwrap()
            .with_header("x-api-key", "two")
            .unwrap();
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("X-API-KEY"), Some("two"));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let err = HttpRequest::get(url()).with_header("bad header", "v").unwrap_err();
        assert!(matches!(err, RequestError::InvalidHeaderName(_)));
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let err = HttpRequest::get(url()).with_header("x-ok", "line\nbreak").unwrap_err();
        assert!(matches!(err, RequestError::InvalidHeaderValue(_)));
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = HttpRequest::post(url())
            .with_json_body(&serde_json::json!({"name": "test"}))
            .unwrap();
        assert_eq!(request.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "test"}));
    }

    #[test]
    fn response_status_classes() {
        assert!(HttpResponse::new(204, "").is_success());
        assert!(HttpResponse::new(404, "").is_client_error());
        assert!(HttpResponse::new(503, "").is_server_error());
        assert!(!HttpResponse::new(302, "").is_success());
    }
}
