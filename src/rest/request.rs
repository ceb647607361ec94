//! Request and response shapes shared by the fetch client and its transports.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value as JsonValue;

/// HTTP verbs supported by the fetch client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser fetch mode. Only meaningful for wasm builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
    SameOrigin,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Cors => "cors",
            RequestMode::NoCors => "no-cors",
            RequestMode::SameOrigin => "same-origin",
        }
    }
}

/// Caller-facing options accepted by [`ApiClient::fetch_api`](crate::rest::ApiClient::fetch_api).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchOptions {
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<JsonValue>,
    pub mode: Option<RequestMode>,
    /// Sends the request to `{host}/{path}` instead of the configured API base.
    pub host: Option<String>,
    /// Adds a cache-busting header to the outgoing request.
    pub force_refresh: bool,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Header names are stored lowercase so a later header replaces an earlier one
    /// regardless of case.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }
}

/// Fully resolved request handed to an [`HttpTransport`](crate::rest::HttpTransport).
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<JsonValue>,
    pub mode: Option<RequestMode>,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Lossy UTF-8 view of the body, used for diagnostics.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let request = ApiRequest {
            url: "https://example.com".into(),
            method: HttpMethod::Get,
            headers: BTreeMap::from([("Cache-Control".to_string(), "no-cache".to_string())]),
            body: None,
            mode: None,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(request.header("cache-control"), Some("no-cache"));
        assert_eq!(request.header("accept"), None);
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(304, "").is_success());
        assert!(!ApiResponse::new(500, "").is_success());
    }

    #[test]
    fn options_builder_sets_fields() {
        let options = FetchOptions::new()
            .with_method(HttpMethod::Post)
            .with_host("https://override.example")
            .with_force_refresh(true)
            .with_header("x-trace", "1");
        assert_eq!(options.method, HttpMethod::Post);
        assert_eq!(options.host.as_deref(), Some("https://override.example"));
        assert!(options.force_refresh);
        assert_eq!(options.headers.get("x-trace").map(String::as_str), Some("1"));
    }

    #[test]
    fn header_names_are_lowercased() {
        let options = FetchOptions::new()
            .with_header("Accept", "text/plain")
            .with_header("ACCEPT", "text/csv");
        assert_eq!(options.headers.len(), 1);
        assert_eq!(options.headers.get("accept").map(String::as_str), Some("text/csv"));
    }
}
