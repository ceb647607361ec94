//! Pluggable network layer used by [`ApiClient`](crate::rest::ApiClient).

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};

use crate::rest::error::{
    internal_error, invalid_argument, timeout_error, transport_error, RestError, RestResult,
};
use crate::rest::request::{ApiRequest, ApiResponse, HttpMethod};
#[cfg(target_arch = "wasm32")]
use crate::rest::request::RequestMode;

/// Abstraction over the HTTP stack.
///
/// Implementations return `Err` only when no response was received at all. Non-success
/// statuses are ordinary responses and are classified by the caller.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> RestResult<ApiResponse>;
}

/// `reqwest` backed transport.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> RestResult<Self> {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.user_agent(format!(
            "domain-profile-flags/{}",
            env!("CARGO_PKG_VERSION")
        ));
        let client = builder
            .build()
            .map_err(|err| internal_error(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn build_headers(request: &ApiRequest) -> RestResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in &request.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| invalid_argument(format!("invalid header name `{key}`: {err}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| invalid_argument(format!("invalid header value for `{key}`: {err}")))?;
        map.insert(name, header_value);
    }
    Ok(map)
}

fn map_reqwest_error(err: reqwest::Error) -> RestError {
    if err.is_timeout() {
        return timeout_error(format!("request timed out: {err}"));
    }
    if err.is_builder() {
        return invalid_argument(format!("malformed request: {err}"));
    }
    transport_error(format!("request failed: {err}"))
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> RestResult<ApiResponse> {
        let headers = build_headers(&request)?;
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url.as_str())
            .headers(headers);

        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(request.timeout);
        }

        #[cfg(target_arch = "wasm32")]
        if request.mode == Some(RequestMode::NoCors) {
            builder = builder.fetch_mode_no_cors();
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|err| {
            transport_error(format!("failed to read response body: {err}"))
        })?;

        Ok(ApiResponse { status, body })
    }
}
