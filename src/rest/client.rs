use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::rest::error::{decode_error, http_status_error, RestError, RestResult};
use crate::rest::reporter::{ErrorReporter, ReportContext};
use crate::rest::request::{ApiRequest, ApiResponse, FetchOptions};
use crate::rest::transport::HttpTransport;

/// Path segment inserted between the API base URL and the request path.
pub const API_PATH_PREFIX: &str = "api";
/// Header injected when a request asks for a forced refresh.
pub const FORCE_REFRESH_HEADER: &str = "cache-control";
pub const FORCE_REFRESH_VALUE: &str = "no-cache";
/// Default timeout applied to every request (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON fetch client for the profile backend.
///
/// [`fetch_api`](Self::fetch_api) never fails: transport errors and non-success statuses
/// are handed to the [`ErrorReporter`] and resolve to `None`, undecodable bodies resolve
/// to `None` without a report.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    reporter: Arc<dyn ErrorReporter>,
    api_base_url: String,
    timeout: Duration,
}

struct Failure {
    error: RestError,
    context: ReportContext,
}

impl ApiClient {
    pub fn new(
        api_base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            transport,
            reporter,
            api_base_url: api_base_url.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.reporter
    }

    /// Resolves the absolute URL for `path`.
    ///
    /// With a host override the result is `{host}/{path}`, otherwise
    /// `{api_base_url}/api/{path}`. A leading slash on `path` is ignored.
    pub fn build_url(&self, path: &str, host: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match host {
            Some(host) => format!("{}/{}", host.trim_end_matches('/'), path),
            None => format!(
                "{}/{}/{}",
                self.api_base_url.trim_end_matches('/'),
                API_PATH_PREFIX,
                path
            ),
        }
    }

    fn build_request(&self, path: &str, options: &FetchOptions) -> ApiRequest {
        let mut headers: BTreeMap<String, String> = options
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        headers
            .entry("accept".to_string())
            .or_insert_with(|| "application/json".to_string());
        if options.body.is_some() {
            headers
                .entry("content-type".to_string())
                .or_insert_with(|| "application/json".to_string());
        }
        if options.force_refresh {
            headers.insert(
                FORCE_REFRESH_HEADER.to_string(),
                FORCE_REFRESH_VALUE.to_string(),
            );
        }

        ApiRequest {
            url: self.build_url(path, options.host.as_deref()),
            method: options.method,
            headers,
            body: options.body.clone(),
            mode: options.mode,
            timeout: self.timeout,
        }
    }

    async fn dispatch(&self, path: &str, options: FetchOptions) -> Result<ApiResponse, Failure> {
        let request = self.build_request(path, &options);
        let mut context = ReportContext {
            url: request.url.clone(),
            method: request.method,
            status: None,
            response: None,
            options,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(error) => return Err(Failure { error, context }),
        };

        if !response.is_success() {
            context.status = Some(response.status);
            context.response = Some(response.body_text());
            return Err(Failure {
                error: http_status_error(response.status, &context.url),
                context,
            });
        }

        Ok(response)
    }

    /// Performs the request and surfaces every failure as an error.
    pub async fn try_fetch_api<T>(&self, path: &str, options: FetchOptions) -> RestResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .dispatch(path, options)
            .await
            .map_err(|failure| failure.error)?;
        serde_json::from_slice::<T>(&response.body)
            .map_err(|err| decode_error(format!("failed to decode response body: {err}")))
    }

    /// Best-effort fetch: returns the decoded payload or `None`.
    pub async fn fetch_api<T>(&self, path: &str, options: FetchOptions) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let response = match self.dispatch(path, options).await {
            Ok(response) => response,
            Err(Failure { error, context }) => {
                self.reporter.report(&error, &context);
                return None;
            }
        };

        match serde_json::from_slice::<T>(&response.body) {
            Ok(value) => Some(value),
            Err(err) => {
                log::debug!("discarding undecodable response for `{path}`: {err}");
                None
            }
        }
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
