//! Generic JSON fetch client for the profile backend REST APIs.
mod client;
pub mod error;
pub mod reporter;
pub mod request;
pub mod transport;

pub use client::{
    ApiClient, API_PATH_PREFIX, DEFAULT_REQUEST_TIMEOUT, FORCE_REFRESH_HEADER,
    FORCE_REFRESH_VALUE,
};
pub use reporter::{ErrorReporter, LogErrorReporter, NoopErrorReporter, ReportContext};
pub use request::{ApiRequest, ApiResponse, FetchOptions, HttpMethod, RequestMode};
pub use transport::{HttpTransport, ReqwestTransport};
