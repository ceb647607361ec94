//! Error reporting hook invoked when a request cannot produce data.

use std::error::Error;

use crate::rest::request::{FetchOptions, HttpMethod};

/// Metadata describing the request that failed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportContext {
    pub url: String,
    pub method: HttpMethod,
    /// Status code, when the backend answered.
    pub status: Option<u16>,
    /// Response body as text, when the backend answered.
    pub response: Option<String>,
    pub options: FetchOptions,
}

/// Receives failures from the fetch client and the flag service.
///
/// Implementations must not panic; reporting is best-effort.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &dyn Error, context: &ReportContext);
}

/// Default reporter forwarding failures to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogErrorReporter;

impl ErrorReporter for LogErrorReporter {
    fn report(&self, error: &dyn Error, context: &ReportContext) {
        match context.status {
            Some(status) => log::error!(
                "{} {} failed with status {status}: {error}",
                context.method,
                context.url
            ),
            None => log::error!("{} {} failed: {error}", context.method, context.url),
        }
    }
}

/// Reporter that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopErrorReporter;

impl ErrorReporter for NoopErrorReporter {
    fn report(&self, error: &dyn Error, context: &ReportContext) {
        let _ = (error, context);
    }
}
