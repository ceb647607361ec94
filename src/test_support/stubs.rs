use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::platform::runtime::sleep;
use crate::rest::error::{transport_error, RestResult};
use crate::rest::{ApiRequest, ApiResponse, ErrorReporter, HttpTransport, ReportContext};

/// Canned outcome returned by [`StubTransport`].
#[derive(Clone, Debug)]
pub enum StubReply {
    Response(ApiResponse),
    Fail(String),
}

impl StubReply {
    pub fn json(status: u16, body: JsonValue) -> Self {
        StubReply::Response(ApiResponse::new(status, body.to_string()))
    }

    pub fn raw(status: u16, body: &str) -> Self {
        StubReply::Response(ApiResponse::new(status, body.to_string()))
    }

    pub fn fail(message: &str) -> Self {
        StubReply::Fail(message.to_string())
    }
}

/// In-memory transport answering by exact URL, falling back to a default reply.
pub struct StubTransport {
    replies: Mutex<HashMap<String, StubReply>>,
    default_reply: Mutex<StubReply>,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Mutex<Duration>,
}

impl StubTransport {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(HashMap::new()),
            default_reply: Mutex::new(StubReply::json(200, serde_json::json!({}))),
            requests: Mutex::new(Vec::new()),
            delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn set_reply(&self, url: &str, reply: StubReply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn set_default(&self, reply: StubReply) {
        *self.default_reply.lock().unwrap() = reply;
    }

    /// Delays every response, so concurrent callers overlap.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url == url)
            .count()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl HttpTransport for StubTransport {
    async fn send(&self, request: ApiRequest) -> RestResult<ApiResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let delay = *self.delay.lock().unwrap();
        sleep(delay).await;

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| self.default_reply.lock().unwrap().clone());

        match reply {
            StubReply::Response(response) => Ok(response),
            StubReply::Fail(message) => Err(transport_error(message)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecordedReport {
    pub message: String,
    pub context: ReportContext,
}

/// Reporter that keeps every report for later inspection.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<RecordedReport>>,
}

impl RecordingReporter {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reports(&self) -> Vec<RecordedReport> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &dyn Error, context: &ReportContext) {
        self.reports.lock().unwrap().push(RecordedReport {
            message: error.to_string(),
            context: context.clone(),
        });
    }
}
