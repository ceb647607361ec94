use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestErrorCode {
    InvalidArgument,
    Transport,
    Timeout,
    HttpStatus,
    Decode,
    Internal,
}

impl RestErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestErrorCode::InvalidArgument => "rest/invalid-argument",
            RestErrorCode::Transport => "rest/transport",
            RestErrorCode::Timeout => "rest/timeout",
            RestErrorCode::HttpStatus => "rest/http-status",
            RestErrorCode::Decode => "rest/decode",
            RestErrorCode::Internal => "rest/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RestError {
    pub code: RestErrorCode,
    status: Option<u16>,
    message: String,
}

impl RestError {
    pub fn new(code: RestErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: None,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// HTTP status attached to the error, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for RestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for RestError {}

pub type RestResult<T> = Result<T, RestError>;

pub fn invalid_argument(message: impl Into<String>) -> RestError {
    RestError::new(RestErrorCode::InvalidArgument, message)
}

pub fn transport_error(message: impl Into<String>) -> RestError {
    RestError::new(RestErrorCode::Transport, message)
}

pub fn timeout_error(message: impl Into<String>) -> RestError {
    RestError::new(RestErrorCode::Timeout, message)
}

pub fn decode_error(message: impl Into<String>) -> RestError {
    RestError::new(RestErrorCode::Decode, message)
}

pub fn internal_error(message: impl Into<String>) -> RestError {
    RestError::new(RestErrorCode::Internal, message)
}

pub fn http_status_error(status: u16, url: &str) -> RestError {
    RestError {
        code: RestErrorCode::HttpStatus,
        status: Some(status),
        message: format!("request to {url} failed with status {status}"),
    }
}
