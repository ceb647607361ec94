use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureFlagsErrorCode {
    InvalidArgument,
    InvalidPayload,
    Internal,
}

impl FeatureFlagsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureFlagsErrorCode::InvalidArgument => "feature-flags/invalid-argument",
            FeatureFlagsErrorCode::InvalidPayload => "feature-flags/invalid-payload",
            FeatureFlagsErrorCode::Internal => "feature-flags/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FeatureFlagsError {
    pub code: FeatureFlagsErrorCode,
    message: String,
}

impl FeatureFlagsError {
    pub fn new(code: FeatureFlagsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for FeatureFlagsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for FeatureFlagsError {}

pub type FlagsResult<T> = Result<T, FeatureFlagsError>;

pub fn invalid_argument(message: impl Into<String>) -> FeatureFlagsError {
    FeatureFlagsError::new(FeatureFlagsErrorCode::InvalidArgument, message)
}

pub fn invalid_payload(message: impl Into<String>) -> FeatureFlagsError {
    FeatureFlagsError::new(FeatureFlagsErrorCode::InvalidPayload, message)
}

pub fn internal_error(message: impl Into<String>) -> FeatureFlagsError {
    FeatureFlagsError::new(FeatureFlagsErrorCode::Internal, message)
}
