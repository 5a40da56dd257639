//! Forecast error model.

use thiserror::Error;

use crate::tag::Tag;

/// Result type used across the forecasting pipeline.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Forecasting failure.
///
/// Every variant is fatal for the call that produced it: nothing in the
/// pipeline retries or recovers locally. An empty forecast window is *not* an
/// error and never shows up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// The model artifact is missing, unreadable, corrupt or shape-incompatible.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// The history store was unreachable or rejected the query.
    #[error("data source failed: {0}")]
    DataSource(String),

    /// Fewer dense rows than the lookback window needs.
    #[error("insufficient history: need {required} rows, have {available} (short by {})", .required - .available)]
    InsufficientHistory { required: usize, available: usize },

    /// A tag has no readings at all, so its column cannot be filled.
    #[error("no readings for tag `{0}`")]
    EmptyChannel(Tag),

    /// Retrieved history violates the wide-series invariants (e.g. duplicate samples).
    #[error("invalid history: {0}")]
    InvalidHistory(String),

    /// The model produced output that cannot be turned into a forecast.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The caller-supplied deadline elapsed before the forecast completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A prediction command string could not be parsed.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A request was malformed (bad timestamp, bad parameter).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ForecastError {
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    pub fn invalid_history(msg: impl Into<String>) -> Self {
        Self::InvalidHistory(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Stable machine-readable code for the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelLoad(_) => "model_load_error",
            Self::DataSource(_) => "data_source_error",
            Self::InsufficientHistory { .. } => "insufficient_history",
            Self::EmptyChannel(_) => "empty_channel",
            Self::InvalidHistory(_) => "invalid_history",
            Self::Inference(_) => "inference_error",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::InvalidCommand(_) => "invalid_command",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}
