//! Shared error type across promkit crates.

use std::fmt;

use thiserror::Error;

/// Stable error codes, usable for matching without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A label name fails the `[a-zA-Z_][a-zA-Z0-9_]*` pattern.
    InvalidLabelName,
    /// Label names differ from the schema fixed at instrument creation.
    LabelMismatch,
    /// Caller supplied one of the service tag names (`app`, `env`).
    ReservedLabel,
    /// The exposition registry refused the instrument (e.g. name reused across kinds).
    Registration,
    /// Any other validation failure raised by the metrics backend.
    Validation,
    /// Invalid configuration.
    Config,
    /// HTTP bind/serve/fetch failure.
    Transport,
    /// Malformed exposition text.
    Parse,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidLabelName => "INVALID_LABEL_NAME",
            ErrorCode::LabelMismatch => "LABEL_MISMATCH",
            ErrorCode::ReservedLabel => "RESERVED_LABEL",
            ErrorCode::Registration => "REGISTRATION",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Parse => "PARSE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Structured description of a rejected metric update.
///
/// Rendered as a single line:
/// `metric: '<name>', error: '<detail>', input label names: '<a, b>'`
/// with a trailing `, correct label names: '<x, y>'` when the registered
/// label names could be recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure {
    pub code: ErrorCode,
    pub metric: String,
    pub detail: String,
    /// Sorted.
    pub input_label_names: Vec<String>,
    /// Sorted; empty when unknown.
    pub correct_label_names: Vec<String>,
}

impl fmt::Display for UpdateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "metric: '{}', error: '{}', input label names: '{}'",
            self.metric,
            self.detail,
            self.input_label_names.join(", ")
        )?;
        if !self.correct_label_names.is_empty() {
            write!(
                f,
                ", correct label names: '{}'",
                self.correct_label_names.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("{0}")]
    Update(Box<UpdateFailure>),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricsError::Update(f) => f.code,
            MetricsError::Config(_) => ErrorCode::Config,
            MetricsError::Transport(_) => ErrorCode::Transport,
            MetricsError::Parse(_) => ErrorCode::Parse,
            MetricsError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// The structured failure, if this error came from an update call.
    pub fn as_update(&self) -> Option<&UpdateFailure> {
        match self {
            MetricsError::Update(f) => Some(f),
            _ => None,
        }
    }
}

impl From<UpdateFailure> for MetricsError {
    fn from(f: UpdateFailure) -> Self {
        MetricsError::Update(Box::new(f))
    }
}
