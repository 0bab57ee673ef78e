//! Turns rejected updates into structured `UpdateFailure`s.
//!
//! The registered label names are recovered from the live exposition text
//! rather than from the registry, so the report shows exactly what a scraper
//! sees for that metric. Both name lists leave out the service tags: callers
//! never pass `app`/`env` themselves.

use promkit_core::error::{ErrorCode, MetricsError, UpdateFailure};
use promkit_core::exposition::{grep_lines, labels_of};
use promkit_core::labels::{sorted_names, RESERVED_LABELS};

use crate::obs::ExpositionSource;

pub struct ErrorReporter<S> {
    source: S,
}

impl<S: ExpositionSource> ErrorReporter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Build the error for a rejected update of `metric`.
    ///
    /// `correct_label_names` stays empty until the metric has at least one
    /// series in the exposition text.
    pub fn report(
        &self,
        code: ErrorCode,
        detail: impl Into<String>,
        metric: &str,
        input_label_names: Vec<String>,
    ) -> MetricsError {
        let failure = UpdateFailure {
            code,
            metric: metric.to_string(),
            detail: detail.into(),
            input_label_names: sorted_names(input_label_names),
            correct_label_names: self.registered_label_names(metric),
        };
        tracing::warn!(metric, code = code.as_str(), error = %failure, "metric update rejected");
        failure.into()
    }

    /// [`ErrorReporter::report`] for an error raised by the metrics backend.
    pub fn report_backend(
        &self,
        err: &prometheus::Error,
        metric: &str,
        input_label_names: Vec<String>,
    ) -> MetricsError {
        self.report(classify(err), err.to_string(), metric, input_label_names)
    }

    fn registered_label_names(&self, metric: &str) -> Vec<String> {
        match self.source.exposition_text() {
            Ok(text) => labels_of(&grep_lines(metric, &text), metric)
                .names()
                .into_iter()
                .filter(|n| !RESERVED_LABELS.contains(&n.as_str()))
                .collect(),
            Err(e) => {
                tracing::debug!(metric, error = %e, "label recovery skipped");
                Vec::new()
            }
        }
    }
}

/// Map a backend error onto a stable code.
pub fn classify(err: &prometheus::Error) -> ErrorCode {
    match err {
        prometheus::Error::InconsistentCardinality { .. } => ErrorCode::LabelMismatch,
        prometheus::Error::AlreadyReg => ErrorCode::Registration,
        prometheus::Error::Msg(msg) if msg.contains("previously registered") => {
            ErrorCode::Registration
        }
        prometheus::Error::Msg(msg) if msg.contains("not a valid label name") => {
            ErrorCode::InvalidLabelName
        }
        prometheus::Error::Msg(msg) if msg.contains("missing in label map") => {
            ErrorCode::LabelMismatch
        }
        _ => ErrorCode::Validation,
    }
}
