//! Error taxonomy for the orchestration core.
//!
//! Separate enums per concern so callers match on exactly the failures
//! their screen can produce. Nothing here is fatal — every variant maps
//! to a stable, re-enterable UI state.

use thiserror::Error;

use crate::models::HistoryKind;

/// A single gateway request failure.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport-level failure (connect, timeout, DNS, broken pipe).
    #[error("network error: {0}")]
    Network(String),

    /// The gateway answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// The body did not match the endpoint's response schema.
    #[error("response parsing error: {0}")]
    ResponseParsing(String),
}

impl GatewayError {
    /// Classify a reqwest error into the transport variant.
    ///
    /// Every reqwest failure short of a readable status line is a
    /// `Network` error — the coordinator treats them uniformly.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Network(format!("connection failed: {e}"))
        } else if e.is_timeout() {
            Self::Network(format!("request timed out: {e}"))
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Failures surfaced by the history board.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// One or more of the concurrent history fetches failed, so none of
    /// the collections were updated.
    #[error("could not load history ({} of 3 requests failed)", .failures.len())]
    Aggregate {
        failures: Vec<(HistoryKind, GatewayError)>,
    },

    /// A delete request failed; the local collection was left untouched.
    #[error("could not delete record: {0}")]
    Delete(#[source] GatewayError),
}

/// Failures surfaced by the prediction flow.
#[derive(Error, Debug)]
pub enum PredictError {
    /// Local precondition: submission requires at least one symptom.
    /// Shown inline; no request is issued.
    #[error("select at least one symptom before analyzing")]
    EmptySelection,

    /// The prediction request failed; the selection was preserved.
    #[error("prediction request failed: {0}")]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_message_counts_failures() {
        let err = HistoryError::Aggregate {
            failures: vec![
                (
                    HistoryKind::Symptom,
                    GatewayError::Server {
                        status: 500,
                        body: String::new(),
                    },
                ),
                (HistoryKind::Diet, GatewayError::Network("refused".into())),
            ],
        };
        assert_eq!(
            err.to_string(),
            "could not load history (2 of 3 requests failed)"
        );
    }

    #[test]
    fn server_error_carries_status() {
        let err = GatewayError::Server {
            status: 403,
            body: "Unauthorized".into(),
        };
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn empty_selection_is_inline_message() {
        let err = PredictError::EmptySelection;
        assert!(err.to_string().contains("at least one symptom"));
    }

    #[test]
    fn delete_error_preserves_source() {
        use std::error::Error as _;
        let err = HistoryError::Delete(GatewayError::Network("down".into()));
        assert!(err.source().is_some());
    }
}
