//! Error types for the Pinboard API client.
//!
//! # Design
//! Codec failures (`MalformedTimestamp`, `InvalidBooleanToken`,
//! `InvalidIntegerToken`) abort the decode of the whole response; no partial
//! entity is ever returned. Precondition failures (`ParameterCountViolation`,
//! `MissingRequiredSelector`) are raised while building a request, so no
//! network call happens. A mutation that the service did not confirm is a
//! plain `false`, not an error.

use thiserror::Error;

/// Errors returned while building requests or decoding responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A temporal field did not match the format expected for its context.
    #[error("malformed timestamp {value:?}: expected {format}")]
    MalformedTimestamp { value: String, format: &'static str },

    /// A boolean field was neither `yes` nor `no`.
    #[error("invalid boolean token {0:?}: expected \"yes\" or \"no\"")]
    InvalidBooleanToken(String),

    /// An integer field was not a plain decimal number.
    #[error("invalid integer token {0:?}")]
    InvalidIntegerToken(String),

    /// An input violated an operation's documented arity constraint.
    #[error("parameter {parameter} expects {min}..={max} values, got {actual}")]
    ParameterCountViolation {
        parameter: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    /// A tag was empty or held a space, so it would not survive the
    /// space-joined wire encoding as one tag.
    #[error("invalid tag {0:?}: tags must be non-empty and contain no spaces")]
    InvalidTag(String),

    /// None of the alternative selectors an operation needs was supplied.
    #[error("at least one of {0:?} must be supplied")]
    MissingRequiredSelector(&'static [&'static str]),

    /// The executor could not complete the exchange, or a read operation got
    /// a non-2xx status.
    #[error("transport failure{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    TransportFailure { status: Option<u16>, message: String },

    /// The response body did not have the shape the operation decodes.
    #[error("irregular payload shape: {0}")]
    IrregularPayloadShape(String),

    /// A parameter name with no codec registered for it.
    #[error("unknown parameter {0:?}")]
    UnknownParameter(String),

    /// A parameter value whose type does not fit the codec bound to its name.
    #[error("parameter {parameter} is bound to the {expected} codec")]
    CodecMismatch {
        parameter: &'static str,
        expected: &'static str,
    },

    /// Client or executor configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ApiError::TransportFailure {
            status: None,
            message: message.into(),
        }
    }

    pub(crate) fn payload(err: impl std::fmt::Display) -> Self {
        ApiError::IrregularPayloadShape(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failure_mentions_status_when_present() {
        let err = ApiError::TransportFailure {
            status: Some(503),
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "transport failure (HTTP 503): unavailable");
        assert_eq!(
            ApiError::transport("connection refused").to_string(),
            "transport failure: connection refused"
        );
    }

    #[test]
    fn parameter_count_violation_is_descriptive() {
        let err = ApiError::ParameterCountViolation {
            parameter: "tag",
            min: 1,
            max: 3,
            actual: 4,
        };
        assert_eq!(err.to_string(), "parameter tag expects 1..=3 values, got 4");
    }
}
