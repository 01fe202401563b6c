//! Error types for bundle construction and forwarding.
//!
//! Every error carries a stable numeric code and an [`ErrorKind`]:
//! - Construction errors are all `InvalidArgument`; the caller fixes the
//!   specification (or checkpoint) and tries again.
//! - Runtime misuse of a built bundle is `InvalidArgument` or
//!   `FailedPrecondition`.
//! - Failures inside a nested mechanism or the host are `Internal`.

use dpb_config::ValidationError;
use dpb_state::StateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parameter::DataType;

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used by callers to decide what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The specification, checkpoint, or inputs are wrong.
    InvalidArgument,
    /// The operation is not allowed in the bundle's current state.
    FailedPrecondition,
    /// A collaborator failed.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "invalid_argument"),
            ErrorKind::FailedPrecondition => write!(f, "failed_precondition"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Unified error type for the bundle core.
#[derive(Error, Debug)]
pub enum Error {
    // Specification errors (10-19)
    #[error("expected at least one nested mechanism spec, got none")]
    EmptyNestedSpecs,

    #[error("failed to resolve nested mechanism {index} '{identifier}': {reason}")]
    Resolution {
        index: usize,
        identifier: String,
        reason: String,
    },

    #[error(
        "expected all nested mechanisms to be differentially private, \
         got '{identifier}' at index {index}"
    )]
    NotDifferentiallyPrivate { index: usize, identifier: String },

    #[error("expected 2 parameters (epsilon, delta), got {actual}")]
    ParameterCount { actual: usize },

    #[error("{name} must be numerical, got {dtype}")]
    NonNumericParameter { name: &'static str, dtype: DataType },

    #[error("epsilon must be positive, but got {value}")]
    NonPositiveEpsilon { value: f64 },

    #[error("delta must be non-negative and less than 1, but got {value}")]
    DeltaOutOfRange { value: f64 },

    #[error("unknown mechanism identifier '{identifier}'")]
    UnknownMechanism { identifier: String },

    #[error("mechanism identifier '{identifier}' is already registered")]
    DuplicateMechanism { identifier: String },

    // Checkpoint errors (20-29)
    #[error("persisted state does not match specification: {0}")]
    StateMismatch(String),

    #[error("invalid persisted state: {0}")]
    State(#[from] StateError),

    // Forwarding errors (30-39)
    #[error("expected {expected} input values, got {actual}")]
    InputCount { expected: usize, actual: usize },

    #[error("incompatible bundles: {0}")]
    Incompatible(String),

    #[error("bundle cannot report: {0}")]
    NotReportable(String),

    #[error("nested mechanism failed: {0}")]
    Mechanism(String),

    #[error("input counter overflow: {current} + {added} exceeds u64")]
    CounterOverflow { current: u64, added: u64 },

    // Configuration and I/O errors (40-49)
    #[error("configuration error: {0}")]
    Config(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code.
    ///
    /// - 10-19: specification errors
    /// - 20-29: checkpoint errors
    /// - 30-39: forwarding errors
    /// - 40-49: configuration and I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::EmptyNestedSpecs => 10,
            Error::Resolution { .. } => 11,
            Error::NotDifferentiallyPrivate { .. } => 12,
            Error::ParameterCount { .. } => 13,
            Error::NonNumericParameter { .. } => 14,
            Error::NonPositiveEpsilon { .. } => 15,
            Error::DeltaOutOfRange { .. } => 16,
            Error::UnknownMechanism { .. } => 17,
            Error::DuplicateMechanism { .. } => 18,
            Error::StateMismatch(_) => 20,
            Error::State(_) => 21,
            Error::InputCount { .. } => 30,
            Error::Incompatible(_) => 31,
            Error::NotReportable(_) => 32,
            Error::Mechanism(_) => 33,
            Error::CounterOverflow { .. } => 34,
            Error::Config(_) => 40,
            Error::Io(_) => 41,
            Error::Json(_) => 42,
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyNestedSpecs
            | Error::Resolution { .. }
            | Error::NotDifferentiallyPrivate { .. }
            | Error::ParameterCount { .. }
            | Error::NonNumericParameter { .. }
            | Error::NonPositiveEpsilon { .. }
            | Error::DeltaOutOfRange { .. }
            | Error::UnknownMechanism { .. }
            | Error::DuplicateMechanism { .. }
            | Error::StateMismatch(_)
            | Error::State(_)
            | Error::InputCount { .. }
            | Error::Incompatible(_)
            | Error::Config(_)
            | Error::Json(_) => ErrorKind::InvalidArgument,

            Error::NotReportable(_) | Error::CounterOverflow { .. } => {
                ErrorKind::FailedPrecondition
            }

            Error::Mechanism(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller can fix this by correcting its own input.
    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }
}
