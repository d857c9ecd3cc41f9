//! Core error types for the stereo pipeline configuration checker.
//!
//! This module defines the error taxonomy used throughout the validation
//! core: [`SchemaError`] for syntactic defects (a field's type, range,
//! presence or pairing rule is violated) and [`PipelineError`] for everything
//! a full validation pass can fail with, including illegal step orders and
//! the fatal unsupported-combination kind.

use thiserror::Error;

use crate::machine::State;

/// Errors raised when a configuration section violates its declared schema.
///
/// These are recoverable in principle: the caller can prompt for a corrected
/// configuration and re-run the check.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A field that no rule in the section's schema recognizes.
    #[error("unknown field '{field}' in section '{section}'")]
    UnknownField {
        /// The section being checked.
        section: String,
        /// The unrecognized field.
        field: String,
    },

    /// A required field is absent.
    #[error("missing required field '{field}' in section '{section}'")]
    MissingField {
        /// The section being checked.
        section: String,
        /// The missing field.
        field: String,
    },

    /// A field is present but its value has the wrong type or is out of range.
    #[error("invalid value for field '{field}' in section '{section}': expected {expected}, got {actual}")]
    InvalidField {
        /// The section being checked.
        section: String,
        /// The offending field.
        field: String,
        /// Description of the accepted values.
        expected: String,
        /// Rendering of the value that was supplied.
        actual: String,
    },

    /// A section could not be interpreted at all (wrong shape, unknown keys
    /// reported by the deserializer).
    #[error("invalid '{section}' section: {message}")]
    InvalidSection {
        /// The section being checked.
        section: String,
        /// The deserializer's diagnostic.
        message: String,
    },

    /// Two fields that form a pair do not have the same kind
    /// (integer bound vs grid path).
    #[error("fields '{first}' and '{second}' in section '{section}' must both be integers or both be grid paths")]
    MismatchedPair {
        /// The section being checked.
        section: String,
        /// First member of the pair.
        first: String,
        /// Second member of the pair.
        second: String,
    },

    /// Exactly one member of an all-or-nothing pair was supplied.
    #[error("field '{present}' in section '{section}' requires '{missing}' to be set as well")]
    LonePairMember {
        /// The section being checked.
        section: String,
        /// The member that was supplied.
        present: String,
        /// The member that is absent.
        missing: String,
    },

    /// A disparity grid path does not exist on disk.
    #[error("grid file '{path}' for field '{field}' does not exist")]
    GridNotFound {
        /// The field holding the path.
        field: String,
        /// The declared path.
        path: String,
    },

    /// A pipeline entry whose name is not a recognized step.
    #[error("unknown pipeline step '{step}'")]
    UnknownStep {
        /// The unrecognized step name.
        step: String,
    },

    /// A pipeline step requesting a method its stage does not provide.
    #[error("unknown method '{method}' for pipeline step '{step}'")]
    UnknownMethod {
        /// The step name.
        step: String,
        /// The unrecognized method.
        method: String,
    },
}

impl SchemaError {
    /// Creates an error for a field no schema rule recognizes.
    pub fn unknown_field(section: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            section: section.into(),
            field: field.into(),
        }
    }

    /// Creates an error for a required field that is absent.
    pub fn missing_field(section: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            section: section.into(),
            field: field.into(),
        }
    }

    /// Creates an error for a field whose value is not accepted.
    pub fn invalid_field(
        section: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            section: section.into(),
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an error for a section that could not be interpreted.
    pub fn invalid_section(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSection {
            section: section.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a pair whose members disagree in kind.
    pub fn mismatched_pair(
        section: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::MismatchedPair {
            section: section.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Creates an error for an all-or-nothing pair with one member missing.
    pub fn lone_pair_member(
        section: impl Into<String>,
        present: impl Into<String>,
        missing: impl Into<String>,
    ) -> Self {
        Self::LonePairMember {
            section: section.into(),
            present: present.into(),
            missing: missing.into(),
        }
    }
}

/// Errors raised by a full validation pass over a configuration document.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A section violated its schema or a cross-field rule.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The configured step sequence is not a legal walk through the pipeline
    /// state machine. Always fatal to the current validation attempt.
    #[error("illegal transition '{method}' for step '{step}' from state {state}")]
    InvalidTransition {
        /// The offending step name.
        step: String,
        /// The method the step requested.
        method: String,
        /// The machine state at the time of failure.
        state: State,
    },

    /// The step order is legal but the data shape makes the request
    /// meaningless (e.g. cross-checking without right disparity bounds).
    /// This is the fatal kind: the rest of the system must never attempt to
    /// run such a configuration.
    #[error("unsupported combination: {message}")]
    UnsupportedCombination {
        /// Description of the rejected combination.
        message: String,
    },

    /// IO error while loading a configuration file.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON.
    #[error("configuration parse")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Creates an unsupported-combination error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedCombination {
            message: message.into(),
        }
    }

    /// Returns true for defects the rest of the system must never attempt to
    /// run with; a CLI wrapper maps these to a dedicated exit code.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnsupportedCombination { .. })
    }
}
