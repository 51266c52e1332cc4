// Copyright 2025 Cowboy AI, LLC.

//! Error types for composition operations

use thiserror::Error;

/// Errors that can occur while building, discovering or evaluating compositions
#[derive(Debug, Clone, Error)]
pub enum CompositionError {
    /// A concept was referenced that the taxonomy does not contain
    #[error("Unknown concept: {0}")]
    UnknownConcept(String),

    /// An instance has no parent concept to generalize to
    #[error("Instance has no parent concept: {0}")]
    OrphanInstance(String),

    /// Two services share the same name
    #[error("Duplicate service: {0}")]
    DuplicateService(String),

    /// A QoS attribute is outside its domain
    #[error("Invalid QoS for service {service}: {reason}")]
    InvalidQos {
        /// Name of the offending service
        service: String,
        /// Which attribute is out of range
        reason: String,
    },

    /// The task outputs cannot be reached from the task inputs
    #[error("It is impossible to perform a composition using the services and settings provided (unreachable outputs: {unreachable:?})")]
    InfeasibleTask {
        /// Task outputs not subsumed by the discovered frontier
        unreachable: Vec<String>,
    },

    /// A random service was requested from an empty relevant set
    #[error("Relevant service set is empty")]
    EmptyRelevantSet,

    /// A semantic ratio had a zero denominator
    #[error("Degenerate composition: {0}")]
    DegenerateComposition(String),

    /// Fitness weights are negative or not finite
    #[error("Invalid fitness weights: {0}")]
    InvalidWeights(String),

    /// A description file could not be parsed
    #[error("Parse error in {file}: {message}")]
    Parse {
        /// Which file (or document kind) failed
        file: String,
        /// Parser message
        message: String,
    },

    /// I/O failure while reading a description or config file
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for composition operations
pub type CompositionResult<T> = Result<T, CompositionError>;

impl From<serde_json::Error> for CompositionError {
    fn from(err: serde_json::Error) -> Self {
        CompositionError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for CompositionError {
    fn from(err: std::io::Error) -> Self {
        CompositionError::Io(err.to_string())
    }
}

impl CompositionError {
    /// Create a parse error for the given file
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        CompositionError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Check if this error stems from malformed repository data
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CompositionError::UnknownConcept(_)
                | CompositionError::OrphanInstance(_)
                | CompositionError::DuplicateService(_)
                | CompositionError::InvalidQos { .. }
                | CompositionError::InvalidWeights(_)
                | CompositionError::Parse { .. }
        )
    }

    /// Check if this error must terminate the whole session.
    ///
    /// Degenerate compositions and empty-set draws only fail the current call.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CompositionError::DegenerateComposition(_) | CompositionError::EmptyRelevantSet
        )
    }
}
