//! Error types for catalog configuration and per-candidate scan failures.
//!
//! Configuration calls fail with [`ScanError::InvalidArgument`]. The other
//! variants describe why a single type could not be built or populated; a scan
//! never returns them, it records them in [`crate::report::ScanReport::skipped`].

use serde::{Deserialize, Serialize};

/// Errors raised by the catalog and the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ScanError {
    /// Misuse of the configuration API (empty filter, unknown base type,
    /// duplicate registration).
    InvalidArgument {
        /// What was wrong with the argument
        message: String,
    },

    /// No concrete, constructible type exists for a required type.
    UnbuildableType {
        /// The type that was requested
        type_name: String,
    },

    /// Raw instantiation or population of one candidate failed.
    PopulationFailure {
        /// The candidate type
        type_name: String,
        /// Failure message (factory error or panic payload)
        message: String,
    },
}

impl ScanError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ScanError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unbuildable(type_name: impl Into<String>) -> Self {
        ScanError::UnbuildableType {
            type_name: type_name.into(),
        }
    }

    pub fn population_failure(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ScanError::PopulationFailure {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// The type this error concerns, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ScanError::InvalidArgument { .. } => None,
            ScanError::UnbuildableType { type_name }
            | ScanError::PopulationFailure { type_name, .. } => Some(type_name),
        }
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::InvalidArgument { message } => {
                write!(f, "InvalidArgument: {}", message)
            }
            ScanError::UnbuildableType { type_name } => {
                write!(
                    f,
                    "UnbuildableType: no concrete constructible type for {}",
                    type_name
                )
            }
            ScanError::PopulationFailure { type_name, message } => {
                write!(f, "PopulationFailure: {} ({})", type_name, message)
            }
        }
    }
}

impl std::error::Error for ScanError {}
