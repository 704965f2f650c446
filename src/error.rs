//! Error types
//!
//! Nothing inside the frame loop is fatal: gameplay code degrades to a no-op
//! instead of returning errors. These types cover the two boundaries where a
//! caller needs to know something went wrong: loading tuning data, and a
//! single entity failing to draw.

use std::fmt;

/// Errors raised while loading or validating configuration
#[derive(Debug)]
pub enum SimError {
    /// Reading the tuning file failed
    Io(std::io::Error),
    /// The tuning file is not valid JSON for [`crate::Tuning`]
    Parse(serde_json::Error),
    /// A tuning value is outside its safe operating range
    InvalidTuning {
        /// Field name (for logging)
        name: &'static str,
        /// The rejected value
        value: f32,
        /// Human-readable description of the accepted range
        expected: &'static str,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io(e) => write!(f, "failed to read tuning file: {}", e),
            SimError::Parse(e) => write!(f, "failed to parse tuning file: {}", e),
            SimError::InvalidTuning {
                name,
                value,
                expected,
            } => write!(
                f,
                "tuning value '{}' = {} is out of range (expected {})",
                name, value, expected
            ),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            SimError::Parse(e) => Some(e),
            SimError::InvalidTuning { .. } => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Parse(e)
    }
}

/// A failure while drawing one entity
///
/// The draw pass logs these and moves on to the next entity.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawError {
    /// Entity geometry contained NaN or infinity
    NonFinite { what: &'static str },
    /// The surface rejected the call
    Surface(String),
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawError::NonFinite { what } => write!(f, "non-finite geometry in {}", what),
            DrawError::Surface(msg) => write!(f, "surface error: {}", msg),
        }
    }
}

impl std::error::Error for DrawError {}
