//! Error types for conversation domain parsing.

use thiserror::Error;

/// Error returned for an unknown or malformed button payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown callback payload: {0}")]
pub struct ParseCallbackError(pub String);
