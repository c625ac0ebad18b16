//! Error types for flowfit

use crate::types::MessageKind;
use thiserror::Error;

/// Errors that can occur while repairing a recording
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Expected exactly one {kind} message, found {count}")]
    CardinalityError { kind: MessageKind, count: usize },

    #[error("Unsupported message kind '{kind}' at position {index}")]
    UnsupportedMessageKind { kind: String, index: usize },

    #[error("Structural error: {0}")]
    StructuralError(String),

    #[error("Arithmetic error: {0}")]
    ArithmeticError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Codec error: {0}")]
    CodecError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
