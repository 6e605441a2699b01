//! Error types for topic_tree
//!
//! The hierarchy core never fails: every malformed input degrades to a
//! skipped entry or a placeholder node. These errors only come out of the
//! request layer, which rejects inputs the core cannot meaningfully start on.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TopicTreeError>;

/// Main error type for topic_tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopicTreeError {
    /// A required input table is empty (no documents, no assignments)
    #[error("Empty input: {message}")]
    EmptyInput { message: String },

    /// A document id could not be read as an integer
    #[error("Invalid document id at index {index}: {value}")]
    InvalidDocumentId { index: usize, value: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl TopicTreeError {
    /// Create an empty input error
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Create an invalid document id error
    pub fn invalid_document_id(index: usize, value: impl Into<String>) -> Self {
        Self::InvalidDocumentId {
            index,
            value: value.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Check if this error was caused by missing upstream data
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput { .. })
    }
}

impl From<serde_json::Error> for TopicTreeError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
