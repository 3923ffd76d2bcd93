use thiserror::Error;

/// Errors surfaced by the invoicing engine.
///
/// Every variant carries the stable, human-readable message a calling
/// layer can present directly; failures abort the enclosing store
/// transaction, so no partial state is ever persisted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvoicingError {
    /// Referenced row does not exist (or is soft-deleted).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate attachment or uniqueness violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invariant-violating input or state transition.
    #[error("{0}")]
    BadRequest(String),

    /// Document rendering or embedding failure.
    #[error("document generation failed: {0}")]
    Generation(String),

    /// Persistence-layer failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl InvoicingError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// A single input-validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "items[0].quantity").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
