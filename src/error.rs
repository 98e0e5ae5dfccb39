//! Error types for navfold

use thiserror::Error;

/// Result type for navfold operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for navfold
#[derive(Debug, Error)]
pub enum Error {
    /// The filter navigation panel is not present in the document
    #[error("Filter container not found: #{id}")]
    ContainerMissing { id: String },

    /// Element not found in the document
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Element handle refers to a document that has since been replaced
    #[error("Stale element: the document was reloaded after this handle was taken")]
    StaleElement,

    /// DOM accessed before any document was loaded
    #[error("No document loaded")]
    NotLoaded,

    /// Timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a missing-container error
    pub fn container_missing(id: impl Into<String>) -> Self {
        Self::ContainerMissing { id: id.into() }
    }

    /// Create an element-not-found error for an id lookup
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::ElementNotFound(format!("#{}", id.into()))
    }

    /// Check if this error means the target simply was not in the document
    pub fn is_missing_target(&self) -> bool {
        matches!(
            self,
            Error::ContainerMissing { .. } | Error::ElementNotFound(_)
        )
    }
}
