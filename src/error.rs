//! Error types for the portal.

use crate::types::RowId;
use thiserror::Error;

/// Main error type for portal operations.
///
/// Nothing here is fatal to the process: gateway failures leave a stale or
/// empty view, and page controllers surface them as transient toasts.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Row not found: {collection}/{id}")]
    RowNotFound { collection: String, id: RowId },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("No item selected for commenting")]
    NoCommentTarget,

    #[error("Admin session required")]
    AdminRequired,
}

impl From<serde_json::Error> for PortalError {
    fn from(e: serde_json::Error) -> Self {
        PortalError::Decode(e.to_string())
    }
}

/// Result type for portal operations.
pub type Result<T> = std::result::Result<T, PortalError>;
