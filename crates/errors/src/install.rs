//! Installation system error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstallError {
    #[error("installation failed: {message}")]
    Failed { message: String },

    #[error("atomic operation failed: {message}")]
    AtomicOperationFailed { message: String },

    #[error("rollback failed: {message}")]
    RollbackFailed { message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("link creation failed: {link} -> {target}: {message}")]
    LinkCreationFailed {
        link: String,
        target: String,
        message: String,
    },
}
