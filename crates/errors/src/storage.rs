//! Storage and filesystem error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageError {
    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("atomic rename failed: {message}")]
    AtomicRenameFailed { message: String },

    #[error("directory creation failed: {path}: {message}")]
    DirectoryCreationFailed { path: String, message: String },

    #[error("directory removal failed: {path}: {message}")]
    DirectoryRemovalFailed { path: String, message: String },

    #[error("directory listing failed: {path}: {message}")]
    DirectoryListingFailed { path: String, message: String },

    #[error("symlink creation failed: {message}")]
    SymlinkCreationFailed { message: String },

    // Field must not be called `source`: thiserror would treat it as the
    // std::error::Error source, which a String cannot be
    #[error("cross-device move failed: {from} -> {to}: {message}")]
    CrossDeviceMoveFailed {
        from: String,
        to: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn cross_device_failure_is_plain_data() {
        let err = StorageError::CrossDeviceMoveFailed {
            from: "/a".to_string(),
            to: "/b".to_string(),
            message: "copy failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cross-device move failed: /a -> /b: copy failed"
        );
        // Path fields are message data, not a nested error cause
        assert!(err.source().is_none());
    }
}
