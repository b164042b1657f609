//! Package descriptor error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackageError {
    #[error("invalid descriptor: {message}")]
    InvalidDescriptor { message: String },

    #[error("descriptor not found: {path}")]
    DescriptorNotFound { path: String },

    #[error("descriptor read failed: {path}: {message}")]
    DescriptorReadFailed { path: String, message: String },

    #[error("descriptor write failed: {path}: {message}")]
    DescriptorWriteFailed { path: String, message: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },
}
