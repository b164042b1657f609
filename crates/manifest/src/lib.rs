#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package descriptor handling for arbor
//!
//! This crate defines the package descriptor (the unit's `package.json`
//! contents) and provides serialization/deserialization. Descriptors are
//! open-ended JSON objects: a handful of fields are well known (`name`,
//! `version`), installer bookkeeping fields carry the private `_` prefix,
//! and everything else is arbitrary published metadata, so the descriptor
//! is backed by an order-preserving map rather than a closed struct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;

use arbor_errors::{Error, PackageError};
use arbor_types::PRIVATE_FIELD_PREFIX;

/// Package descriptor (`package.json` contents)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor {
    fields: Map<String, Value>,
}

impl Descriptor {
    /// Create a descriptor with just a name and version
    #[must_use]
    pub fn new(name: &str, version: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(name.to_string()));
        fields.insert("version".to_string(), Value::String(version.to_string()));
        Self { fields }
    }

    /// Wrap an existing field map
    #[must_use]
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parse a descriptor from JSON text
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidDescriptor` if the text is not valid
    /// JSON or the top level is not an object.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| PackageError::InvalidDescriptor {
                message: e.to_string(),
            })?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(PackageError::InvalidDescriptor {
                message: format!("expected a JSON object, got {other}"),
            }
            .into()),
        }
    }

    /// Render the descriptor as pretty-printed JSON with a trailing newline
    #[must_use]
    pub fn to_json(&self) -> String {
        // A Map of Value cannot fail to serialize
        let mut text = serde_json::to_string_pretty(&self.fields).unwrap_or_else(|_| "{}".into());
        text.push('\n');
        text
    }

    /// The `name` field, if present and a string
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// The `version` field, if present and a string
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.fields.get("version").and_then(Value::as_str)
    }

    /// Force the `name` field to the given value
    pub fn set_name(&mut self, name: &str) {
        self.fields
            .insert("name".to_string(), Value::String(name.to_string()));
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Iterate over all fields in document order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Whether a field name marks installer bookkeeping state
    #[must_use]
    pub fn is_private_field(key: &str) -> bool {
        key.starts_with(PRIVATE_FIELD_PREFIX)
    }
}

/// Read a descriptor from a file
///
/// # Errors
///
/// Returns `PackageError::DescriptorNotFound` if the file does not exist,
/// `PackageError::DescriptorReadFailed` on other I/O failures, and
/// `PackageError::InvalidDescriptor` if the contents do not parse.
pub async fn read_descriptor(path: &Path) -> Result<Descriptor, Error> {
    let text = fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PackageError::DescriptorNotFound {
                path: path.display().to_string(),
            }
        } else {
            PackageError::DescriptorReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        }
    })?;
    Descriptor::from_json(&text)
}

/// Write a descriptor to a file, replacing any existing contents
///
/// # Errors
///
/// Returns `PackageError::DescriptorWriteFailed` if the write fails.
pub async fn write_descriptor(descriptor: &Descriptor, path: &Path) -> Result<(), Error> {
    fs::write(path, descriptor.to_json())
        .await
        .map_err(|e| PackageError::DescriptorWriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_preserves_field_order() {
        let desc =
            Descriptor::from_json(r#"{"zeta": 1, "name": "a", "version": "1.0.0", "alpha": 2}"#)
                .unwrap();
        let keys: Vec<&str> = desc.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "name", "version", "alpha"]);
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        let err = Descriptor::from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Descriptor::from_json("not json").is_err());
    }

    #[test]
    fn private_field_detection() {
        assert!(Descriptor::is_private_field("_id"));
        assert!(Descriptor::is_private_field("_requested"));
        assert!(!Descriptor::is_private_field("name"));
    }

    #[test]
    fn accessors() {
        let mut desc = Descriptor::new("a", "1.0.0");
        assert_eq!(desc.name(), Some("a"));
        assert_eq!(desc.version(), Some("1.0.0"));
        desc.set_name("b");
        assert_eq!(desc.name(), Some("b"));
        desc.insert("description", json!("d"));
        assert_eq!(desc.get("description"), Some(&json!("d")));
    }

    #[tokio::test]
    async fn read_write_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("package.json");

        let mut desc = Descriptor::new("roundtrip", "2.3.4");
        desc.insert("_id", json!("roundtrip@2.3.4"));
        write_descriptor(&desc, &path).await.unwrap();

        let read_back = read_descriptor(&path).await.unwrap();
        assert_eq!(read_back, desc);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let err = read_descriptor(&temp.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::DescriptorNotFound { .. })
        ));
    }
}
