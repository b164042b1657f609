#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Shared types for the arbor package finalizer
//!
//! Defines how a unit was requested, which install strategy that implies,
//! and the on-disk layout conventions of a dependency tree.

use serde::{Deserialize, Serialize};

/// Name of the subdirectory where a unit's own sub-dependencies live
pub const MODULES_DIR: &str = "node_modules";

/// File name of the package descriptor at a unit's root
pub const DESCRIPTOR_FILE: &str = "package.json";

/// Marker prefix for descriptor fields that are installer bookkeeping,
/// not published metadata
pub const PRIVATE_FIELD_PREFIX: char = '_';

/// How a unit was requested by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginType {
    /// A local directory, installed by linking rather than copying
    Directory,
    /// A registry package (version, range, or tag)
    Registry,
    /// A local tarball file
    File,
    /// A git repository
    Git,
    /// A remote tarball URL
    Remote,
}

impl OriginType {
    /// The install strategy this origin implies
    #[must_use]
    pub fn install_mode(self) -> InstallMode {
        match self {
            Self::Directory => InstallMode::Linked,
            _ => InstallMode::Packaged,
        }
    }
}

/// Whether a unit is installed via symlink to an external source tree,
/// or via physical move of packaged content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    Linked,
    Packaged,
}

impl std::fmt::Display for InstallMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linked => write!(f, "linked"),
            Self::Packaged => write!(f, "packaged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_origin_links() {
        assert_eq!(OriginType::Directory.install_mode(), InstallMode::Linked);
    }

    #[test]
    fn every_other_origin_packages() {
        for origin in [
            OriginType::Registry,
            OriginType::File,
            OriginType::Git,
            OriginType::Remote,
        ] {
            assert_eq!(origin.install_mode(), InstallMode::Packaged);
        }
    }
}
