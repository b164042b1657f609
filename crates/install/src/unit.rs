//! The unit being finalized

use arbor_manifest::Descriptor;
use arbor_types::{InstallMode, OriginType};
use std::path::PathBuf;

/// A staged unit handed to the finalizer by the install orchestrator
///
/// `path` is the logical install location inside the dependency tree;
/// `real_path` is the resolved physical destination. They differ for linked
/// units, where `path` becomes a symlink into the external source tree at
/// `real_path`.
#[derive(Debug, Clone)]
pub struct ModuleUnit {
    /// Logical install location
    pub path: PathBuf,
    /// Resolved physical destination
    pub real_path: PathBuf,
    /// How the unit was requested
    pub origin: OriginType,
    /// In-memory package descriptor, replaced by the metadata refresh
    pub descriptor: Descriptor,
}

impl ModuleUnit {
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        real_path: impl Into<PathBuf>,
        origin: OriginType,
        descriptor: Descriptor,
    ) -> Self {
        Self {
            path: path.into(),
            real_path: real_path.into(),
            origin,
            descriptor,
        }
    }

    /// The install strategy implied by the unit's origin
    #[must_use]
    pub fn install_mode(&self) -> InstallMode {
        self.origin.install_mode()
    }

    /// Descriptor name, or the destination's base name when the
    /// descriptor has none
    #[must_use]
    pub fn display_name(&self) -> String {
        self.descriptor.name().map_or_else(
            || {
                self.real_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            },
            str::to_owned,
        )
    }
}
