//! Staging location derivation
//!
//! The orchestrator extracts each unit into a per-unit directory under a
//! shared staging root before finalization. The directory name must be
//! deterministic per (staging root, unit) so an interrupted run and its
//! retry agree on where the staged content lives, and unique per
//! destination so units with the same package name cannot collide.

use crate::unit::ModuleUnit;
use std::path::{Path, PathBuf};

/// Derive the staging location for a unit under a staging root
///
/// The name combines the unit's package name (sanitized to a filesystem-safe
/// form) with a short hash of the physical destination path.
#[must_use]
pub fn module_staging_path(staging_root: &Path, unit: &ModuleUnit) -> PathBuf {
    let safe_name: String = unit
        .display_name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let digest = blake3::hash(unit.real_path.as_os_str().as_encoded_bytes());
    let hex = digest.to_hex();

    staging_root.join(format!("{safe_name}-{}", &hex[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_manifest::Descriptor;
    use arbor_types::OriginType;

    fn unit(name: &str, real_path: &str) -> ModuleUnit {
        ModuleUnit::new(
            format!("/proj/node_modules/{name}"),
            real_path,
            OriginType::Registry,
            Descriptor::new(name, "1.0.0"),
        )
    }

    #[test]
    fn deterministic_for_same_unit() {
        let staging = Path::new("/tmp/staging");
        let a = module_staging_path(staging, &unit("a", "/proj/node_modules/a"));
        let b = module_staging_path(staging, &unit("a", "/proj/node_modules/a"));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_destinations_do_not_collide() {
        let staging = Path::new("/tmp/staging");
        let a = module_staging_path(staging, &unit("a", "/proj/node_modules/a"));
        let nested = module_staging_path(staging, &unit("a", "/proj/node_modules/b/node_modules/a"));
        assert_ne!(a, nested);
    }

    #[test]
    fn scoped_names_are_sanitized() {
        let staging = Path::new("/tmp/staging");
        let mut scoped = unit("pkg", "/proj/node_modules/@scope/pkg");
        scoped.descriptor.set_name("@scope/pkg");
        let path = module_staging_path(staging, &scoped);
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("-scope-pkg-"));
        assert!(!file_name.contains('/'));
    }
}
