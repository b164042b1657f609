//! Metadata refresh after finalization
//!
//! The in-memory descriptor held by the orchestrator is usually registry
//! metadata: complete on bookkeeping fields but possibly missing published
//! fields that only exist in the extracted `package.json`. After the unit
//! reaches its final location, the two are merged and (for packaged units)
//! written back to disk.

use crate::unit::ModuleUnit;
use arbor_errors::Error;
use arbor_manifest::{read_descriptor, write_descriptor, Descriptor};
use arbor_types::{InstallMode, DESCRIPTOR_FILE};

/// Merge registry-held metadata onto the descriptor read off disk
///
/// Every private (`_`-prefixed) key and every key present in memory but
/// absent on disk is copied from memory; `name` is always forced to the
/// in-memory value, since a mismatch between the directory's descriptor
/// and the expected package name must never survive. `readme` and
/// `readmeFilename` are stripped - they sneak in from registry payloads
/// and never belong in an installed descriptor.
#[must_use]
pub fn merge_registry_metadata(in_memory: &Descriptor, mut on_disk: Descriptor) -> Descriptor {
    for (key, value) in in_memory.iter() {
        if Descriptor::is_private_field(key) || !on_disk.contains_key(key) {
            on_disk.insert(key.clone(), value.clone());
        }
    }
    if let Some(name) = in_memory.name() {
        on_disk.set_name(name);
    }
    on_disk.remove("readme");
    on_disk.remove("readmeFilename");
    on_disk
}

/// Refresh the unit's persisted metadata from its final location
///
/// Reading the on-disk descriptor is best-effort: a unit whose descriptor
/// is missing or malformed keeps the in-memory one. Persisting the merge
/// result is not best-effort - packaged units must end up with a descriptor
/// on disk, and a write failure fails the finalize. Linked units never
/// persist; their on-disk descriptor belongs to the linked source tree.
pub(crate) async fn refresh_metadata(unit: &mut ModuleUnit) -> Result<(), Error> {
    let descriptor_path = unit.path.join(DESCRIPTOR_FILE);

    if let Ok(on_disk) = read_descriptor(&descriptor_path).await {
        unit.descriptor = merge_registry_metadata(&unit.descriptor, on_disk);
    }

    if unit.install_mode() == InstallMode::Packaged {
        write_descriptor(&unit.descriptor, &descriptor_path).await?;
    }
    Ok(())
}
