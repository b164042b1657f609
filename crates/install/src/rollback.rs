//! Coarse rollback for aborted installations
//!
//! Distinct from the in-flight restoration inside `finalize`: this is the
//! "undo everything this unit ever did" primitive the orchestrator invokes
//! when an entire multi-unit installation must be aborted.

use crate::unit::ModuleUnit;
use arbor_errors::{Error, InstallError};
use arbor_events::{EventEmitter, EventSender, InstallEvent};

/// Forcibly remove whatever currently sits at the unit's destination
///
/// Idempotent: a second invocation on an already-removed unit is a no-op.
///
/// # Errors
///
/// Returns `InstallError::RollbackFailed` if the removal fails for a
/// reason other than the path not existing.
pub async fn rollback(unit: &ModuleUnit, events: Option<&EventSender>) -> Result<(), Error> {
    events.emit(InstallEvent::RollbackStarted {
        real_path: unit.real_path.clone(),
    });

    arbor_root::remove_dir_all(&unit.real_path)
        .await
        .map_err(|e| {
            InstallError::RollbackFailed {
                message: format!("{}: {e}", unit.real_path.display()),
            }
            .into()
        })
}
