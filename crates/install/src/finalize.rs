//! Transactional finalization of a staged unit
//!
//! Moving staged content into place is a single rename on the happy path.
//! The machinery here exists for the unhappy path: the destination may be
//! occupied by a previous install whose nested modules must survive the
//! swap, and every step after the destination has been disturbed must be
//! undone if a later step fails. The previous occupant is moved to a
//! quarantine sibling for the duration of the transaction; the
//! [`DestinationState`] returned by the displacement step is the only way
//! to reach the restoration logic.

use crate::metadata::refresh_metadata;
use crate::staging::module_staging_path;
use crate::unit::ModuleUnit;
use arbor_errors::{Error, InstallError};
use arbor_events::{EventEmitter, EventSender, GeneralEvent, InstallEvent};
use arbor_root::MoveOptions;
use arbor_types::{InstallMode, MODULES_DIR};
use futures::stream::{self, TryStreamExt};
use std::path::{Path, PathBuf};

/// Cap on simultaneous nested-module moves during restoration
const NESTED_MOVE_CONCURRENCY: usize = 4;

/// Whether the destination had to be moved aside before the staged
/// content could take its place
///
/// Restoration only compiles against the `Quarantined` variant; there is
/// no flag to forget to check.
enum DestinationState {
    /// Destination was empty, nothing to restore on failure
    Clear,
    /// Previous occupant is parked at `quarantine` until the transaction
    /// completes or rolls back
    Quarantined { quarantine: PathBuf },
}

/// Sibling path the previous occupant is parked at during the swap
///
/// The name marks it as pending deletion so an interrupted run leaves an
/// obviously disposable directory behind.
fn quarantine_path(real_path: &Path) -> PathBuf {
    let base = real_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = real_path.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!(".{base}.DELETE"))
}

fn move_options() -> MoveOptions {
    MoveOptions {
        concurrency: NESTED_MOVE_CONCURRENCY,
    }
}

/// Finalize a staged unit into its permanent location
///
/// Linked units get a directory symlink at `unit.path` pointing into the
/// source tree at `unit.real_path`. Packaged units get their staged
/// content moved to `unit.real_path`, displacing and restoring a previous
/// install as needed. On success the unit's descriptor is refreshed from
/// its final location.
///
/// # Errors
///
/// Returns the original cause of the first failed step. If the
/// destination had already been moved aside, a best-effort restoration of
/// the previous install runs first; its own failures never replace the
/// original error.
pub async fn finalize(
    staging_root: &Path,
    unit: &mut ModuleUnit,
    events: Option<&EventSender>,
) -> Result<(), Error> {
    events.emit(InstallEvent::Finalizing {
        package: unit.display_name(),
        real_path: unit.real_path.clone(),
        mode: unit.install_mode(),
    });

    match unit.install_mode() {
        InstallMode::Linked => finalize_linked(unit).await?,
        InstallMode::Packaged => finalize_packaged(staging_root, unit, events).await?,
    }

    events.emit(InstallEvent::Finalized {
        package: unit.display_name(),
        real_path: unit.real_path.clone(),
    });
    Ok(())
}

/// Linked mode: a symlink, no content moves
///
/// Nothing here disturbs an existing destination, so any failure is
/// surfaced as-is with nothing to undo.
async fn finalize_linked(unit: &mut ModuleUnit) -> Result<(), Error> {
    make_parent_path(&unit.path).await?;

    arbor_root::symlink_dir(&unit.real_path, &unit.path)
        .await
        .map_err(|e| InstallError::LinkCreationFailed {
            link: unit.path.display().to_string(),
            target: unit.real_path.display().to_string(),
            message: e.to_string(),
        })?;

    // In-memory refresh only: the on-disk descriptor belongs to the
    // linked source tree
    refresh_metadata(unit).await
}

/// Packaged mode: the guarded move
async fn finalize_packaged(
    staging_root: &Path,
    unit: &mut ModuleUnit,
    events: Option<&EventSender>,
) -> Result<(), Error> {
    let extracted_to = module_staging_path(staging_root, unit);
    let quarantine = quarantine_path(&unit.real_path);

    make_parent_path(&unit.real_path).await?;

    let state = displace_destination(&unit.real_path, &quarantine, events).await?;

    if let Err(original) = install_staged_content(&extracted_to, unit, &state, events).await {
        if let DestinationState::Quarantined { quarantine } = &state {
            restore_destination(quarantine, &unit.real_path, events).await;
        }
        return Err(original);
    }

    // Idempotent: succeeds whether or not a quarantine was ever created
    arbor_root::remove_dir_all(&quarantine).await?;

    refresh_metadata(unit).await
}

/// Probe the destination and move a previous occupant into quarantine
///
/// A stale quarantine left by an interrupted prior run is deleted before
/// the occupant is parked. Failures here happen before the new content has
/// touched anything, so they propagate with nothing to undo; the
/// `Quarantined` state is only produced once the occupant is fully parked.
async fn displace_destination(
    real_path: &Path,
    quarantine: &Path,
    events: Option<&EventSender>,
) -> Result<DestinationState, Error> {
    if !arbor_root::exists(real_path).await {
        return Ok(DestinationState::Clear);
    }

    arbor_root::remove_dir_all(quarantine).await?;
    arbor_root::move_path(real_path, quarantine, &move_options()).await?;

    events.emit(InstallEvent::DestinationQuarantined {
        real_path: real_path.to_path_buf(),
        quarantine_path: quarantine.to_path_buf(),
    });

    Ok(DestinationState::Quarantined {
        quarantine: quarantine.to_path_buf(),
    })
}

/// Move staged content into place and carry nested modules forward
async fn install_staged_content(
    extracted_to: &Path,
    unit: &ModuleUnit,
    state: &DestinationState,
    events: Option<&EventSender>,
) -> Result<(), Error> {
    arbor_root::move_path(extracted_to, &unit.real_path, &move_options()).await?;

    if let DestinationState::Quarantined { quarantine } = state {
        restore_nested_modules(quarantine, &unit.real_path, events).await?;
    }
    Ok(())
}

/// Carry the previous install's nested modules into the new destination
///
/// The staged content does not contain them; without this step the
/// previous install's manually-added or pinned sub-dependencies would be
/// silently lost. Entries move individually, capped at
/// [`NESTED_MOVE_CONCURRENCY`] in flight.
async fn restore_nested_modules(
    quarantine: &Path,
    real_path: &Path,
    events: Option<&EventSender>,
) -> Result<(), Error> {
    let old_modules = quarantine.join(MODULES_DIR);

    // A previous install without nested modules has nothing to carry over
    let entries = arbor_root::list_dir(&old_modules).await.unwrap_or_default();
    if entries.is_empty() {
        return Ok(());
    }

    let new_modules = real_path.join(MODULES_DIR);
    arbor_root::create_dir_all(&new_modules).await?;

    let count = entries.len();
    move_entries_bounded(&old_modules, &new_modules, entries, |from, to| async move {
        arbor_root::move_path(&from, &to, &move_options()).await
    })
    .await?;

    events.emit(InstallEvent::NestedModulesRestored {
        real_path: real_path.to_path_buf(),
        count,
    });
    Ok(())
}

/// Move directory entries individually, capped at
/// [`NESTED_MOVE_CONCURRENCY`] moves in flight
async fn move_entries_bounded<M, Fut>(
    from_dir: &Path,
    to_dir: &Path,
    names: Vec<String>,
    move_one: M,
) -> Result<(), Error>
where
    M: Fn(PathBuf, PathBuf) -> Fut,
    Fut: std::future::Future<Output = Result<(), Error>>,
{
    stream::iter(names.into_iter().map(Ok::<_, Error>))
        .try_for_each_concurrent(NESTED_MOVE_CONCURRENCY, |name| {
            move_one(from_dir.join(&name), to_dir.join(&name))
        })
        .await
}

/// Best-effort restoration of the quarantined previous install
///
/// Runs only after a failure that will propagate to the caller; whatever
/// partially-moved content sits at the destination is removed and the
/// quarantined occupant moved back. Failures here must not mask the
/// original error, so they surface only as a warning event.
async fn restore_destination(quarantine: &Path, real_path: &Path, events: Option<&EventSender>) {
    let restored: Result<(), Error> = async {
        arbor_root::remove_dir_all(real_path).await?;
        arbor_root::move_path(quarantine, real_path, &move_options()).await
    }
    .await;

    if let Err(restore_err) = restored {
        events.emit(GeneralEvent::warning_with_context(
            format!(
                "failed to restore previous install at {}",
                real_path.display()
            ),
            restore_err.to_string(),
        ));
    }
}

/// Recursively create the parent directory of a path
async fn make_parent_path(path: &Path) -> Result<(), Error> {
    match path.parent() {
        Some(parent) => arbor_root::create_dir_all(parent).await,
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarantine_is_a_hidden_sibling() {
        let q = quarantine_path(Path::new("/proj/node_modules/foo"));
        assert_eq!(q, Path::new("/proj/node_modules/.foo.DELETE"));
    }

    #[test]
    fn quarantine_of_nested_destination() {
        let q = quarantine_path(Path::new("/proj/node_modules/a/node_modules/b"));
        assert_eq!(
            q,
            Path::new("/proj/node_modules/a/node_modules/.b.DELETE")
        );
    }

    #[tokio::test]
    async fn in_flight_moves_never_exceed_the_cap() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));
        let names: Vec<String> = (0..10).map(|i| format!("dep{i}")).collect();

        move_entries_bounded(Path::new("/from"), Path::new("/to"), names, |_, _| {
            let in_flight = Arc::clone(&in_flight);
            let high_water = Arc::clone(&high_water);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(now, Ordering::SeqCst);
                // Suspend so other moves get a chance to start
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        let peak = high_water.load(Ordering::SeqCst);
        assert!(
            peak <= NESTED_MOVE_CONCURRENCY,
            "{peak} moves were in flight at once"
        );
        assert!(peak > 1, "moves never overlapped");
    }
}
