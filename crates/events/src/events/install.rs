use arbor_types::InstallMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Installation domain events - maps to the finalize/rollback lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    /// Finalization started for a unit
    Finalizing {
        package: String,
        real_path: PathBuf,
        mode: InstallMode,
    },

    /// The pre-existing destination was moved aside for rollback safety
    DestinationQuarantined {
        real_path: PathBuf,
        quarantine_path: PathBuf,
    },

    /// Nested modules carried over from the displaced destination
    NestedModulesRestored { real_path: PathBuf, count: usize },

    /// Finalization completed, unit is at its permanent location
    Finalized { package: String, real_path: PathBuf },

    /// Unit removal started (coarse rollback)
    RollbackStarted { real_path: PathBuf },
}
