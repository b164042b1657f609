//! Domain-driven event types

mod general;
mod install;

pub use general::GeneralEvent;
pub use install::InstallEvent;

use serde::{Deserialize, Serialize};

/// Top-level application event
///
/// Events are grouped by functional domain. All consumer-facing output
/// flows through this enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum AppEvent {
    General(GeneralEvent),
    Install(InstallEvent),
}

impl From<GeneralEvent> for AppEvent {
    fn from(event: GeneralEvent) -> Self {
        Self::General(event)
    }
}

impl From<InstallEvent> for AppEvent {
    fn from(event: InstallEvent) -> Self {
        Self::Install(event)
    }
}
