#![warn(clippy::pedantic)]
#![deny(clippy::all)]

//! Transactional finalization of staged units for arbor
//!
//! This crate moves a fully extracted unit from its staging location into
//! its permanent position inside the dependency tree. The hard part is the
//! unhappy path: a destination occupied by a previous install must be
//! quarantined, its nested modules carried forward, and the whole swap
//! rolled back to the pre-finalize state if any step fails after the
//! destination was first disturbed.

mod finalize;
mod metadata;
mod rollback;
mod staging;
mod unit;

pub use finalize::finalize;
pub use metadata::merge_registry_metadata;
pub use rollback::rollback;
pub use staging::module_staging_path;
pub use unit::ModuleUnit;

// Re-export EventSender so orchestrators depend on one crate for the call
pub use arbor_events::EventSender;
