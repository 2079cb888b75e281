//! # Bootforge Sync
//!
//! Turns resolved configurations into on-disk boot-service artifacts:
//! the PXE/TFTP tree, the DHCP configuration, DNS zone files, and the
//! web-servable answer-file cache.
//!
//! Two modes share the same per-object generation code:
//!
//! - [`SyncEngine::full_sync`] regenerates everything, collecting
//!   per-object errors instead of aborting, and is the recovery path
//!   after any partial generation failure
//! - [`LiteSyncEngine`] implements the incremental
//!   [`LiteSync`](bootforge_types::LiteSync) hooks the mutation state
//!   machine fires, touching only the affected artifacts plus a
//!   cascading regeneration of descendants and one trailing boot-menu
//!   rebuild

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dhcp;
mod dns;
mod engine;
mod litesync;
mod power;
mod pxe;

pub use engine::{CancelToken, SyncEngine, SyncFailure, SyncReport};
pub use litesync::LiteSyncEngine;
pub use power::PowerManager;
