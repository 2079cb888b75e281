//! # Bootforge Items
//!
//! The configuration object model: one struct per item kind, a generic
//! name-keyed [`Collection`], and the [`CollectionManager`] owning every
//! collection plus the global settings.
//!
//! Items hold *raw* (uncollapsed) attributes; collapsing an item's
//! ancestor chain into an effective configuration is the resolver's job
//! (see the `bootforge-resolver` crate). The manager drives the
//! per-mutation state machine: validate, persist, pre-trigger, artifact
//! generation, post-trigger.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod distro;
pub mod file;
pub mod image;
pub mod item;
pub mod manager;
pub mod mgmtclass;
pub mod package;
pub mod profile;
pub mod repo;
pub mod system;

pub use collection::Collection;
pub use distro::Distro;
pub use file::FileResource;
pub use image::Image;
pub use item::{Item, ItemBase, ParentRef};
pub use manager::{CollectionManager, RemoveOptions, SaveOptions};
pub use mgmtclass::MgmtClass;
pub use package::Package;
pub use profile::Profile;
pub use repo::Repo;
pub use system::{NetworkInterface, PowerSettings, System};
