//! Data models and types for the namespace core.
//!
//! Contains domain types for:
//! - [`ItemAttributes`], [`EnumerateFlags`], [`NameStyle`], [`SpecialFolder`] - Item metadata
//! - [`ShellUri`] - `shell:///` and `file://` location URIs
//! - [`ChangeKind`], [`ChangeEvent`], [`RawNotification`] - Change notification records
//! - [`NamespaceManifest`] - Declarative description of a virtual namespace

mod attributes;
mod change;
mod manifest;
mod uri;

pub use attributes::{EnumerateFlags, ItemAttributes, NameStyle, SpecialFolder};
pub use change::{ChangeEvent, ChangeKind, RawNotification, codes};
pub use manifest::{DriveEntry, FileEntry, FolderEntry, KnownFolderDef, NamespaceManifest};
pub use uri::ShellUri;
