//! Shell namespace identity and navigation model.
//!
//! The namespace is a tree of items rooted at the desktop: drives, folders
//! and files plus the virtual locations between them. This crate models
//! item identity inside that tree without drawing any UI: resolving
//! locators to [`ShellItem`]s, comparing and ordering them, rendering
//! stable `shell:///` and `file://` URIs, walking back/forward history,
//! filtering by wildcard file types, and routing change notifications.
//!
//! The platform binding sits behind the [`provider::NamespaceProvider`]
//! trait. [`provider::MemoryProvider`] serves a manifest-described virtual
//! namespace; [`provider::HostProvider`] (feature `host`) serves a real
//! directory tree.

pub mod config;
pub mod core;
pub mod models;
pub mod provider;
pub mod utils;

pub use crate::core::browser::Browser;
pub use crate::core::error::{
    FilterError, HistoryError, ManifestError, NativeError, ResolveError, ShellError, ShellResult,
};
pub use crate::core::filter::{FilterItem, FilterMatcher, FilterSpec};
pub use crate::core::history::NavigationHistory;
pub use crate::core::item::ShellItem;
pub use crate::core::known_folders::{KnownFolderBackend, KnownFolderIndex, KnownFolderMatch};
pub use crate::core::notify::ChangeRouter;
pub use crate::models::{
    ChangeEvent, ChangeKind, EnumerateFlags, ItemAttributes, NameStyle, NamespaceManifest,
    ShellUri, SpecialFolder,
};
pub use crate::provider::{ItemHandle, MemoryProvider, NamespaceProvider, RawHandle};

#[cfg(feature = "host")]
pub use crate::provider::HostProvider;
