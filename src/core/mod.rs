//! Core namespace model.
//!
//! This module provides:
//! - [`ShellItem`] location identity, resolution and URI rendering
//! - [`KnownFolderIndex`] the registry behind `shell:///` names
//! - [`NavigationHistory`] back/forward tracking and [`Browser`] sessions
//! - [`FilterSpec`] file type filters and wildcard matching
//! - [`ChangeRouter`] change notification dispatch

pub mod browser;
pub mod error;
pub mod filter;
pub mod history;
pub mod item;
pub mod known_folders;
pub mod notify;

pub use browser::Browser;
pub use error::{
    FilterError, HistoryError, ManifestError, NativeError, ResolveError, ShellError, ShellResult,
};
pub use filter::{FilterItem, FilterMatcher, FilterSpec};
pub use history::NavigationHistory;
pub use item::ShellItem;
pub use known_folders::{KnownFolderBackend, KnownFolderEntry, KnownFolderIndex, KnownFolderMatch};
pub use notify::ChangeRouter;
