//! Namespace manifest model.
//!
//! A manifest declares the contents of a virtual namespace: known folders,
//! drives, folders and files. Manifests load from JSON or TOML and feed
//! [`MemoryProvider`](crate::provider::MemoryProvider) construction.

use serde::{Deserialize, Serialize};

use crate::core::error::{ManifestError, ManifestResult};
use crate::models::SpecialFolder;

/// Root manifest structure.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NamespaceManifest {
    /// Known-folder registrations.
    #[serde(default)]
    pub known_folders: Vec<KnownFolderDef>,
    /// Drives, mounted under the computer folder.
    #[serde(default)]
    pub drives: Vec<DriveEntry>,
    /// Folder entries. Intermediate path components are created on demand.
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
    /// File entries.
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl NamespaceManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json_str(text: &str) -> ManifestResult<Self> {
        serde_json::from_str(text).map_err(ManifestError::from)
    }

    /// Parse a manifest from TOML text.
    pub fn from_toml_str(text: &str) -> ManifestResult<Self> {
        toml::from_str(text).map_err(ManifestError::from)
    }
}

/// A known-folder registration.
///
/// `name` is the canonical registry name used in `shell:///` URIs (for
/// example `Personal`). Folders with a `path` are backed by a filesystem
/// location; folders without one are virtual children of the desktop.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KnownFolderDef {
    pub name: String,
    /// Display name shown in views. Defaults to `name`.
    #[serde(default)]
    pub display: Option<String>,
    /// Absolute filesystem path backing the folder.
    #[serde(default)]
    pub path: Option<String>,
    /// Special-folder designator this registration answers for.
    #[serde(default)]
    pub special: Option<SpecialFolder>,
}

impl KnownFolderDef {
    /// The name this folder displays in views.
    pub fn display_name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.name)
    }
}

/// A drive declaration, e.g. `C:` or `/`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DriveEntry {
    pub name: String,
}

/// A folder in the namespace tree.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FolderEntry {
    /// Absolute path, e.g. `C:\Users\ada\Documents\Projects`.
    pub path: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Marks a folder whose enumeration fails, modeling locations the
    /// backing medium cannot serve (ejected media, denied access).
    #[serde(default)]
    pub inaccessible: bool,
    #[serde(default)]
    pub shared: bool,
    /// Tags the folder as answering for a special-folder designator
    /// without registering it as a known folder.
    #[serde(default)]
    pub special: Option<SpecialFolder>,
}

/// A file in the namespace tree.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FileEntry {
    /// Absolute path, e.g. `C:\Users\ada\Documents\notes.txt`.
    pub path: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub read_only: bool,
}
