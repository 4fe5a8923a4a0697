//! Item attribute and enumeration flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Attributes reported for a namespace item.
    ///
    /// `FILE_SYS_ANCESTOR` marks virtual folders that contain file-system
    /// items somewhere beneath them (the computer folder, for example),
    /// letting views offer them as waypoints to real files.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ItemAttributes: u32 {
        const FOLDER           = 1 << 0;
        const FILE_SYSTEM      = 1 << 1;
        const FILE_SYS_ANCESTOR = 1 << 2;
        const READ_ONLY        = 1 << 3;
        const HAS_SUBFOLDERS   = 1 << 4;
        const HIDDEN           = 1 << 5;
    }
}

bitflags! {
    /// Child-enumeration filter flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EnumerateFlags: u32 {
        const FOLDERS        = 1 << 0;
        const NON_FOLDERS    = 1 << 1;
        const INCLUDE_HIDDEN = 1 << 2;
    }
}

/// Display-name styles a provider can render for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// The name shown in views, e.g. `Documents`.
    Normal,
    /// The name relative to the item's parent folder.
    ParentRelative,
    /// The full parsing name from the namespace root.
    Parsing,
    /// The absolute filesystem path. Fails for purely virtual items.
    FileSystemPath,
}

/// Well-known folder designators understood by providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialFolder {
    Desktop,
    Documents,
    Downloads,
    Recent,
    Pictures,
    Music,
    Videos,
    Computer,
    CommonDesktop,
    CommonProgramFiles,
    Windows,
    Home,
}
