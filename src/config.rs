//! Library configuration.
//!
//! Centralizes the constants used throughout the crate: URI scheme names,
//! the builtin known-folder table, and enumeration defaults.

use crate::models::{EnumerateFlags, SpecialFolder};

// =============================================================================
// URI Schemes
// =============================================================================

/// Scheme for locations addressed relative to a known folder,
/// e.g. `shell:///Personal/notes.txt`.
pub const SHELL_SCHEME: &str = "shell";

/// Scheme for locations addressed by filesystem path,
/// e.g. `file:///C:\Users\ada`.
pub const FILE_SCHEME: &str = "file";

// =============================================================================
// Known Folders
// =============================================================================

/// The fixed known-folder table used when a provider does not publish its
/// own registry. Names follow the classic canonical spellings.
pub const BUILTIN_KNOWN_FOLDERS: &[(&str, SpecialFolder)] = &[
    ("Common Desktop", SpecialFolder::CommonDesktop),
    ("Desktop", SpecialFolder::Desktop),
    ("Personal", SpecialFolder::Documents),
    ("Recent", SpecialFolder::Recent),
    ("MyComputerFolder", SpecialFolder::Computer),
    ("My Pictures", SpecialFolder::Pictures),
    ("ProgramFilesCommon", SpecialFolder::CommonProgramFiles),
    ("Windows", SpecialFolder::Windows),
];

// =============================================================================
// Filtering & Enumeration
// =============================================================================

/// Pattern applied when a view is configured with an empty filter.
pub const DEFAULT_FILTER_PATTERN: &str = "*.*";

/// Default child-enumeration flags: everything, hidden items included.
pub const DEFAULT_ENUMERATE: EnumerateFlags = EnumerateFlags::FOLDERS
    .union(EnumerateFlags::NON_FOLDERS)
    .union(EnumerateFlags::INCLUDE_HIDDEN);
