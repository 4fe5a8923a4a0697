//! Change-notification records.
//!
//! Providers report namespace changes as [`RawNotification`]s: an event-kind
//! code plus one or two captured identities. The router translates them into
//! typed [`ChangeEvent`]s for subscribers.

use crate::core::ShellItem;
use crate::provider::ItemHandle;

/// Raw event-kind codes, mirroring the classic shell change codes.
pub mod codes {
    pub const RENAME_ITEM: u32 = 0x0000_0001;
    pub const CREATE: u32 = 0x0000_0002;
    pub const DELETE: u32 = 0x0000_0004;
    pub const MAKE_DIR: u32 = 0x0000_0008;
    pub const REMOVE_DIR: u32 = 0x0000_0010;
    pub const DRIVE_REMOVED: u32 = 0x0000_0080;
    pub const DRIVE_ADDED: u32 = 0x0000_0100;
    pub const NET_SHARE: u32 = 0x0000_0200;
    pub const NET_UNSHARE: u32 = 0x0000_0400;
    pub const UPDATE_DIR: u32 = 0x0000_1000;
    pub const UPDATE_ITEM: u32 = 0x0000_2000;
    pub const RENAME_FOLDER: u32 = 0x0002_0000;
}

/// Typed change kinds a subscriber can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    ItemCreated,
    ItemDeleted,
    ItemRenamed,
    ItemUpdated,
    FolderCreated,
    FolderDeleted,
    FolderRenamed,
    FolderUpdated,
    DriveAdded,
    DriveRemoved,
    SharingChanged,
}

impl ChangeKind {
    /// Every kind, in a stable order. Useful for subscribing a catch-all
    /// handler.
    pub const ALL: &'static [ChangeKind] = &[
        ChangeKind::ItemCreated,
        ChangeKind::ItemDeleted,
        ChangeKind::ItemRenamed,
        ChangeKind::ItemUpdated,
        ChangeKind::FolderCreated,
        ChangeKind::FolderDeleted,
        ChangeKind::FolderRenamed,
        ChangeKind::FolderUpdated,
        ChangeKind::DriveAdded,
        ChangeKind::DriveRemoved,
        ChangeKind::SharingChanged,
    ];

    /// Translate a raw event code. Returns `None` for codes this model does
    /// not carry, which the router drops silently.
    pub fn from_code(code: u32) -> Option<ChangeKind> {
        match code {
            codes::RENAME_ITEM => Some(ChangeKind::ItemRenamed),
            codes::CREATE => Some(ChangeKind::ItemCreated),
            codes::DELETE => Some(ChangeKind::ItemDeleted),
            codes::MAKE_DIR => Some(ChangeKind::FolderCreated),
            codes::REMOVE_DIR => Some(ChangeKind::FolderDeleted),
            codes::DRIVE_REMOVED => Some(ChangeKind::DriveRemoved),
            codes::DRIVE_ADDED => Some(ChangeKind::DriveAdded),
            codes::NET_SHARE | codes::NET_UNSHARE => Some(ChangeKind::SharingChanged),
            codes::UPDATE_DIR => Some(ChangeKind::FolderUpdated),
            codes::UPDATE_ITEM => Some(ChangeKind::ItemUpdated),
            codes::RENAME_FOLDER => Some(ChangeKind::FolderRenamed),
            _ => None,
        }
    }
}

/// One raw change record as delivered by a provider.
///
/// Rename records carry two identities (old, then new); every other kind
/// carries one. The handles own their native identities, so an undelivered
/// notification still releases them on drop.
#[derive(Debug)]
pub struct RawNotification {
    pub code: u32,
    pub item: ItemHandle,
    pub other: Option<ItemHandle>,
}

/// A translated change event, delivered synchronously to subscribers and
/// discarded afterwards.
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// The affected item. For renames, the item under its old name.
    pub item: ShellItem,
    /// The second identity of a rename (the item under its new name).
    pub other: Option<ShellItem>,
}
