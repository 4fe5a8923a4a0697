//! The native namespace binding seam.
//!
//! [`NamespaceProvider`] stands in for the platform shell binding: it owns
//! the namespace tree, hands out opaque handles to locations in it, and
//! answers name, attribute and enumeration queries against them. The model
//! code never touches an operating system API directly; everything flows
//! through this trait.
//!
//! Two providers ship with the crate:
//! - [`MemoryProvider`] - a manifest-described virtual namespace
//! - [`HostProvider`] - a real directory tree (feature `host`)

#[cfg(feature = "host")]
mod host;
mod memory;

#[cfg(feature = "host")]
pub use host::HostProvider;
pub use memory::MemoryProvider;

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use unicode_normalization::UnicodeNormalization;

use crate::core::error::{NativeResult, ResolveResult};
use crate::models::{EnumerateFlags, ItemAttributes, NameStyle, SpecialFolder};

/// An opaque provider-issued handle addressing one namespace location.
///
/// Raw handles carry no ownership; wrap them in [`ItemHandle`] to get
/// release-on-drop semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

/// A known-folder registration published by a provider.
#[derive(Debug, Clone)]
pub struct KnownFolderDecl {
    /// Canonical registry name, used as the first `shell:///` segment.
    pub name: String,
    /// Designator the folder answers for, if any.
    pub special: Option<SpecialFolder>,
    /// Filesystem path backing the folder, if any.
    pub path: Option<String>,
}

/// The native shell binding seam.
///
/// Handle discipline: every handle returned by a method is owned by the
/// caller and must be released exactly once. [`clone_handle`] mints a new,
/// independent handle for the same location; handles never alias.
///
/// [`clone_handle`]: NamespaceProvider::clone_handle
pub trait NamespaceProvider {
    /// The namespace root (the desktop). The root identity is created
    /// lazily on first request and cached inside the provider; each call
    /// returns a fresh handle to it.
    fn desktop(&self) -> NativeResult<RawHandle>;

    /// Resolve an absolute filesystem path.
    fn resolve_path(&self, path: &str) -> ResolveResult<RawHandle>;

    /// Resolve a special-folder designator.
    fn special_folder(&self, folder: SpecialFolder) -> ResolveResult<RawHandle>;

    /// Look up a direct child by display name. Matching is case-insensitive
    /// over normalized names.
    fn child_by_name(&self, parent: RawHandle, name: &str) -> ResolveResult<RawHandle>;

    /// The item's parent, or `None` at the namespace root.
    fn parent(&self, handle: RawHandle) -> NativeResult<Option<RawHandle>>;

    /// Render a display name in the requested style. The
    /// [`NameStyle::FileSystemPath`] style fails for purely virtual items.
    fn display_name(&self, handle: RawHandle, style: NameStyle) -> NativeResult<String>;

    /// The item's attributes.
    fn attributes(&self, handle: RawHandle) -> NativeResult<ItemAttributes>;

    /// Enumerate children in display order, honoring `flags`.
    fn children(&self, handle: RawHandle, flags: EnumerateFlags)
    -> ResolveResult<Vec<RawHandle>>;

    /// Compare two items by display order.
    fn compare(&self, a: RawHandle, b: RawHandle) -> NativeResult<Ordering>;

    /// Mint a new handle for the same location.
    fn clone_handle(&self, handle: RawHandle) -> RawHandle;

    /// Release a handle. Must be called exactly once per handle.
    fn release(&self, handle: RawHandle);

    /// The provider's registered known folders. Providers without a
    /// registry return an empty list and callers fall back to the builtin
    /// table.
    fn known_folders(&self) -> Vec<KnownFolderDecl>;
}

/// An owned handle: releases on drop, duplicates through the provider on
/// clone.
pub struct ItemHandle {
    provider: Rc<dyn NamespaceProvider>,
    raw: RawHandle,
}

impl ItemHandle {
    /// Take ownership of `raw`.
    pub fn adopt(provider: Rc<dyn NamespaceProvider>, raw: RawHandle) -> Self {
        Self { provider, raw }
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    pub fn provider(&self) -> &Rc<dyn NamespaceProvider> {
        &self.provider
    }
}

impl Clone for ItemHandle {
    fn clone(&self) -> Self {
        Self {
            provider: Rc::clone(&self.provider),
            raw: self.provider.clone_handle(self.raw),
        }
    }
}

impl Drop for ItemHandle {
    fn drop(&mut self) {
        self.provider.release(self.raw);
    }
}

impl fmt::Debug for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ItemHandle").field(&self.raw.0).finish()
    }
}

/// Fold a display name for lookup: NFC normalization, then lowercasing.
pub(crate) fn fold_name(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}
