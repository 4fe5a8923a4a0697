//! Shell item identity.
//!
//! A [`ShellItem`] wraps one provider handle and answers identity questions
//! about the location it names: display names, attributes, parent and
//! children, ancestry, ordering and URI form. Items are cheap to clone;
//! every clone carries its own handle and releases it on drop.
//!
//! Equality is semantic, not structural. Two items are equal when the
//! provider says their locations compare equal in display order, with a
//! filesystem-path fallback for providers that misreport that comparison.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::core::error::{NativeError, NativeResult, ResolveError, ResolveResult};
use crate::core::known_folders::KnownFolderIndex;
use crate::models::{EnumerateFlags, ItemAttributes, NameStyle, ShellUri, SpecialFolder};
use crate::provider::{ItemHandle, NamespaceProvider};
use crate::utils::paths;

/// A single location in the namespace.
#[derive(Clone, Debug)]
pub struct ShellItem {
    handle: ItemHandle,
}

impl ShellItem {
    /// The namespace root.
    pub fn desktop(provider: Rc<dyn NamespaceProvider>) -> NativeResult<Self> {
        let raw = provider.desktop()?;
        Ok(Self::from_handle(ItemHandle::adopt(provider, raw)))
    }

    /// Resolve an absolute filesystem path.
    pub fn from_path(provider: Rc<dyn NamespaceProvider>, path: &str) -> ResolveResult<Self> {
        let raw = provider.resolve_path(path)?;
        Ok(Self::from_handle(ItemHandle::adopt(provider, raw)))
    }

    /// Resolve a special folder designator.
    pub fn special(
        provider: Rc<dyn NamespaceProvider>,
        folder: SpecialFolder,
    ) -> ResolveResult<Self> {
        let raw = provider.special_folder(folder)?;
        Ok(Self::from_handle(ItemHandle::adopt(provider, raw)))
    }

    /// Resolve a parsed URI against the provider's known folders.
    pub fn from_uri(provider: Rc<dyn NamespaceProvider>, uri: &ShellUri) -> ResolveResult<Self> {
        let index = KnownFolderIndex::for_provider(Rc::clone(&provider));
        Self::from_uri_with(provider, uri, &index)
    }

    /// Resolve a parsed URI against a prepared known-folder index.
    ///
    /// Shell URIs start at the named known folder and follow each segment
    /// with a child-name lookup, so every intermediate location must exist.
    pub fn from_uri_with(
        provider: Rc<dyn NamespaceProvider>,
        uri: &ShellUri,
        index: &KnownFolderIndex,
    ) -> ResolveResult<Self> {
        match uri {
            ShellUri::Shell { folder, segments } => {
                let mut item = index.by_name(folder)?;
                for segment in segments {
                    item = item.child(segment)?;
                }
                Ok(item)
            }
            ShellUri::File { path } => Self::from_path(provider, path),
        }
    }

    /// Resolve a locator string: a `shell://` or `file://` URI, or an
    /// absolute filesystem path. Anything else is rejected.
    pub fn resolve(provider: Rc<dyn NamespaceProvider>, locator: &str) -> ResolveResult<Self> {
        let locator = locator.trim();
        if locator.contains("://") {
            let uri = ShellUri::parse(locator)?;
            return Self::from_uri(provider, &uri);
        }
        if paths::is_absolute(locator) {
            return Self::from_path(provider, locator);
        }
        Err(ResolveError::InvalidLocator(format!(
            "`{locator}` is neither a URI nor an absolute path"
        )))
    }

    /// Wrap an already-adopted handle.
    pub fn from_handle(handle: ItemHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &ItemHandle {
        &self.handle
    }

    pub fn provider(&self) -> &Rc<dyn NamespaceProvider> {
        self.handle.provider()
    }

    // =========================================================================
    // Names and attributes
    // =========================================================================

    /// The name shown in views.
    pub fn display_name(&self) -> NativeResult<String> {
        self.display_name_in(NameStyle::Normal)
    }

    /// A name in a specific style.
    pub fn display_name_in(&self, style: NameStyle) -> NativeResult<String> {
        self.provider().display_name(self.handle.raw(), style)
    }

    /// The full parsing name from the namespace root.
    pub fn parsing_name(&self) -> NativeResult<String> {
        self.display_name_in(NameStyle::Parsing)
    }

    /// The absolute filesystem path, or `None` for virtual items.
    pub fn file_system_path(&self) -> NativeResult<Option<String>> {
        if !self.is_file_system()? {
            return Ok(None);
        }
        self.display_name_in(NameStyle::FileSystemPath).map(Some)
    }

    pub fn attributes(&self) -> NativeResult<ItemAttributes> {
        self.provider().attributes(self.handle.raw())
    }

    pub fn is_folder(&self) -> NativeResult<bool> {
        Ok(self.attributes()?.contains(ItemAttributes::FOLDER))
    }

    pub fn is_file_system(&self) -> NativeResult<bool> {
        Ok(self.attributes()?.contains(ItemAttributes::FILE_SYSTEM))
    }

    pub fn is_file_system_ancestor(&self) -> NativeResult<bool> {
        Ok(self
            .attributes()?
            .contains(ItemAttributes::FILE_SYS_ANCESTOR))
    }

    pub fn has_sub_folders(&self) -> NativeResult<bool> {
        Ok(self.attributes()?.contains(ItemAttributes::HAS_SUBFOLDERS))
    }

    pub fn is_hidden(&self) -> NativeResult<bool> {
        Ok(self.attributes()?.contains(ItemAttributes::HIDDEN))
    }

    pub fn is_read_only(&self) -> NativeResult<bool> {
        Ok(self.attributes()?.contains(ItemAttributes::READ_ONLY))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// A direct child by name. Lookup folds case and Unicode normalization.
    pub fn child(&self, name: &str) -> ResolveResult<ShellItem> {
        let raw = self.provider().child_by_name(self.handle.raw(), name)?;
        Ok(Self::from_handle(ItemHandle::adopt(
            Rc::clone(self.provider()),
            raw,
        )))
    }

    /// The containing folder, or `None` at the namespace root.
    pub fn parent(&self) -> NativeResult<Option<ShellItem>> {
        let raw = self.provider().parent(self.handle.raw())?;
        Ok(raw.map(|raw| {
            Self::from_handle(ItemHandle::adopt(Rc::clone(self.provider()), raw))
        }))
    }

    /// Enumerate children with explicit flags, in display order.
    pub fn children(&self, flags: EnumerateFlags) -> ResolveResult<Vec<ShellItem>> {
        let raws = self.provider().children(self.handle.raw(), flags)?;
        Ok(raws
            .into_iter()
            .map(|raw| Self::from_handle(ItemHandle::adopt(Rc::clone(self.provider()), raw)))
            .collect())
    }

    /// Enumerate folders, non-folders and hidden items alike.
    pub fn children_default(&self) -> ResolveResult<Vec<ShellItem>> {
        self.children(crate::config::DEFAULT_ENUMERATE)
    }

    /// Distance from the namespace root.
    pub(crate) fn ancestry_depth(&self) -> NativeResult<usize> {
        let mut depth = 0;
        let mut cursor = self.parent()?;
        while let Some(item) = cursor {
            depth += 1;
            cursor = item.parent()?;
        }
        Ok(depth)
    }

    // =========================================================================
    // Ancestry and ordering
    // =========================================================================

    /// True when this folder appears anywhere in `item`'s parent chain.
    pub fn is_parent_of(&self, item: &ShellItem) -> NativeResult<bool> {
        self.ancestor_check(item, false)
    }

    /// True when this folder is `item`'s direct container.
    pub fn is_immediate_parent_of(&self, item: &ShellItem) -> NativeResult<bool> {
        self.ancestor_check(item, true)
    }

    fn ancestor_check(&self, item: &ShellItem, immediate_only: bool) -> NativeResult<bool> {
        if !Rc::ptr_eq(self.provider(), item.provider()) {
            return Ok(false);
        }
        if !self.is_folder()? {
            return Ok(false);
        }
        let mut cursor = item.parent()?;
        while let Some(candidate) = cursor {
            if candidate == *self {
                return Ok(true);
            }
            if immediate_only {
                return Ok(false);
            }
            cursor = candidate.parent()?;
        }
        Ok(false)
    }

    /// Display-order comparison, as a folder view would sort the two items.
    pub fn display_cmp(&self, other: &ShellItem) -> NativeResult<Ordering> {
        if !Rc::ptr_eq(self.provider(), other.provider()) {
            return Err(NativeError::new(
                "compare",
                "items belong to different namespaces",
            ));
        }
        self.provider().compare(self.handle.raw(), other.handle.raw())
    }

    // =========================================================================
    // URI form
    // =========================================================================

    /// The canonical URI for this location, against the provider's own
    /// known folders.
    pub fn to_uri(&self) -> ResolveResult<ShellUri> {
        let index = KnownFolderIndex::for_provider(Rc::clone(self.provider()));
        self.to_uri_with(&index)
    }

    /// The canonical URI for this location.
    ///
    /// Locations under a known folder render as `shell:///Name/seg/...`
    /// with parent-relative segments collected on the walk up to that
    /// folder. Filesystem locations outside every known folder render as
    /// `file://` URIs. A virtual location with no known-folder ancestor has
    /// no URI form.
    pub fn to_uri_with(&self, index: &KnownFolderIndex) -> ResolveResult<ShellUri> {
        if let Some(hit) = index.nearest_ancestor(self)? {
            let mut segments = Vec::new();
            let mut cursor = self.clone();
            while cursor != hit.item {
                segments.push(cursor.display_name_in(NameStyle::ParentRelative)?);
                cursor = cursor.parent()?.ok_or_else(|| {
                    ResolveError::InvalidLocator(
                        "item is not reachable from its known folder".to_string(),
                    )
                })?;
            }
            segments.reverse();
            trace!(folder = %hit.name, depth = segments.len(), "rendered shell uri");
            return Ok(ShellUri::shell(hit.name, segments));
        }
        match self.file_system_path()? {
            Some(path) => Ok(ShellUri::file(path)),
            None => Err(ResolveError::InvalidLocator(
                "virtual item outside every known folder has no URI form".to_string(),
            )),
        }
    }

    /// Path fallback for providers whose display-order comparison
    /// misreports equality: identical filesystem paths mean the same item.
    fn paths_agree(&self, other: &ShellItem) -> bool {
        match (self.file_system_path(), other.file_system_path()) {
            (Ok(Some(a)), Ok(Some(b))) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for ShellItem {
    fn eq(&self, other: &Self) -> bool {
        if !Rc::ptr_eq(self.provider(), other.provider()) {
            return false;
        }
        match self
            .provider()
            .compare(self.handle.raw(), other.handle.raw())
        {
            Ok(Ordering::Equal) => true,
            Ok(_) | Err(_) => self.paths_agree(other),
        }
    }
}

impl fmt::Display for ShellItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name() {
            Ok(name) => f.write_str(&name),
            Err(_) => f.write_str("<unavailable>"),
        }
    }
}
