//! Host filesystem provider.
//!
//! [`HostProvider`] exposes a directory of the real filesystem as a
//! namespace. The chosen root directory plays the desktop role; children
//! are read with [`std::fs`], and the platform's user directories (from
//! the `dirs` crate) are published as known folders when they live under
//! the root.
//!
//! The host namespace never emits change notifications; watching the real
//! filesystem is out of scope.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::core::error::{NativeError, NativeResult, ResolveError, ResolveResult};
use crate::models::{EnumerateFlags, ItemAttributes, NameStyle, SpecialFolder};
use crate::provider::{KnownFolderDecl, NamespaceProvider, RawHandle, fold_name};

/// A namespace rooted at a host directory.
pub struct HostProvider {
    root: PathBuf,
    handles: RefCell<HashMap<u64, PathBuf>>,
    next_handle: Cell<u64>,
    known: Vec<KnownFolderDecl>,
}

impl HostProvider {
    /// Open a namespace rooted at `root`. The directory must exist; its
    /// canonical form becomes the desktop item.
    pub fn new(root: impl AsRef<Path>) -> NativeResult<Self> {
        let root = fs::canonicalize(root.as_ref())
            .map_err(|e| NativeError::new("canonicalize", e.to_string()))?;
        let known = user_dirs_under(&root);
        debug!(root = %root.display(), known_folders = known.len(), "host namespace opened");
        Ok(Self {
            root,
            handles: RefCell::new(HashMap::new()),
            next_handle: Cell::new(0),
            known,
        })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of live handles.
    pub fn outstanding_handles(&self) -> usize {
        self.handles.borrow().len()
    }

    fn mint(&self, path: PathBuf) -> RawHandle {
        let id = self.next_handle.get() + 1;
        self.next_handle.set(id);
        self.handles.borrow_mut().insert(id, path);
        RawHandle(id)
    }

    fn path_of(&self, handle: RawHandle, operation: &'static str) -> NativeResult<PathBuf> {
        self.handles
            .borrow()
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| NativeError::new(operation, format!("stale handle {}", handle.0)))
    }

    fn admit(&self, path: &Path) -> ResolveResult<()> {
        if path.starts_with(&self.root) {
            Ok(())
        } else {
            Err(ResolveError::InvalidLocator(format!(
                "`{}` is outside the namespace root",
                path.display()
            )))
        }
    }

    fn leaf_name(&self, path: &Path) -> String {
        if path == self.root {
            return root_display_name(&self.root);
        }
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    /// Display-order rank of a direct child: folders first, then
    /// case-folded name.
    fn entry_rank(path: &Path) -> (bool, String, String) {
        let is_dir = fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (!is_dir, fold_name(&name), name)
    }
}

fn root_display_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn map_io(operation: &'static str, path: &Path, error: io::Error) -> ResolveError {
    if error.kind() == io::ErrorKind::NotFound {
        ResolveError::NotFound(path.display().to_string())
    } else {
        NativeError::new(operation, format!("{}: {error}", path.display())).into()
    }
}

/// The platform user directories that live under `root`, in the order the
/// places list shows them.
fn user_dirs_under(root: &Path) -> Vec<KnownFolderDecl> {
    let candidates: [(&str, SpecialFolder, Option<PathBuf>); 7] = [
        ("Desktop", SpecialFolder::Desktop, dirs::desktop_dir()),
        ("Personal", SpecialFolder::Documents, dirs::document_dir()),
        ("Downloads", SpecialFolder::Downloads, dirs::download_dir()),
        ("My Pictures", SpecialFolder::Pictures, dirs::picture_dir()),
        ("My Music", SpecialFolder::Music, dirs::audio_dir()),
        ("My Video", SpecialFolder::Videos, dirs::video_dir()),
        ("Home", SpecialFolder::Home, dirs::home_dir()),
    ];

    candidates
        .into_iter()
        .filter_map(|(name, special, dir)| {
            let dir = dir?;
            let canonical = fs::canonicalize(&dir).ok()?;
            canonical.starts_with(root).then(|| KnownFolderDecl {
                name: name.to_string(),
                special: Some(special),
                path: Some(canonical.display().to_string()),
            })
        })
        .collect()
}

impl NamespaceProvider for HostProvider {
    fn desktop(&self) -> NativeResult<RawHandle> {
        Ok(self.mint(self.root.clone()))
    }

    fn resolve_path(&self, path: &str) -> ResolveResult<RawHandle> {
        let requested = Path::new(path);
        if !requested.is_absolute() {
            return Err(ResolveError::InvalidLocator(format!(
                "`{path}` is not an absolute path"
            )));
        }
        let canonical =
            fs::canonicalize(requested).map_err(|e| map_io("canonicalize", requested, e))?;
        self.admit(&canonical)?;
        trace!(path = %canonical.display(), "path resolved");
        Ok(self.mint(canonical))
    }

    fn special_folder(&self, folder: SpecialFolder) -> ResolveResult<RawHandle> {
        let decl = self
            .known
            .iter()
            .find(|decl| decl.special == Some(folder))
            .ok_or_else(|| ResolveError::NotFound(format!("special folder {folder:?}")))?;
        match &decl.path {
            Some(path) => Ok(self.mint(PathBuf::from(path))),
            None => Err(ResolveError::NotFound(format!("special folder {folder:?}"))),
        }
    }

    fn child_by_name(&self, parent: RawHandle, name: &str) -> ResolveResult<RawHandle> {
        let parent_path = self.path_of(parent, "child_by_name")?;

        let direct = parent_path.join(name);
        if direct.exists() {
            return Ok(self.mint(direct));
        }

        // Case and normalization differences: scan the directory and match
        // on folded names.
        let wanted = fold_name(name);
        let entries =
            fs::read_dir(&parent_path).map_err(|e| map_io("read_dir", &parent_path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| map_io("read_dir", &parent_path, e))?;
            if fold_name(&entry.file_name().to_string_lossy()) == wanted {
                return Ok(self.mint(entry.path()));
            }
        }
        Err(ResolveError::NotFound(name.to_string()))
    }

    fn parent(&self, handle: RawHandle) -> NativeResult<Option<RawHandle>> {
        let path = self.path_of(handle, "parent")?;
        if path == self.root {
            return Ok(None);
        }
        match path.parent() {
            Some(parent) if parent.starts_with(&self.root) => {
                Ok(Some(self.mint(parent.to_path_buf())))
            }
            _ => Ok(None),
        }
    }

    fn display_name(&self, handle: RawHandle, style: NameStyle) -> NativeResult<String> {
        let path = self.path_of(handle, "display_name")?;
        match style {
            NameStyle::Normal | NameStyle::ParentRelative => Ok(self.leaf_name(&path)),
            NameStyle::Parsing | NameStyle::FileSystemPath => {
                Ok(path.display().to_string())
            }
        }
    }

    fn attributes(&self, handle: RawHandle) -> NativeResult<ItemAttributes> {
        let path = self.path_of(handle, "attributes")?;
        let metadata = fs::metadata(&path)
            .map_err(|e| NativeError::new("metadata", format!("{}: {e}", path.display())))?;

        let mut attrs = ItemAttributes::FILE_SYSTEM;
        if metadata.is_dir() {
            attrs |= ItemAttributes::FOLDER;
            let has_subdir = fs::read_dir(&path)
                .map(|mut entries| {
                    entries.any(|entry| {
                        entry
                            .map(|e| e.metadata().map(|m| m.is_dir()).unwrap_or(false))
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false);
            if has_subdir {
                attrs |= ItemAttributes::HAS_SUBFOLDERS;
            }
        }
        if metadata.permissions().readonly() {
            attrs |= ItemAttributes::READ_ONLY;
        }
        if is_dotfile(&path) {
            attrs |= ItemAttributes::HIDDEN;
        }
        Ok(attrs)
    }

    fn children(&self, handle: RawHandle, flags: EnumerateFlags) -> ResolveResult<Vec<RawHandle>> {
        let path = self.path_of(handle, "children")?;
        let entries = fs::read_dir(&path).map_err(|e| map_io("read_dir", &path, e))?;

        let mut selected: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| map_io("read_dir", &path, e))?;
            let entry_path = entry.path();
            let is_dir = entry
                .metadata()
                .map(|m| m.is_dir())
                .map_err(|e| map_io("metadata", &entry_path, e))?;
            if is_dir && !flags.contains(EnumerateFlags::FOLDERS) {
                continue;
            }
            if !is_dir && !flags.contains(EnumerateFlags::NON_FOLDERS) {
                continue;
            }
            if is_dotfile(&entry_path) && !flags.contains(EnumerateFlags::INCLUDE_HIDDEN) {
                continue;
            }
            selected.push(entry_path);
        }
        selected.sort_by_key(|p| Self::entry_rank(p));
        Ok(selected.into_iter().map(|p| self.mint(p)).collect())
    }

    fn compare(&self, a: RawHandle, b: RawHandle) -> NativeResult<Ordering> {
        let path_a = self.path_of(a, "compare")?;
        let path_b = self.path_of(b, "compare")?;
        if path_a == path_b {
            return Ok(Ordering::Equal);
        }
        // Ancestors order before descendants; siblings follow display order.
        if path_b.starts_with(&path_a) {
            return Ok(Ordering::Less);
        }
        if path_a.starts_with(&path_b) {
            return Ok(Ordering::Greater);
        }
        let mut walk_a = path_a.components();
        let mut walk_b = path_b.components();
        let mut prefix = PathBuf::new();
        loop {
            match (walk_a.next(), walk_b.next()) {
                (Some(x), Some(y)) if x == y => prefix.push(x),
                (Some(x), Some(y)) => {
                    let rank_x = Self::entry_rank(&prefix.join(x));
                    let rank_y = Self::entry_rank(&prefix.join(y));
                    return Ok(rank_x.cmp(&rank_y));
                }
                (None, Some(_)) => return Ok(Ordering::Less),
                (Some(_), None) => return Ok(Ordering::Greater),
                (None, None) => return Ok(Ordering::Equal),
            }
        }
    }

    fn clone_handle(&self, handle: RawHandle) -> RawHandle {
        let path = self.handles.borrow().get(&handle.0).cloned();
        match path {
            Some(path) => self.mint(path),
            None => {
                trace!(handle = handle.0, "clone of stale handle");
                let id = self.next_handle.get() + 1;
                self.next_handle.set(id);
                RawHandle(id)
            }
        }
    }

    fn release(&self, handle: RawHandle) {
        if self.handles.borrow_mut().remove(&handle.0).is_none() {
            trace!(handle = handle.0, "release of unknown handle");
        }
    }

    fn known_folders(&self) -> Vec<KnownFolderDecl> {
        self.known.clone()
    }
}
