//! Manifest-backed virtual namespace provider.
//!
//! [`MemoryProvider`] builds a complete namespace tree from a
//! [`NamespaceManifest`]: a desktop root, a computer folder holding drives,
//! and folder/file chains beneath them. It backs tests, fixtures and the
//! demo CLI, and it models the awkward corners of a real namespace too:
//! locations that fail enumeration, change notifications, and a toggle that
//! reproduces the display-order comparison misreporting seen on some
//! platforms.
//!
//! Namespace mutations (`create_file`, `rename`, ...) queue
//! [`RawNotification`]s; callers drain them with
//! [`MemoryProvider::drain_notifications`] and feed them to a router,
//! mirroring message-loop delivery.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::core::error::{
    ManifestError, ManifestResult, NativeError, NativeResult, ResolveError, ResolveResult,
};
use crate::models::{
    EnumerateFlags, ItemAttributes, NameStyle, NamespaceManifest, RawNotification, SpecialFolder,
    codes,
};
use crate::provider::{ItemHandle, KnownFolderDecl, NamespaceProvider, RawHandle, fold_name};
use crate::utils::paths;

type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Root,
    Virtual,
    Drive,
    Folder,
    File,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    folded: String,
    kind: NodeKind,
    /// Normalized filesystem path for file-system-backed nodes.
    path: Option<String>,
    parent: Option<NodeId>,
    /// Child ids in display order.
    children: Vec<NodeId>,
    special: Option<SpecialFolder>,
    hidden: bool,
    read_only: bool,
    inaccessible: bool,
    shared: bool,
    /// Removed from the tree, or a pre-mutation snapshot. Detached nodes
    /// stay addressable through handles captured earlier.
    detached: bool,
}

impl Node {
    fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let name = name.into();
        let folded = fold_name(&name);
        Self {
            name,
            folded,
            kind,
            path: None,
            parent: None,
            children: Vec::new(),
            special: None,
            hidden: false,
            read_only: false,
            inaccessible: false,
            shared: false,
            detached: false,
        }
    }

    fn is_folder(&self) -> bool {
        self.kind != NodeKind::File
    }
}

#[derive(Debug)]
struct Namespace {
    nodes: Vec<Node>,
    root: NodeId,
    computer: Option<NodeId>,
    /// Normalized path -> live node.
    path_index: HashMap<String, NodeId>,
    handles: HashMap<u64, NodeId>,
    next_handle: u64,
    pending: VecDeque<(u32, RawHandle, Option<RawHandle>)>,
    known: Vec<KnownFolderDecl>,
}

impl Namespace {
    fn new() -> Self {
        let mut root = Node::new("Desktop", NodeKind::Root);
        root.special = Some(SpecialFolder::Desktop);
        Self {
            nodes: vec![root],
            root: 0,
            computer: None,
            path_index: HashMap::new(),
            handles: HashMap::new(),
            next_handle: 0,
            pending: VecDeque::new(),
            known: Vec::new(),
        }
    }

    fn mint(&mut self, id: NodeId) -> RawHandle {
        self.next_handle += 1;
        let handle = RawHandle(self.next_handle);
        self.handles.insert(handle.0, id);
        handle
    }

    fn node_of(&self, handle: RawHandle, operation: &'static str) -> NativeResult<NodeId> {
        self.handles
            .get(&handle.0)
            .copied()
            .ok_or_else(|| NativeError::new(operation, format!("stale handle {}", handle.0)))
    }

    fn ensure_computer(&mut self) -> NodeId {
        if let Some(id) = self.computer {
            return id;
        }
        let mut node = Node::new("Computer", NodeKind::Virtual);
        node.special = Some(SpecialFolder::Computer);
        let id = self.add_child(self.root, node);
        self.computer = Some(id);
        id
    }

    fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = self.nodes.len();
        self.nodes.push(node);
        if let Some(path) = self.nodes[id].path.clone() {
            self.path_index.insert(path, id);
        }
        self.insort_child(parent, id);
        id
    }

    /// Keep `parent.children` in display order: folders before files, then
    /// folded-name order.
    fn insort_child(&mut self, parent: NodeId, child: NodeId) {
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&sibling| self.sibling_order(child, sibling) == Ordering::Less)
            .unwrap_or(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(position, child);
    }

    fn sibling_order(&self, a: NodeId, b: NodeId) -> Ordering {
        let na = &self.nodes[a];
        let nb = &self.nodes[b];
        nb.is_folder()
            .cmp(&na.is_folder())
            .then_with(|| na.folded.cmp(&nb.folded))
            .then_with(|| na.name.cmp(&nb.name))
            .then_with(|| a.cmp(&b))
    }

    fn find_child(&self, parent: NodeId, folded: &str) -> Option<NodeId> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].folded == folded)
    }

    /// Root-to-node identity chain.
    fn chain(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            chain.push(node);
            current = self.nodes[node].parent;
        }
        chain.reverse();
        chain
    }

    fn has_fs_descendant(&self, id: NodeId) -> bool {
        self.nodes[id].children.iter().any(|&child| {
            self.nodes[child].path.is_some() || self.has_fs_descendant(child)
        })
    }

    fn attributes_of(&self, id: NodeId) -> ItemAttributes {
        let node = &self.nodes[id];
        let mut attrs = ItemAttributes::empty();
        if node.is_folder() {
            attrs |= ItemAttributes::FOLDER;
        }
        if node.path.is_some() {
            attrs |= ItemAttributes::FILE_SYSTEM;
        } else if node.is_folder() && self.has_fs_descendant(id) {
            attrs |= ItemAttributes::FILE_SYS_ANCESTOR;
        }
        if node.read_only {
            attrs |= ItemAttributes::READ_ONLY;
        }
        if node.hidden {
            attrs |= ItemAttributes::HIDDEN;
        }
        if node
            .children
            .iter()
            .any(|&child| self.nodes[child].is_folder())
        {
            attrs |= ItemAttributes::HAS_SUBFOLDERS;
        }
        attrs
    }

    /// Find a node by normalized path: exact match through the index, then
    /// a case-insensitive component walk from the drive.
    fn resolve_norm_path(&self, norm: &str) -> Option<NodeId> {
        if let Some(&id) = self.path_index.get(norm) {
            return Some(id);
        }

        let computer = self.computer?;
        let comps = paths::components(norm);
        let rooted = norm.starts_with('/');
        let (drive_key, rest) = if rooted {
            ("/".to_string(), comps.as_slice())
        } else {
            let (head, tail) = comps.split_first()?;
            (fold_name(head), tail)
        };

        let mut current = self.nodes[computer]
            .children
            .iter()
            .copied()
            .find(|&d| fold_name(&self.nodes[d].name) == drive_key)?;
        for comp in rest {
            current = self.find_child(current, &fold_name(comp))?;
        }
        Some(current)
    }

    fn drive_path(name: &str) -> String {
        if name == "/" {
            "/".to_string()
        } else {
            paths::normalize(name)
        }
    }

    fn ensure_drive(&mut self, name: &str) -> NodeId {
        let path = Self::drive_path(name);
        if let Some(&id) = self.path_index.get(&path) {
            return id;
        }
        let computer = self.ensure_computer();
        let mut node = Node::new(name, NodeKind::Drive);
        node.path = Some(path);
        self.add_child(computer, node)
    }

    /// Materialize the folder chain for an absolute path, creating the
    /// drive and every intermediate folder as needed.
    fn ensure_folder_chain(&mut self, path: &str) -> ManifestResult<NodeId> {
        let norm = paths::normalize(path);
        if !paths::is_absolute(&norm) {
            return Err(ManifestError::RelativePath(path.to_string()));
        }

        let rooted = norm.starts_with('/');
        let comps = paths::components(&norm);
        let (drive_name, rest): (String, &[&str]) = if rooted {
            ("/".to_string(), comps.as_slice())
        } else {
            let (head, tail) = comps
                .split_first()
                .ok_or_else(|| ManifestError::RelativePath(path.to_string()))?;
            (head.to_string(), tail)
        };

        let mut current = self.ensure_drive(&drive_name);
        let mut current_path = Self::drive_path(&drive_name);
        for comp in rest {
            current_path = paths::join(&current_path, comp);
            match self.find_child(current, &fold_name(comp)) {
                Some(child) if self.nodes[child].is_folder() => current = child,
                Some(_) => return Err(ManifestError::Conflict(current_path)),
                None => {
                    let mut node = Node::new(*comp, NodeKind::Folder);
                    node.path = Some(current_path.clone());
                    current = self.add_child(current, node);
                }
            }
        }
        Ok(current)
    }

    fn detach_subtree(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent
            && let Some(position) = self.nodes[parent].children.iter().position(|&c| c == id)
        {
            self.nodes[parent].children.remove(position);
        }
        self.mark_detached(id);
    }

    fn mark_detached(&mut self, id: NodeId) {
        self.nodes[id].detached = true;
        if let Some(path) = self.nodes[id].path.clone()
            && self.path_index.get(&path) == Some(&id)
        {
            self.path_index.remove(&path);
        }
        let children = self.nodes[id].children.clone();
        for child in children {
            self.mark_detached(child);
        }
    }

    /// Recompute the paths of a renamed node and everything beneath it.
    fn reroot_paths(&mut self, id: NodeId) {
        let parent_path = self.nodes[id]
            .parent
            .and_then(|parent| self.nodes[parent].path.clone());
        self.reroot_rec(id, parent_path.as_deref());
    }

    fn reroot_rec(&mut self, id: NodeId, parent_path: Option<&str>) {
        if self.nodes[id].path.is_some()
            && let Some(parent_path) = parent_path
        {
            let new_path = paths::join(parent_path, &self.nodes[id].name);
            if let Some(old) = self.nodes[id].path.take()
                && self.path_index.get(&old) == Some(&id)
            {
                self.path_index.remove(&old);
            }
            self.nodes[id].path = Some(new_path.clone());
            self.path_index.insert(new_path, id);
        }
        let own_path = self.nodes[id].path.clone();
        let children = self.nodes[id].children.clone();
        for child in children {
            self.reroot_rec(child, own_path.as_deref());
        }
    }

    fn queue(&mut self, code: u32, primary: NodeId, secondary: Option<NodeId>) {
        let primary = self.mint(primary);
        let secondary = secondary.map(|id| self.mint(id));
        self.pending.push_back((code, primary, secondary));
    }
}

/// A virtual namespace held entirely in memory.
#[derive(Debug)]
pub struct MemoryProvider {
    ns: RefCell<Namespace>,
    misreport: Cell<bool>,
}

impl MemoryProvider {
    /// An empty namespace: a desktop root with no children.
    pub fn empty() -> Self {
        Self {
            ns: RefCell::new(Namespace::new()),
            misreport: Cell::new(false),
        }
    }

    /// Build a namespace from a manifest.
    pub fn from_manifest(manifest: &NamespaceManifest) -> ManifestResult<Self> {
        let provider = Self::empty();
        {
            let mut ns = provider.ns.borrow_mut();

            for drive in &manifest.drives {
                Self::validate_drive_name(&drive.name)?;
                ns.ensure_drive(&drive.name);
            }

            for def in &manifest.known_folders {
                let id = match &def.path {
                    Some(path) => {
                        let id = ns.ensure_folder_chain(path)?;
                        if let Some(display) = &def.display {
                            ns.nodes[id].name = display.clone();
                            ns.nodes[id].folded = fold_name(display);
                        }
                        id
                    }
                    None => {
                        // Virtual registrations adopt an existing node with
                        // the same designator (the desktop, the computer)
                        // instead of growing a second one.
                        let adopted = def
                            .special
                            .and_then(|special| ns.find_special(special));
                        match adopted {
                            Some(id) => id,
                            None => {
                                let node =
                                    Node::new(def.display_name(), NodeKind::Virtual);
                                let root = ns.root;
                                ns.add_child(root, node)
                            }
                        }
                    }
                };
                if ns.nodes[id].special.is_none() {
                    ns.nodes[id].special = def.special;
                }
                let decl = KnownFolderDecl {
                    name: def.name.clone(),
                    special: def.special,
                    path: ns.nodes[id].path.clone(),
                };
                ns.known.push(decl);
            }

            for folder in &manifest.folders {
                let id = ns.ensure_folder_chain(&folder.path)?;
                let node = &mut ns.nodes[id];
                node.hidden = folder.hidden;
                node.read_only = folder.read_only;
                node.inaccessible = folder.inaccessible;
                node.shared = folder.shared;
                if node.special.is_none() {
                    node.special = folder.special;
                }
            }

            for file in &manifest.files {
                ns.add_file(&file.path, file.hidden, file.read_only)?;
            }

            debug!(
                nodes = ns.nodes.len(),
                known_folders = ns.known.len(),
                "namespace built from manifest"
            );
        }
        Ok(provider)
    }

    /// Build a namespace from TOML manifest text.
    pub fn from_toml_str(text: &str) -> ManifestResult<Self> {
        Self::from_manifest(&NamespaceManifest::from_toml_str(text)?)
    }

    /// Build a namespace from JSON manifest text.
    pub fn from_json_str(text: &str) -> ManifestResult<Self> {
        Self::from_manifest(&NamespaceManifest::from_json_str(text)?)
    }

    fn validate_drive_name(name: &str) -> ManifestResult<()> {
        if name == "/" || paths::is_drive(name) {
            Ok(())
        } else {
            Err(ManifestError::InvalidDrive(name.to_string()))
        }
    }

    /// Number of live handles. Zero once every item and undrained
    /// notification has been dropped.
    pub fn outstanding_handles(&self) -> usize {
        self.ns.borrow().handles.len()
    }

    /// Make display-order comparison report inequality for distinct handles
    /// to the same location. Reproduces the platform misreporting that the
    /// item-equality path fallback compensates for.
    pub fn set_misreport_display_order_equality(&self, on: bool) {
        self.misreport.set(on);
    }

    /// Take the queued change notifications, oldest first.
    pub fn drain_notifications(provider: &Rc<Self>) -> Vec<RawNotification> {
        let drained: Vec<_> = {
            let mut ns = provider.ns.borrow_mut();
            ns.pending.drain(..).collect()
        };
        drained
            .into_iter()
            .map(|(code, primary, secondary)| {
                let shared: Rc<dyn NamespaceProvider> = provider.clone();
                RawNotification {
                    code,
                    item: ItemHandle::adopt(Rc::clone(&shared), primary),
                    other: secondary.map(|raw| ItemHandle::adopt(shared, raw)),
                }
            })
            .collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a file under an existing folder. Queues an item-created
    /// notification.
    pub fn create_file(&self, path: &str) -> ResolveResult<()> {
        self.create_node(path, NodeKind::File, codes::CREATE)
    }

    /// Create a folder under an existing folder. Queues a folder-created
    /// notification.
    pub fn create_folder(&self, path: &str) -> ResolveResult<()> {
        self.create_node(path, NodeKind::Folder, codes::MAKE_DIR)
    }

    fn create_node(&self, path: &str, kind: NodeKind, code: u32) -> ResolveResult<()> {
        let mut ns = self.ns.borrow_mut();
        let norm = paths::normalize(path);
        let parent_path = paths::parent(&norm)
            .ok_or_else(|| ResolveError::InvalidLocator(format!("`{path}` has no parent")))?;
        let name = paths::leaf(&norm)
            .ok_or_else(|| ResolveError::InvalidLocator(format!("`{path}` has no name")))?
            .to_string();
        let parent = ns
            .resolve_norm_path(&parent_path)
            .ok_or_else(|| ResolveError::NotFound(parent_path.clone()))?;
        if ns.find_child(parent, &fold_name(&name)).is_some() {
            return Err(ResolveError::InvalidLocator(format!(
                "`{norm}` already exists"
            )));
        }
        let mut node = Node::new(name, kind);
        node.path = Some(norm.clone());
        let id = ns.add_child(parent, node);
        ns.queue(code, id, None);
        debug!(path = %norm, ?kind, "created");
        Ok(())
    }

    /// Remove an item and everything beneath it. Queues an item-deleted or
    /// folder-deleted notification.
    pub fn remove(&self, path: &str) -> ResolveResult<()> {
        let mut ns = self.ns.borrow_mut();
        let norm = paths::normalize(path);
        let id = ns
            .resolve_norm_path(&norm)
            .ok_or_else(|| ResolveError::NotFound(norm.clone()))?;
        let code = if ns.nodes[id].is_folder() {
            codes::REMOVE_DIR
        } else {
            codes::DELETE
        };
        // Capture the identity before detaching so the notification still
        // describes the removed location.
        ns.queue(code, id, None);
        ns.detach_subtree(id);
        debug!(path = %norm, "removed");
        Ok(())
    }

    /// Rename an item in place. Queues a rename notification carrying the
    /// old identity and the new one.
    pub fn rename(&self, path: &str, new_name: &str) -> ResolveResult<()> {
        let mut ns = self.ns.borrow_mut();
        let norm = paths::normalize(path);
        let id = ns
            .resolve_norm_path(&norm)
            .ok_or_else(|| ResolveError::NotFound(norm.clone()))?;
        match ns.nodes[id].kind {
            NodeKind::Root | NodeKind::Drive => {
                return Err(ResolveError::InvalidLocator(format!(
                    "`{norm}` cannot be renamed"
                )));
            }
            NodeKind::Virtual | NodeKind::Folder | NodeKind::File => {}
        }
        if let Some(parent) = ns.nodes[id].parent
            && let Some(existing) = ns.find_child(parent, &fold_name(new_name))
            && existing != id
        {
            return Err(ResolveError::InvalidLocator(format!(
                "`{new_name}` already exists next to `{norm}`"
            )));
        }

        // Snapshot the pre-rename identity; handles to it keep answering
        // with the old name and path.
        let mut shadow = ns.nodes[id].clone();
        shadow.children = Vec::new();
        shadow.detached = true;
        let shadow_id = ns.nodes.len();
        ns.nodes.push(shadow);

        ns.nodes[id].name = new_name.to_string();
        ns.nodes[id].folded = fold_name(new_name);
        ns.reroot_paths(id);
        if let Some(parent) = ns.nodes[id].parent
            && let Some(position) = ns.nodes[parent].children.iter().position(|&c| c == id)
        {
            ns.nodes[parent].children.remove(position);
            ns.insort_child(parent, id);
        }

        let code = if ns.nodes[id].is_folder() {
            codes::RENAME_FOLDER
        } else {
            codes::RENAME_ITEM
        };
        ns.queue(code, shadow_id, Some(id));
        debug!(from = %norm, to = %new_name, "renamed");
        Ok(())
    }

    /// Mark an item as updated. Queues an item-updated or folder-updated
    /// notification.
    pub fn touch(&self, path: &str) -> ResolveResult<()> {
        let mut ns = self.ns.borrow_mut();
        let norm = paths::normalize(path);
        let id = ns
            .resolve_norm_path(&norm)
            .ok_or_else(|| ResolveError::NotFound(norm.clone()))?;
        let code = if ns.nodes[id].is_folder() {
            codes::UPDATE_DIR
        } else {
            codes::UPDATE_ITEM
        };
        ns.queue(code, id, None);
        Ok(())
    }

    /// Attach a drive under the computer folder. Queues a drive-added
    /// notification.
    pub fn attach_drive(&self, name: &str) -> ResolveResult<()> {
        Self::validate_drive_name(name)
            .map_err(|_| ResolveError::InvalidLocator(format!("`{name}` is not a drive name")))?;
        let mut ns = self.ns.borrow_mut();
        if ns.path_index.contains_key(&Namespace::drive_path(name)) {
            return Err(ResolveError::InvalidLocator(format!(
                "drive `{name}` is already attached"
            )));
        }
        let id = ns.ensure_drive(name);
        ns.queue(codes::DRIVE_ADDED, id, None);
        debug!(drive = %name, "drive attached");
        Ok(())
    }

    /// Detach a drive and everything on it. Queues a drive-removed
    /// notification.
    pub fn detach_drive(&self, name: &str) -> ResolveResult<()> {
        let mut ns = self.ns.borrow_mut();
        let path = Namespace::drive_path(name);
        let id = ns
            .path_index
            .get(&path)
            .copied()
            .ok_or_else(|| ResolveError::NotFound(path.clone()))?;
        ns.queue(codes::DRIVE_REMOVED, id, None);
        ns.detach_subtree(id);
        debug!(drive = %name, "drive detached");
        Ok(())
    }

    /// Change an item's shared state. Queues a sharing-changed
    /// notification.
    pub fn set_shared(&self, path: &str, shared: bool) -> ResolveResult<()> {
        let mut ns = self.ns.borrow_mut();
        let norm = paths::normalize(path);
        let id = ns
            .resolve_norm_path(&norm)
            .ok_or_else(|| ResolveError::NotFound(norm.clone()))?;
        ns.nodes[id].shared = shared;
        let code = if shared {
            codes::NET_SHARE
        } else {
            codes::NET_UNSHARE
        };
        ns.queue(code, id, None);
        Ok(())
    }
}

impl Namespace {
    fn find_special(&self, special: SpecialFolder) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| !node.detached && node.special == Some(special))
    }

    fn add_file(&mut self, path: &str, hidden: bool, read_only: bool) -> ManifestResult<NodeId> {
        let norm = paths::normalize(path);
        if !paths::is_absolute(&norm) {
            return Err(ManifestError::RelativePath(path.to_string()));
        }
        let parent_path = paths::parent(&norm)
            .ok_or_else(|| ManifestError::RelativePath(path.to_string()))?;
        let name = paths::leaf(&norm)
            .ok_or_else(|| ManifestError::RelativePath(path.to_string()))?
            .to_string();
        let parent = self.ensure_folder_chain(&parent_path)?;

        match self.find_child(parent, &fold_name(&name)) {
            Some(existing) if self.nodes[existing].kind == NodeKind::File => {
                self.nodes[existing].hidden = hidden;
                self.nodes[existing].read_only = read_only;
                Ok(existing)
            }
            Some(_) => Err(ManifestError::Conflict(norm)),
            None => {
                let mut node = Node::new(name, NodeKind::File);
                node.path = Some(norm);
                node.hidden = hidden;
                node.read_only = read_only;
                Ok(self.add_child(parent, node))
            }
        }
    }
}

impl NamespaceProvider for MemoryProvider {
    fn desktop(&self) -> NativeResult<RawHandle> {
        let mut ns = self.ns.borrow_mut();
        let root = ns.root;
        Ok(ns.mint(root))
    }

    fn resolve_path(&self, path: &str) -> ResolveResult<RawHandle> {
        if !paths::is_absolute(path) {
            return Err(ResolveError::InvalidLocator(format!(
                "`{path}` is not an absolute path"
            )));
        }
        let mut ns = self.ns.borrow_mut();
        let norm = paths::normalize(path);
        let id = ns
            .resolve_norm_path(&norm)
            .ok_or_else(|| ResolveError::NotFound(norm.clone()))?;
        trace!(path = %norm, node = id, "path resolved");
        Ok(ns.mint(id))
    }

    fn special_folder(&self, folder: SpecialFolder) -> ResolveResult<RawHandle> {
        let mut ns = self.ns.borrow_mut();
        let id = ns
            .find_special(folder)
            .ok_or_else(|| ResolveError::NotFound(format!("special folder {folder:?}")))?;
        Ok(ns.mint(id))
    }

    fn child_by_name(&self, parent: RawHandle, name: &str) -> ResolveResult<RawHandle> {
        let mut ns = self.ns.borrow_mut();
        let parent_id = ns.node_of(parent, "child_by_name")?;
        let child = ns
            .find_child(parent_id, &fold_name(name))
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;
        trace!(parent = parent_id, name, "child resolved");
        Ok(ns.mint(child))
    }

    fn parent(&self, handle: RawHandle) -> NativeResult<Option<RawHandle>> {
        let mut ns = self.ns.borrow_mut();
        let id = ns.node_of(handle, "parent")?;
        match ns.nodes[id].parent {
            Some(parent) => Ok(Some(ns.mint(parent))),
            None => Ok(None),
        }
    }

    fn display_name(&self, handle: RawHandle, style: NameStyle) -> NativeResult<String> {
        let ns = self.ns.borrow();
        let id = ns.node_of(handle, "display_name")?;
        let node = &ns.nodes[id];
        match style {
            NameStyle::Normal | NameStyle::ParentRelative => Ok(node.name.clone()),
            NameStyle::Parsing => match &node.path {
                Some(path) => Ok(path.clone()),
                None => {
                    let names: Vec<&str> = ns
                        .chain(id)
                        .into_iter()
                        .map(|n| ns.nodes[n].name.as_str())
                        .collect();
                    Ok(names.join("\\"))
                }
            },
            NameStyle::FileSystemPath => node.path.clone().ok_or_else(|| {
                NativeError::new(
                    "display_name",
                    format!("`{}` is not file-system backed", node.name),
                )
            }),
        }
    }

    fn attributes(&self, handle: RawHandle) -> NativeResult<ItemAttributes> {
        let ns = self.ns.borrow();
        let id = ns.node_of(handle, "attributes")?;
        Ok(ns.attributes_of(id))
    }

    fn children(
        &self,
        handle: RawHandle,
        flags: EnumerateFlags,
    ) -> ResolveResult<Vec<RawHandle>> {
        let mut ns = self.ns.borrow_mut();
        let id = ns.node_of(handle, "children")?;
        let node = &ns.nodes[id];
        if node.inaccessible {
            return Err(NativeError::new(
                "children",
                format!("`{}` is not accessible", node.name),
            )
            .into());
        }
        if node.detached {
            return Err(NativeError::new(
                "children",
                format!("`{}` no longer exists", node.name),
            )
            .into());
        }
        let selected: Vec<NodeId> = node
            .children
            .iter()
            .copied()
            .filter(|&child| {
                let child = &ns.nodes[child];
                if child.is_folder() && !flags.contains(EnumerateFlags::FOLDERS) {
                    return false;
                }
                if !child.is_folder() && !flags.contains(EnumerateFlags::NON_FOLDERS) {
                    return false;
                }
                !(child.hidden && !flags.contains(EnumerateFlags::INCLUDE_HIDDEN))
            })
            .collect();
        Ok(selected.into_iter().map(|child| ns.mint(child)).collect())
    }

    fn compare(&self, a: RawHandle, b: RawHandle) -> NativeResult<Ordering> {
        let ns = self.ns.borrow();
        let node_a = ns.node_of(a, "compare")?;
        let node_b = ns.node_of(b, "compare")?;

        if node_a == node_b {
            if self.misreport.get() && a != b {
                // Quirk mode: two handles to the same location compare
                // unequal, like some platforms misreport.
                return Ok(a.0.cmp(&b.0));
            }
            return Ok(Ordering::Equal);
        }

        let chain_a = ns.chain(node_a);
        let chain_b = ns.chain(node_b);
        let mut walk_a = chain_a.iter();
        let mut walk_b = chain_b.iter();
        loop {
            match (walk_a.next(), walk_b.next()) {
                (Some(&x), Some(&y)) if x == y => continue,
                (Some(&x), Some(&y)) => return Ok(ns.sibling_order(x, y)),
                (None, Some(_)) => return Ok(Ordering::Less),
                (Some(_), None) => return Ok(Ordering::Greater),
                (None, None) => return Ok(Ordering::Equal),
            }
        }
    }

    fn clone_handle(&self, handle: RawHandle) -> RawHandle {
        let mut ns = self.ns.borrow_mut();
        match ns.handles.get(&handle.0).copied() {
            Some(id) => ns.mint(id),
            None => {
                // Cloning a released handle is a bug in the caller; hand
                // back a handle that will fail subsequent lookups.
                trace!(handle = handle.0, "clone of stale handle");
                ns.next_handle += 1;
                RawHandle(ns.next_handle)
            }
        }
    }

    fn release(&self, handle: RawHandle) {
        let mut ns = self.ns.borrow_mut();
        if ns.handles.remove(&handle.0).is_none() {
            trace!(handle = handle.0, "release of unknown handle");
        }
    }

    fn known_folders(&self) -> Vec<KnownFolderDecl> {
        self.ns.borrow().known.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MemoryProvider {
        MemoryProvider::from_toml_str(
            r#"
            [[known_folders]]
            name = "Personal"
            display = "Documents"
            path = 'C:\Users\ada\Documents'
            special = "documents"

            [[drives]]
            name = "C:"

            [[folders]]
            path = 'C:\Users\ada\Documents\Projects'

            [[folders]]
            path = 'C:\Users\ada\Documents\Archive'
            hidden = true

            [[folders]]
            path = 'D:\Locked'
            inaccessible = true

            [[files]]
            path = 'C:\Users\ada\Documents\notes.txt'

            [[files]]
            path = 'C:\Users\ada\Documents\Café.txt'

            [[files]]
            path = 'C:\Users\ada\Documents\.secret'
            hidden = true
            "#,
        )
        .unwrap()
    }

    fn name_of(p: &MemoryProvider, h: RawHandle) -> String {
        p.display_name(h, NameStyle::Normal).unwrap()
    }

    #[test]
    fn test_resolve_path_and_release() {
        let p = provider();
        let h = p.resolve_path(r"C:\Users\ada\Documents\notes.txt").unwrap();
        assert_eq!(name_of(&p, h), "notes.txt");
        assert_eq!(p.outstanding_handles(), 1);
        p.release(h);
        assert_eq!(p.outstanding_handles(), 0);
    }

    #[test]
    fn test_resolve_path_is_case_insensitive() {
        let p = provider();
        let h = p.resolve_path(r"c:\users\ADA\documents").unwrap();
        assert_eq!(name_of(&p, h), "Documents");
        assert_eq!(
            p.display_name(h, NameStyle::FileSystemPath).unwrap(),
            r"C:\Users\ada\Documents"
        );
        p.release(h);
    }

    #[test]
    fn test_child_lookup_folds_unicode() {
        let p = provider();
        let docs = p.resolve_path(r"C:\Users\ada\Documents").unwrap();
        // NFD spelling of "café.txt" finds the NFC-named child.
        let child = p.child_by_name(docs, "cafe\u{301}.txt").unwrap();
        assert_eq!(name_of(&p, child), "Café.txt");
        p.release(docs);
        p.release(child);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let p = provider();
        assert!(matches!(
            p.resolve_path(r"C:\Users\ada\Nope"),
            Err(ResolveError::NotFound(_))
        ));
        assert!(matches!(
            p.resolve_path("relative"),
            Err(ResolveError::InvalidLocator(_))
        ));
    }

    #[test]
    fn test_children_follow_display_order_and_flags() {
        let p = provider();
        let docs = p.resolve_path(r"C:\Users\ada\Documents").unwrap();

        let all = p.children(docs, crate::config::DEFAULT_ENUMERATE).unwrap();
        let names: Vec<String> = all.iter().map(|&h| name_of(&p, h)).collect();
        // Folders first, then files, each in name order.
        assert_eq!(
            names,
            vec!["Archive", "Projects", ".secret", "Café.txt", "notes.txt"]
        );
        for h in all {
            p.release(h);
        }

        let visible = p
            .children(docs, EnumerateFlags::FOLDERS | EnumerateFlags::NON_FOLDERS)
            .unwrap();
        let names: Vec<String> = visible.iter().map(|&h| name_of(&p, h)).collect();
        assert_eq!(names, vec!["Projects", "Café.txt", "notes.txt"]);
        for h in visible {
            p.release(h);
        }

        let folders = p
            .children(docs, EnumerateFlags::FOLDERS | EnumerateFlags::INCLUDE_HIDDEN)
            .unwrap();
        assert_eq!(folders.len(), 2);
        for h in folders {
            p.release(h);
        }
        p.release(docs);
    }

    #[test]
    fn test_attributes() {
        let p = provider();

        let desktop = p.desktop().unwrap();
        let attrs = p.attributes(desktop).unwrap();
        assert!(attrs.contains(ItemAttributes::FOLDER));
        assert!(attrs.contains(ItemAttributes::FILE_SYS_ANCESTOR));
        assert!(!attrs.contains(ItemAttributes::FILE_SYSTEM));
        p.release(desktop);

        let drive = p.resolve_path("C:").unwrap();
        let attrs = p.attributes(drive).unwrap();
        assert!(attrs.contains(ItemAttributes::FOLDER | ItemAttributes::FILE_SYSTEM));
        assert!(attrs.contains(ItemAttributes::HAS_SUBFOLDERS));
        p.release(drive);

        let file = p.resolve_path(r"C:\Users\ada\Documents\.secret").unwrap();
        let attrs = p.attributes(file).unwrap();
        assert!(!attrs.contains(ItemAttributes::FOLDER));
        assert!(attrs.contains(ItemAttributes::FILE_SYSTEM | ItemAttributes::HIDDEN));
        p.release(file);
    }

    #[test]
    fn test_inaccessible_folder_fails_enumeration() {
        let p = provider();
        let locked = p.resolve_path(r"D:\Locked").unwrap();
        let err = p
            .children(locked, crate::config::DEFAULT_ENUMERATE)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Native(_)));
        p.release(locked);
    }

    #[test]
    fn test_special_folder_lookup() {
        let p = provider();
        let docs = p.special_folder(SpecialFolder::Documents).unwrap();
        assert_eq!(name_of(&p, docs), "Documents");
        p.release(docs);

        let computer = p.special_folder(SpecialFolder::Computer).unwrap();
        assert_eq!(name_of(&p, computer), "Computer");
        p.release(computer);

        assert!(matches!(
            p.special_folder(SpecialFolder::Windows),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn test_compare_orders_structurally() {
        let p = provider();
        let projects = p.resolve_path(r"C:\Users\ada\Documents\Projects").unwrap();
        let notes = p.resolve_path(r"C:\Users\ada\Documents\notes.txt").unwrap();
        let docs = p.resolve_path(r"C:\Users\ada\Documents").unwrap();

        // Folders sort before files, ancestors before descendants.
        assert_eq!(p.compare(projects, notes).unwrap(), Ordering::Less);
        assert_eq!(p.compare(docs, notes).unwrap(), Ordering::Less);
        assert_eq!(p.compare(notes, docs).unwrap(), Ordering::Greater);

        for h in [projects, notes, docs] {
            p.release(h);
        }
    }

    #[test]
    fn test_misreport_quirk_breaks_handle_equality_only() {
        let p = provider();
        let a = p.resolve_path(r"C:\Users\ada\Documents").unwrap();
        let b = p.resolve_path(r"C:\Users\ada\Documents").unwrap();
        assert_eq!(p.compare(a, b).unwrap(), Ordering::Equal);

        p.set_misreport_display_order_equality(true);
        assert_ne!(p.compare(a, b).unwrap(), Ordering::Equal);
        // A handle still equals itself.
        assert_eq!(p.compare(a, a).unwrap(), Ordering::Equal);

        p.release(a);
        p.release(b);
    }

    #[test_log::test]
    fn test_mutations_queue_notifications() {
        let p = Rc::new(provider());

        p.create_file(r"C:\Users\ada\Documents\new.txt").unwrap();
        p.create_folder(r"C:\Users\ada\Documents\Drafts").unwrap();
        p.rename(r"C:\Users\ada\Documents\new.txt", "old.txt").unwrap();
        p.remove(r"C:\Users\ada\Documents\Drafts").unwrap();
        p.attach_drive("E:").unwrap();
        p.set_shared(r"C:\Users\ada\Documents", true).unwrap();

        let notifications = MemoryProvider::drain_notifications(&p);
        let codes_seen: Vec<u32> = notifications.iter().map(|n| n.code).collect();
        assert_eq!(
            codes_seen,
            vec![
                codes::CREATE,
                codes::MAKE_DIR,
                codes::RENAME_ITEM,
                codes::REMOVE_DIR,
                codes::DRIVE_ADDED,
                codes::NET_SHARE,
            ]
        );

        // The rename carries the old identity first and the new second.
        let rename = &notifications[2];
        assert_eq!(
            p.display_name(rename.item.raw(), NameStyle::Normal).unwrap(),
            "new.txt"
        );
        let other = rename.other.as_ref().unwrap();
        assert_eq!(
            p.display_name(other.raw(), NameStyle::Normal).unwrap(),
            "old.txt"
        );

        drop(notifications);
        assert_eq!(p.outstanding_handles(), 0);
    }

    #[test]
    fn test_rename_rewrites_subtree_paths() {
        let p = provider();
        p.rename(r"C:\Users\ada\Documents\Projects", "Work").unwrap();
        assert!(p.resolve_path(r"C:\Users\ada\Documents\Projects").is_err());
        let h = p.resolve_path(r"C:\Users\ada\Documents\Work").unwrap();
        assert_eq!(name_of(&p, h), "Work");
        p.release(h);
    }

    #[test]
    fn test_removed_items_stop_resolving_but_handles_survive() {
        let p = provider();
        let h = p.resolve_path(r"C:\Users\ada\Documents\notes.txt").unwrap();
        p.remove(r"C:\Users\ada\Documents\notes.txt").unwrap();

        assert!(matches!(
            p.resolve_path(r"C:\Users\ada\Documents\notes.txt"),
            Err(ResolveError::NotFound(_))
        ));
        // The captured handle still answers metadata queries.
        assert_eq!(name_of(&p, h), "notes.txt");
        p.release(h);
    }

    #[test]
    fn test_detach_drive_removes_subtree() {
        let p = provider();
        p.detach_drive("D:").unwrap();
        assert!(p.resolve_path(r"D:\Locked").is_err());
        assert!(matches!(
            p.detach_drive("D:"),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn test_manifest_conflict_is_rejected() {
        let err = MemoryProvider::from_toml_str(
            r#"
            [[files]]
            path = 'C:\data'

            [[folders]]
            path = 'C:\data\sub'
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Conflict(_)));
    }

    #[test]
    fn test_bad_drive_name_is_rejected() {
        let err = MemoryProvider::from_toml_str("[[drives]]\nname = \"CC\"").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidDrive(_)));
    }
}
