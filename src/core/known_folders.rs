//! Known-folder registry.
//!
//! A [`KnownFolderIndex`] maps stable registry names (`Personal`,
//! `MyComputerFolder`, ...) to namespace locations. URIs use these names as
//! their first path segment, so the index is what makes `shell:///` URIs
//! resolvable and renderable.
//!
//! Two backends fill the index: [`KnownFolderIndex::enumerated`] asks the
//! provider for its registrations, and [`KnownFolderIndex::builtin`] falls
//! back to the classic fixed table for providers that publish nothing.
//! Queries behave identically on both. Entries hold designators, not items;
//! each query resolves the backing identity fresh, so a folder that appears
//! or disappears at runtime is picked up without rebuilding the index.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::config;
use crate::core::error::{ResolveError, ResolveResult};
use crate::core::item::ShellItem;
use crate::models::SpecialFolder;
use crate::provider::{NamespaceProvider, fold_name};
use crate::utils::paths;

/// Where an index got its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownFolderBackend {
    /// The fixed classic table.
    Builtin,
    /// The provider's own registrations.
    Enumerated,
}

/// One registered known folder.
#[derive(Debug, Clone)]
pub struct KnownFolderEntry {
    name: String,
    special: Option<SpecialFolder>,
    path: Option<String>,
}

impl KnownFolderEntry {
    /// The registry name, as it appears in `shell:///` URIs.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn special(&self) -> Option<SpecialFolder> {
        self.special
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Resolve the entry's current backing identity. The special-folder
    /// designator wins; a registered path is the fallback for entries the
    /// provider cannot answer by designator.
    fn resolve(&self, provider: &Rc<dyn NamespaceProvider>) -> ResolveResult<ShellItem> {
        if let Some(special) = self.special
            && let Ok(item) = ShellItem::special(Rc::clone(provider), special)
        {
            return Ok(item);
        }
        if let Some(path) = &self.path {
            return ShellItem::from_path(Rc::clone(provider), path);
        }
        Err(ResolveError::NotFound(format!(
            "known folder `{}` has no backing location",
            self.name
        )))
    }
}

/// A successful nearest-ancestor query.
pub struct KnownFolderMatch {
    /// Registry name of the matched folder.
    pub name: String,
    /// The folder's resolved identity.
    pub item: ShellItem,
}

/// The name-to-location registry for one provider.
pub struct KnownFolderIndex {
    provider: Rc<dyn NamespaceProvider>,
    entries: Vec<KnownFolderEntry>,
    backend: KnownFolderBackend,
}

impl KnownFolderIndex {
    /// The classic fixed table. Entries the provider cannot resolve stay
    /// listed and fail individually at query time.
    pub fn builtin(provider: Rc<dyn NamespaceProvider>) -> Self {
        let entries = config::BUILTIN_KNOWN_FOLDERS
            .iter()
            .map(|&(name, special)| KnownFolderEntry {
                name: name.to_string(),
                special: Some(special),
                path: None,
            })
            .collect();
        Self {
            provider,
            entries,
            backend: KnownFolderBackend::Builtin,
        }
    }

    /// The provider's own registrations.
    pub fn enumerated(provider: Rc<dyn NamespaceProvider>) -> Self {
        let decls = provider.known_folders();
        Self::from_decls(provider, decls)
    }

    /// Provider registrations when it has any, the builtin table otherwise.
    pub fn for_provider(provider: Rc<dyn NamespaceProvider>) -> Self {
        let decls = provider.known_folders();
        if decls.is_empty() {
            debug!("provider publishes no known folders, using builtin table");
            Self::builtin(provider)
        } else {
            Self::from_decls(provider, decls)
        }
    }

    fn from_decls(
        provider: Rc<dyn NamespaceProvider>,
        decls: Vec<crate::provider::KnownFolderDecl>,
    ) -> Self {
        let entries: Vec<KnownFolderEntry> = decls
            .into_iter()
            .map(|decl| KnownFolderEntry {
                name: decl.name,
                special: decl.special,
                path: decl.path,
            })
            .collect();
        debug!(count = entries.len(), "known folders enumerated");
        Self {
            provider,
            entries,
            backend: KnownFolderBackend::Enumerated,
        }
    }

    pub fn backend(&self) -> KnownFolderBackend {
        self.backend
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnownFolderEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Resolve a known folder by registry name, case-insensitively.
    pub fn by_name(&self, name: &str) -> ResolveResult<ShellItem> {
        let wanted = fold_name(name);
        let entry = self
            .entries
            .iter()
            .find(|entry| fold_name(&entry.name) == wanted)
            .ok_or_else(|| ResolveError::UnknownFolder(name.to_string()))?;
        trace!(name = %entry.name, "known folder lookup");
        entry.resolve(&self.provider)
    }

    /// The most specific known folder containing `item`, if any.
    ///
    /// Filesystem items match on component-boundary path prefixes, longest
    /// prefix first; an exact path match counts, making a known folder its
    /// own nearest ancestor. Virtual items match known folders that equal
    /// them or sit in their parent chain, deepest folder first. Entries
    /// that fail to resolve are skipped.
    pub fn nearest_ancestor(&self, item: &ShellItem) -> ResolveResult<Option<KnownFolderMatch>> {
        let mut best: Option<(usize, KnownFolderMatch)> = None;

        if let Some(item_path) = item.file_system_path()? {
            for entry in &self.entries {
                let Ok(folder) = entry.resolve(&self.provider) else {
                    continue;
                };
                let Ok(Some(folder_path)) = folder.file_system_path() else {
                    continue;
                };
                if !paths::contains(&folder_path, &item_path) {
                    continue;
                }
                let depth = paths::depth(&folder_path);
                if best.as_ref().is_none_or(|(deepest, _)| depth > *deepest) {
                    best = Some((
                        depth,
                        KnownFolderMatch {
                            name: entry.name.clone(),
                            item: folder,
                        },
                    ));
                }
            }
            return Ok(best.map(|(_, hit)| hit));
        }

        for entry in &self.entries {
            let Ok(folder) = entry.resolve(&self.provider) else {
                continue;
            };
            let related =
                folder == *item || matches!(folder.is_parent_of(item), Ok(true));
            if !related {
                continue;
            }
            let Ok(depth) = folder.ancestry_depth() else {
                continue;
            };
            if best.as_ref().is_none_or(|(deepest, _)| depth > *deepest) {
                best = Some((
                    depth,
                    KnownFolderMatch {
                        name: entry.name.clone(),
                        item: folder,
                    },
                ));
            }
        }
        Ok(best.map(|(_, hit)| hit))
    }
}
