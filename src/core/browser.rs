//! Headless browsing session.
//!
//! A [`Browser`] ties the pieces together the way a folder view does: one
//! current folder, a [`NavigationHistory`] behind it, enumeration flags and
//! an optional name filter. It never draws anything; it only answers what a
//! view would show and where navigation lands.
//!
//! Navigation is validated before it is recorded. A target that is not a
//! folder, or whose children cannot be enumerated, fails the move and
//! leaves the session exactly where it was.

use std::rc::Rc;

use tracing::debug;

use crate::config;
use crate::core::error::{ResolveError, ShellResult};
use crate::core::filter::{FilterMatcher, FilterSpec};
use crate::core::history::NavigationHistory;
use crate::core::item::ShellItem;
use crate::models::{EnumerateFlags, ItemAttributes};
use crate::provider::{NamespaceProvider, fold_name};

struct ActiveFilter {
    spec: FilterSpec,
    pattern: String,
    matcher: FilterMatcher,
}

/// A browsing session over one namespace.
pub struct Browser {
    provider: Rc<dyn NamespaceProvider>,
    history: NavigationHistory,
    current_folder: ShellItem,
    flags: EnumerateFlags,
    filter: Option<ActiveFilter>,
}

impl Browser {
    /// Open a session at `start`. The start folder is validated and seeds
    /// the history.
    pub fn open(provider: Rc<dyn NamespaceProvider>, start: ShellItem) -> ShellResult<Self> {
        let mut browser = Self {
            provider,
            history: NavigationHistory::new(),
            current_folder: start.clone(),
            flags: config::DEFAULT_ENUMERATE,
            filter: None,
        };
        browser.navigate(start)?;
        Ok(browser)
    }

    /// Open a session at the namespace root.
    pub fn open_desktop(provider: Rc<dyn NamespaceProvider>) -> ShellResult<Self> {
        let desktop = ShellItem::desktop(Rc::clone(&provider))?;
        Self::open(provider, desktop)
    }

    pub fn provider(&self) -> &Rc<dyn NamespaceProvider> {
        &self.provider
    }

    /// The folder the session is looking at.
    pub fn current(&self) -> &ShellItem {
        &self.current_folder
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn flags(&self) -> EnumerateFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: EnumerateFlags) {
        self.flags = flags;
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Move to a folder. The target must be a folder and must enumerate;
    /// only then does the history record it.
    pub fn navigate(&mut self, item: ShellItem) -> ShellResult<&ShellItem> {
        self.validate_navigable(&item)?;
        self.history.navigate(item.clone());
        self.current_folder = item;
        debug!(folder = %self.current_folder, "navigated");
        Ok(&self.current_folder)
    }

    /// Resolve a locator (URI or absolute path) and move there.
    pub fn navigate_to(&mut self, locator: &str) -> ShellResult<&ShellItem> {
        let item = ShellItem::resolve(Rc::clone(&self.provider), locator)?;
        self.navigate(item)
    }

    /// Move to the current folder's parent.
    pub fn up(&mut self) -> ShellResult<&ShellItem> {
        let parent = self.current_folder.parent()?.ok_or_else(|| {
            ResolveError::NotFound("the namespace root has no parent".to_string())
        })?;
        self.navigate(parent)
    }

    pub fn back(&mut self) -> ShellResult<&ShellItem> {
        let item = self.history.back()?.clone();
        self.current_folder = item;
        Ok(&self.current_folder)
    }

    pub fn forward(&mut self) -> ShellResult<&ShellItem> {
        let item = self.history.forward()?.clone();
        self.current_folder = item;
        Ok(&self.current_folder)
    }

    /// Jump back to the nearest earlier visit of `item`.
    pub fn back_to(&mut self, item: &ShellItem) -> ShellResult<&ShellItem> {
        let found = self.history.back_to(item)?.clone();
        self.current_folder = found;
        Ok(&self.current_folder)
    }

    /// Jump forward to the nearest later visit of `item`.
    pub fn forward_to(&mut self, item: &ShellItem) -> ShellResult<&ShellItem> {
        let found = self.history.forward_to(item)?.clone();
        self.current_folder = found;
        Ok(&self.current_folder)
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    fn validate_navigable(&self, item: &ShellItem) -> ShellResult<()> {
        if !item.is_folder()? {
            return Err(ResolveError::InvalidLocator(format!(
                "`{item}` is not a folder"
            ))
            .into());
        }
        item.children(self.flags)?;
        Ok(())
    }

    // =========================================================================
    // View contents
    // =========================================================================

    /// The current folder's children as the view would show them.
    ///
    /// With a filter active, an item stays visible when it is file-system
    /// backed or a file-system ancestor, and is either a folder or has a
    /// display name the filter matches. Without a filter the enumeration
    /// flags alone decide.
    pub fn entries(&self) -> ShellResult<Vec<ShellItem>> {
        let children = self.current_folder.children(self.flags)?;
        let Some(active) = &self.filter else {
            return Ok(children);
        };

        let mut kept = Vec::new();
        for child in children {
            let attrs = child.attributes()?;
            if !attrs.intersects(ItemAttributes::FILE_SYSTEM | ItemAttributes::FILE_SYS_ANCESTOR)
            {
                continue;
            }
            if attrs.contains(ItemAttributes::FOLDER) {
                kept.push(child);
            } else if active.matcher.is_match(&child.display_name()?) {
                kept.push(child);
            }
        }
        Ok(kept)
    }

    /// Case-insensitive completion of a name prefix among the current
    /// folder's children.
    pub fn complete(&self, prefix: &str) -> ShellResult<Vec<String>> {
        let wanted = fold_name(prefix);
        let mut names = Vec::new();
        for child in self.current_folder.children(self.flags)? {
            let name = child.display_name()?;
            if fold_name(&name).starts_with(&wanted) {
                names.push(name);
            }
        }
        names.sort_by_key(|name| fold_name(name));
        Ok(names)
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Install a filter from a pipe-separated filter string and the pattern
    /// to apply. On a parse or compile error the previous filter stays in
    /// effect.
    pub fn set_filter(&mut self, filter_string: &str, pattern: &str) -> ShellResult<()> {
        let spec = FilterSpec::parse(filter_string, pattern)?;
        let matcher = FilterMatcher::new(pattern)?;
        debug!(pattern, items = spec.items().len(), "filter installed");
        self.filter = Some(ActiveFilter {
            spec,
            pattern: pattern.to_string(),
            matcher,
        });
        Ok(())
    }

    /// Switch the applied pattern. Works with or without an installed
    /// filter string; without one, the pattern becomes its own caption.
    pub fn select_pattern(&mut self, pattern: &str) -> ShellResult<()> {
        let matcher = FilterMatcher::new(pattern)?;
        match &mut self.filter {
            Some(active) => {
                active.pattern = pattern.to_string();
                active.matcher = matcher;
            }
            None => {
                let spec = FilterSpec::parse(&format!("{pattern}|{pattern}"), pattern)?;
                self.filter = Some(ActiveFilter {
                    spec,
                    pattern: pattern.to_string(),
                    matcher,
                });
            }
        }
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn filter_spec(&self) -> Option<&FilterSpec> {
        self.filter.as_ref().map(|active| &active.spec)
    }

    pub fn active_pattern(&self) -> Option<&str> {
        self.filter.as_ref().map(|active| active.pattern.as_str())
    }

    /// Index of the filter item listing the applied pattern, if any.
    pub fn selected_filter_index(&self) -> Option<usize> {
        self.filter.as_ref().and_then(|active| {
            active
                .spec
                .items()
                .iter()
                .position(|item| item.contains(&active.pattern))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{FilterError, HistoryError, ShellError};
    use crate::provider::MemoryProvider;

    fn memory() -> Rc<MemoryProvider> {
        Rc::new(
            MemoryProvider::from_toml_str(
                r#"
                [[known_folders]]
                name = "Personal"
                display = "Documents"
                path = 'C:\Users\ada\Documents'
                special = "documents"

                [[known_folders]]
                name = "Gadgets"

                [[folders]]
                path = 'C:\Users\ada\Documents\Projects'

                [[folders]]
                path = 'C:\Users\ada\Documents\Locked'
                inaccessible = true

                [[files]]
                path = 'C:\Users\ada\Documents\notes.txt'

                [[files]]
                path = 'C:\Users\ada\Documents\report.doc'
                "#,
            )
            .unwrap(),
        )
    }

    fn shared(p: &Rc<MemoryProvider>) -> Rc<dyn NamespaceProvider> {
        p.clone()
    }

    fn names(items: &[ShellItem]) -> Vec<String> {
        items
            .iter()
            .map(|item| item.display_name().unwrap())
            .collect()
    }

    #[test]
    fn test_open_seeds_the_history() {
        let mem = memory();
        let browser = Browser::open_desktop(shared(&mem)).unwrap();
        assert_eq!(browser.current().display_name().unwrap(), "Desktop");
        assert_eq!(browser.history().len(), 1);
        assert!(!browser.can_go_back());
    }

    #[test]
    fn test_navigate_rejects_non_folders_without_recording() {
        let mem = memory();
        let mut browser = Browser::open_desktop(shared(&mem)).unwrap();
        let notes =
            ShellItem::from_path(shared(&mem), r"C:\Users\ada\Documents\notes.txt").unwrap();

        let error = browser.navigate(notes).unwrap_err();
        assert!(matches!(
            error,
            ShellError::Resolve(ResolveError::InvalidLocator(_))
        ));
        assert_eq!(browser.history().len(), 1);
        assert_eq!(browser.current().display_name().unwrap(), "Desktop");
    }

    #[test]
    fn test_failed_enumeration_leaves_the_session_in_place() {
        let mem = memory();
        let mut browser = Browser::open_desktop(shared(&mem)).unwrap();
        browser.navigate_to("shell:///Personal").unwrap();

        let locked =
            ShellItem::from_path(shared(&mem), r"C:\Users\ada\Documents\Locked").unwrap();
        let error = browser.navigate(locked).unwrap_err();
        assert!(matches!(
            error,
            ShellError::Resolve(ResolveError::Native(_))
        ));

        assert_eq!(browser.current().display_name().unwrap(), "Documents");
        assert_eq!(browser.history().len(), 2);
        assert!(!browser.can_go_forward());
    }

    #[test]
    fn test_back_forward_and_up() {
        let mem = memory();
        let mut browser = Browser::open_desktop(shared(&mem)).unwrap();
        browser.navigate_to("shell:///Personal").unwrap();
        browser.navigate_to("shell:///Personal/Projects").unwrap();

        assert_eq!(browser.back().unwrap().display_name().unwrap(), "Documents");
        assert_eq!(
            browser.forward().unwrap().display_name().unwrap(),
            "Projects"
        );
        assert_eq!(browser.up().unwrap().display_name().unwrap(), "Documents");

        // `up` was a real navigation, so the forward branch is gone.
        assert!(matches!(
            browser.forward(),
            Err(ShellError::History(HistoryError::CannotNavigateForward))
        ));

        let desktop = ShellItem::desktop(shared(&mem)).unwrap();
        browser.back_to(&desktop).unwrap();
        assert_eq!(browser.current(), &desktop);
        assert!(matches!(
            browser.up(),
            Err(ShellError::Resolve(ResolveError::NotFound(_)))
        ));
    }

    #[test]
    fn test_entries_without_a_filter_follow_the_flags() {
        let mem = memory();
        let mut browser = Browser::open_desktop(shared(&mem)).unwrap();
        browser.navigate_to("shell:///Personal").unwrap();

        let all = browser.entries().unwrap();
        assert_eq!(
            names(&all),
            vec!["Locked", "Projects", "notes.txt", "report.doc"]
        );

        browser.set_flags(EnumerateFlags::NON_FOLDERS | EnumerateFlags::INCLUDE_HIDDEN);
        assert_eq!(names(&browser.entries().unwrap()), vec!["notes.txt", "report.doc"]);
    }

    #[test]
    fn test_filter_keeps_folders_and_matching_names() {
        let mem = memory();
        let mut browser = Browser::open_desktop(shared(&mem)).unwrap();
        browser.navigate_to("shell:///Personal").unwrap();
        browser
            .set_filter("Text files|*.txt|All files|*.*", "*.txt")
            .unwrap();

        assert_eq!(
            names(&browser.entries().unwrap()),
            vec!["Locked", "Projects", "notes.txt"]
        );
        assert_eq!(browser.selected_filter_index(), Some(0));

        browser.select_pattern("*.doc").unwrap();
        assert_eq!(
            names(&browser.entries().unwrap()),
            vec!["Locked", "Projects", "report.doc"]
        );
        assert_eq!(browser.selected_filter_index(), None);

        browser.clear_filter();
        assert_eq!(browser.entries().unwrap().len(), 4);
    }

    #[test]
    fn test_filter_drops_bare_virtual_items() {
        let mem = memory();
        let mut browser = Browser::open_desktop(shared(&mem)).unwrap();

        // The desktop holds the computer (a filesystem ancestor) and the
        // Gadgets folder (purely virtual).
        assert_eq!(names(&browser.entries().unwrap()), vec!["Computer", "Gadgets"]);

        browser.select_pattern("*.*").unwrap();
        assert_eq!(names(&browser.entries().unwrap()), vec!["Computer"]);
    }

    #[test]
    fn test_bad_filter_strings_leave_the_previous_filter() {
        let mem = memory();
        let mut browser = Browser::open_desktop(shared(&mem)).unwrap();
        browser.navigate_to("shell:///Personal").unwrap();
        browser.set_filter("Text files|*.txt", "*.txt").unwrap();

        let error = browser.set_filter("Odd|tokens|here", "*.*").unwrap_err();
        assert!(matches!(
            error,
            ShellError::Filter(FilterError::MalformedFilter { tokens: 3, .. })
        ));

        assert_eq!(browser.active_pattern(), Some("*.txt"));
        assert_eq!(
            names(&browser.entries().unwrap()),
            vec!["Locked", "Projects", "notes.txt"]
        );
    }

    #[test]
    fn test_complete_matches_prefixes_case_insensitively() {
        let mem = memory();
        let mut browser = Browser::open_desktop(shared(&mem)).unwrap();
        browser.navigate_to("shell:///Personal").unwrap();

        assert_eq!(browser.complete("pro").unwrap(), vec!["Projects".to_string()]);
        assert_eq!(
            browser.complete("").unwrap(),
            vec![
                "Locked".to_string(),
                "notes.txt".to_string(),
                "Projects".to_string(),
                "report.doc".to_string(),
            ]
        );
        assert!(browser.complete("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_session_releases_handles_on_drop() {
        let mem = memory();
        {
            let mut browser = Browser::open_desktop(shared(&mem)).unwrap();
            browser.navigate_to("shell:///Personal").unwrap();
            browser.navigate_to("shell:///Personal/Projects").unwrap();
            browser.back().unwrap();
            let _entries = browser.entries().unwrap();
        }
        assert_eq!(mem.outstanding_handles(), 0);
    }
}
