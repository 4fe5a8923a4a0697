//! Back/forward navigation history.
//!
//! [`NavigationHistory`] keeps an ordered list of visited locations and a
//! cursor. Navigating somewhere new truncates everything after the cursor
//! before appending, the same branch-discarding model browsers use, so the
//! forward list is only ever reachable through `back`.

use crate::core::error::{HistoryError, HistoryResult};
use crate::core::item::ShellItem;

/// Visited locations with a movable cursor.
#[derive(Debug, Default)]
pub struct NavigationHistory {
    entries: Vec<ShellItem>,
    position: usize,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new location. Entries after the cursor are discarded.
    pub fn navigate(&mut self, item: ShellItem) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.position + 1);
        }
        self.entries.push(item);
        self.position = self.entries.len() - 1;
    }

    /// The location under the cursor, if anything was visited yet.
    pub fn current(&self) -> Option<&ShellItem> {
        self.entries.get(self.position)
    }

    /// Locations before the cursor, oldest first.
    pub fn history_back(&self) -> &[ShellItem] {
        &self.entries[..self.position]
    }

    /// Locations after the cursor, nearest first in visit order.
    pub fn history_forward(&self) -> &[ShellItem] {
        self.entries.get(self.position + 1..).unwrap_or(&[])
    }

    pub fn can_go_back(&self) -> bool {
        self.position > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.position + 1 < self.entries.len()
    }

    /// Move the cursor one step back.
    pub fn back(&mut self) -> HistoryResult<&ShellItem> {
        if !self.can_go_back() {
            return Err(HistoryError::CannotNavigateBack);
        }
        self.position -= 1;
        Ok(&self.entries[self.position])
    }

    /// Move the cursor one step forward.
    pub fn forward(&mut self) -> HistoryResult<&ShellItem> {
        if !self.can_go_forward() {
            return Err(HistoryError::CannotNavigateForward);
        }
        self.position += 1;
        Ok(&self.entries[self.position])
    }

    /// Move the cursor back to the nearest earlier occurrence of `item`.
    pub fn back_to(&mut self, item: &ShellItem) -> HistoryResult<&ShellItem> {
        let found = self.entries[..self.position]
            .iter()
            .rposition(|entry| entry == item)
            .ok_or(HistoryError::NotInBackHistory)?;
        self.position = found;
        Ok(&self.entries[self.position])
    }

    /// Move the cursor forward to the nearest later occurrence of `item`.
    pub fn forward_to(&mut self, item: &ShellItem) -> HistoryResult<&ShellItem> {
        let found = self
            .history_forward()
            .iter()
            .position(|entry| entry == item)
            .ok_or(HistoryError::NotInForwardHistory)?;
        self.position += 1 + found;
        Ok(&self.entries[self.position])
    }

    /// Forget everything except the current location.
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let current = self.entries.swap_remove(self.position);
        self.entries.clear();
        self.entries.push(current);
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
