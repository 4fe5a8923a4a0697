//! File type filters.
//!
//! A filter string pairs captions with wildcard patterns, pipe-separated:
//!
//! ```text
//! Text files|*.txt|All files|*.*
//! ```
//!
//! [`FilterSpec::parse`] splits the string into [`FilterItem`]s and selects
//! the first item whose pattern list contains the caller's current pattern.
//! A [`FilterMatcher`] compiles one item's comma-separated wildcards into a
//! single case-insensitive regex that must cover the whole file name, so
//! `?` stands for exactly one character and `*.txt` does not admit
//! `notes.txt.bak`.

use regex::{Regex, RegexBuilder};
use tracing::trace;

use crate::core::error::{FilterError, FilterResult};

/// A parsed filter string.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    items: Vec<FilterItem>,
    selected: Option<usize>,
}

impl FilterSpec {
    /// Parse a pipe-separated filter string. `current` is the pattern in
    /// effect; the first item listing it becomes the selection.
    pub fn parse(filter_string: &str, current: &str) -> FilterResult<Self> {
        let tokens: Vec<&str> = filter_string.split('|').collect();
        if tokens.len() % 2 != 0 {
            return Err(FilterError::MalformedFilter {
                input: filter_string.to_string(),
                tokens: tokens.len(),
            });
        }

        let items: Vec<FilterItem> = tokens
            .chunks_exact(2)
            .map(|pair| FilterItem::new(pair[0], pair[1]))
            .collect();
        let selected = items.iter().position(|item| item.contains(current));
        trace!(items = items.len(), ?selected, "filter string parsed");
        Ok(Self { items, selected })
    }

    pub fn items(&self) -> &[FilterItem] {
        &self.items
    }

    /// Index of the item matching the current pattern, if any.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&FilterItem> {
        self.selected.and_then(|index| self.items.get(index))
    }
}

/// One caption/pattern pair from a filter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterItem {
    caption: String,
    patterns: String,
}

impl FilterItem {
    pub fn new(caption: impl Into<String>, patterns: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            patterns: patterns.into(),
        }
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// The raw comma-separated pattern list, e.g. `*.htm,*.html`.
    pub fn patterns(&self) -> &str {
        &self.patterns
    }

    /// True when `pattern` appears verbatim in the pattern list. Members
    /// are compared after trimming, case-sensitively.
    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns
            .split(',')
            .any(|member| member.trim() == pattern)
    }

    /// The caption with the pattern list appended, unless the caption
    /// already carries it: `Text files (*.txt)`.
    pub fn display_caption(&self) -> String {
        let suffix = format!(" ({})", self.patterns);
        if self.caption.ends_with(&suffix) {
            self.caption.clone()
        } else {
            format!("{}{}", self.caption, suffix)
        }
    }

    /// Compile the pattern list into a name matcher.
    pub fn matcher(&self) -> FilterResult<FilterMatcher> {
        FilterMatcher::new(&self.patterns)
    }
}

/// A compiled wildcard matcher covering whole file names.
#[derive(Debug, Clone)]
pub struct FilterMatcher {
    regex: Regex,
}

impl FilterMatcher {
    /// Compile a comma-separated wildcard list. `*` matches any run of
    /// characters, `?` exactly one; everything else is literal.
    pub fn new(patterns: &str) -> FilterResult<Self> {
        let alternation = patterns
            .split(',')
            .map(|member| {
                regex::escape(member.trim())
                    .replace(r"\*", ".*")
                    .replace(r"\?", ".")
            })
            .collect::<Vec<String>>()
            .join("|");

        let regex = RegexBuilder::new(&format!("^(?:{alternation})$"))
            .case_insensitive(true)
            .build()
            .map_err(|source| FilterError::InvalidPattern {
                pattern: patterns.to_string(),
                source,
            })?;
        Ok(Self { regex })
    }

    /// Test a file name against the compiled wildcards.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs_captions_with_patterns() {
        let spec = FilterSpec::parse("Text files|*.txt|All files|*.*", "*.*").unwrap();
        assert_eq!(spec.items().len(), 2);
        assert_eq!(spec.items()[0].caption(), "Text files");
        assert_eq!(spec.items()[0].patterns(), "*.txt");
        assert_eq!(spec.selected_index(), Some(1));
        assert_eq!(spec.selected().unwrap().caption(), "All files");
    }

    #[test]
    fn test_parse_selects_the_first_match() {
        let spec =
            FilterSpec::parse("Web|*.htm,*.html|Pages|*.html|All|*.*", "*.html").unwrap();
        assert_eq!(spec.selected_index(), Some(0));
    }

    #[test]
    fn test_parse_without_a_match_selects_nothing() {
        let spec = FilterSpec::parse("Text files|*.txt", "*.doc").unwrap();
        assert_eq!(spec.selected_index(), None);
        assert!(spec.selected().is_none());
    }

    #[test]
    fn test_odd_token_count_is_malformed() {
        let error = FilterSpec::parse("Text files|*.txt|Dangling", "*.txt").unwrap_err();
        assert!(matches!(
            error,
            FilterError::MalformedFilter { tokens: 3, .. }
        ));

        // A bare string is one token.
        assert!(FilterSpec::parse("no pipes here", "*.*").is_err());
    }

    #[test]
    fn test_contains_trims_but_keeps_case() {
        let item = FilterItem::new("Docs", " *.txt , *.doc ");
        assert!(item.contains("*.txt"));
        assert!(item.contains("*.doc"));
        assert!(!item.contains("*.TXT"));
        assert!(!item.contains("*.t"));
    }

    #[test]
    fn test_display_caption_appends_once() {
        let item = FilterItem::new("Text files", "*.txt");
        assert_eq!(item.display_caption(), "Text files (*.txt)");

        let suffixed = FilterItem::new("Text files (*.txt)", "*.txt");
        assert_eq!(suffixed.display_caption(), "Text files (*.txt)");
    }

    #[test]
    fn test_matcher_covers_the_whole_name() {
        let matcher = FilterItem::new("Text", "*.txt").matcher().unwrap();
        assert!(matcher.is_match("notes.txt"));
        assert!(matcher.is_match("NOTES.TXT"));
        assert!(!matcher.is_match("notes.txt.bak"));
        assert!(!matcher.is_match("txt"));
    }

    #[test]
    fn test_question_mark_is_exactly_one_character() {
        let matcher = FilterMatcher::new("file?.txt").unwrap();
        assert!(matcher.is_match("file1.txt"));
        assert!(!matcher.is_match("file.txt"));
        assert!(!matcher.is_match("file12.txt"));
    }

    #[test]
    fn test_matcher_alternates_over_members() {
        let matcher = FilterMatcher::new("*.jpg, *.png").unwrap();
        assert!(matcher.is_match("photo.jpg"));
        assert!(matcher.is_match("icon.PNG"));
        assert!(!matcher.is_match("movie.gif"));
    }

    #[test]
    fn test_star_dot_star_wants_a_dot() {
        let matcher = FilterMatcher::new("*.*").unwrap();
        assert!(matcher.is_match("a.b"));
        assert!(matcher.is_match("archive.tar.gz"));
        assert!(!matcher.is_match("README"));
    }
}
