//! Lexical path helpers.
//!
//! Namespace paths are plain strings in either `/` or `C:\` style. Nothing
//! in this module touches a real filesystem; the functions only split, join
//! and compare path text.

/// Detect the separator style of a path.
///
/// Returns the first separator character found. Paths without a separator
/// default to `\` when they begin with a drive designator and `/` otherwise.
pub fn separator_of(path: &str) -> char {
    for c in path.chars() {
        if c == '/' || c == '\\' {
            return c;
        }
    }
    if is_drive(path) { '\\' } else { '/' }
}

/// True for a drive designator component such as `C:`.
pub fn is_drive(component: &str) -> bool {
    let mut chars = component.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some(':'), None) if letter.is_ascii_alphabetic()
    )
}

/// Split a path into its non-empty components. Both separator styles split.
pub fn components(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).collect()
}

/// True for rooted paths: `/...`, `C:\...` or `C:/...`.
pub fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let head = path.split(['/', '\\']).next().unwrap_or(path);
    is_drive(head) && !head.is_empty()
}

/// Number of components in a path, used for most-specific-match ranking.
pub fn depth(path: &str) -> usize {
    components(path).len()
}

/// Normalize a path by resolving `.` and `..` components and collapsing
/// duplicate separators. The input's separator style is preserved.
///
/// `..` never pops past a root: `C:\Users\..\..` normalizes to `C:\` and
/// `/home/..` to `/`.
pub fn normalize(path: &str) -> String {
    let sep = separator_of(path);
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split(['/', '\\']).filter(|s| !s.is_empty()) {
        match part {
            "." => {}
            ".." => {
                let at_drive_root = parts.len() == 1 && is_drive(parts[0]);
                if !parts.is_empty() && !at_drive_root {
                    parts.pop();
                }
            }
            _ => parts.push(part),
        }
    }

    render(&parts, sep, rooted)
}

/// Leaf (final) component of a path, if any.
pub fn leaf(path: &str) -> Option<&str> {
    components(path).last().copied()
}

/// Parent of a path, or `None` at a root (`/`, `C:\`) or for a single
/// relative component.
pub fn parent(path: &str) -> Option<String> {
    let sep = separator_of(path);
    let rooted = path.starts_with('/');
    let comps = components(path);

    match comps.len() {
        0 => None,
        1 => {
            if rooted {
                Some("/".to_string())
            } else {
                None
            }
        }
        n => Some(render(&comps[..n - 1], sep, rooted)),
    }
}

/// Join a child name onto a base path using the base's separator style.
pub fn join(base: &str, name: &str) -> String {
    let sep = separator_of(base);
    if base.is_empty() {
        return name.to_string();
    }
    if base.ends_with(['/', '\\']) {
        format!("{base}{name}")
    } else {
        format!("{base}{sep}{name}")
    }
}

/// Component-boundary containment test.
///
/// True when `ancestor` is a prefix of `path` on whole components, so
/// `C:\Users\X` contains `C:\Users\X\Docs` but not `C:\Users\XY`. A path
/// contains itself. Comparison is case-preserving (exact), and separator
/// style does not matter. An empty ancestor contains nothing.
pub fn contains(ancestor: &str, path: &str) -> bool {
    let anc = components(ancestor);
    if anc.is_empty() {
        return false;
    }
    let rooted_anc = ancestor.starts_with('/');
    let rooted_path = path.starts_with('/');
    if rooted_anc != rooted_path {
        return false;
    }
    let full = components(path);
    full.len() >= anc.len() && full[..anc.len()] == anc[..]
}

fn render(parts: &[&str], sep: char, rooted: bool) -> String {
    if rooted {
        let mut out = String::from("/");
        out.push_str(&parts.join("/"));
        return out;
    }
    if parts.is_empty() {
        return String::new();
    }
    if parts.len() == 1 && is_drive(parts[0]) {
        return format!("{}{sep}", parts[0]);
    }
    let sep_str = sep.to_string();
    parts.join(&sep_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_windows() {
        assert_eq!(normalize(r"C:\Users\\ada\.\Documents"), r"C:\Users\ada\Documents");
        assert_eq!(normalize(r"C:\Users\ada\.."), r"C:\Users");
        assert_eq!(normalize(r"C:\Users\..\.."), r"C:\");
        assert_eq!(normalize(r"C:\"), r"C:\");
        assert_eq!(normalize("C:"), r"C:\");
    }

    #[test]
    fn test_normalize_unix() {
        assert_eq!(normalize("/home//ada/./docs"), "/home/ada/docs");
        assert_eq!(normalize("/home/.."), "/");
        assert_eq!(normalize("/../.."), "/");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute(r"C:\Users"));
        assert!(is_absolute("C:/Users"));
        assert!(is_absolute("/home/ada"));
        assert!(!is_absolute("Documents"));
        assert!(!is_absolute(r"Users\ada"));
    }

    #[test]
    fn test_parent_and_leaf() {
        assert_eq!(parent(r"C:\Users\ada"), Some(r"C:\Users".to_string()));
        assert_eq!(parent(r"C:\Users"), Some(r"C:\".to_string()));
        assert_eq!(parent(r"C:\"), None);
        assert_eq!(parent("/home/ada"), Some("/home".to_string()));
        assert_eq!(parent("/home"), Some("/".to_string()));
        assert_eq!(parent("/"), None);

        assert_eq!(leaf(r"C:\Users\ada"), Some("ada"));
        assert_eq!(leaf("/"), None);
    }

    #[test]
    fn test_join() {
        assert_eq!(join(r"C:\Users", "ada"), r"C:\Users\ada");
        assert_eq!(join(r"C:\", "Users"), r"C:\Users");
        assert_eq!(join("/", "home"), "/home");
        assert_eq!(join("/home", "ada"), "/home/ada");
    }

    #[test]
    fn test_contains_is_component_aware() {
        assert!(contains(r"C:\Users\X", r"C:\Users\X\Docs"));
        assert!(contains(r"C:\Users\X", r"C:\Users\X"));
        assert!(!contains(r"C:\Users\X", r"C:\Users\XY"));
        assert!(!contains("", r"C:\Users"));
        assert!(contains("/home", "/home/ada"));
        assert!(!contains("/home", "home/ada"));
    }

    #[test]
    fn test_contains_ignores_separator_style() {
        assert!(contains("C:/Users/X", r"C:\Users\X\Docs"));
    }
}
