//! Location URIs.
//!
//! Two schemes address namespace locations:
//! - `shell:///<KnownFolder>/<name>/...` - a known folder followed by
//!   per-level display names walking down to the item.
//! - `file://<path>` - an absolute filesystem path.
//!
//! Parsing and rendering round-trip: `parse(uri.to_string())` yields the
//! original value. Segments are raw display names; no percent escaping is
//! applied in either direction.

use std::fmt;

use crate::config::{FILE_SCHEME, SHELL_SCHEME};
use crate::core::error::{ResolveError, ResolveResult};
use crate::utils::paths;

/// A parsed location URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellUri {
    /// `shell:///folder/seg1/seg2/...`
    Shell {
        folder: String,
        segments: Vec<String>,
    },
    /// `file://path`
    File { path: String },
}

impl ShellUri {
    /// Build a shell-scheme URI from a known-folder name and child segments.
    pub fn shell(folder: impl Into<String>, segments: Vec<String>) -> Self {
        ShellUri::Shell {
            folder: folder.into(),
            segments,
        }
    }

    /// Build a file-scheme URI from an absolute path.
    pub fn file(path: impl Into<String>) -> Self {
        ShellUri::File { path: path.into() }
    }

    /// The scheme name of this URI.
    pub fn scheme(&self) -> &'static str {
        match self {
            ShellUri::Shell { .. } => SHELL_SCHEME,
            ShellUri::File { .. } => FILE_SCHEME,
        }
    }

    /// Parse a URI string.
    ///
    /// # Returns
    /// The parsed URI, or [`ResolveError::InvalidLocator`] for strings
    /// without a scheme or with an empty body, and
    /// [`ResolveError::UnsupportedScheme`] for any scheme other than
    /// `shell` and `file`.
    pub fn parse(input: &str) -> ResolveResult<Self> {
        let input = input.trim();
        let Some((scheme, rest)) = input.split_once("://") else {
            return Err(ResolveError::InvalidLocator(format!(
                "`{input}` is not a uri: missing scheme"
            )));
        };

        if scheme.eq_ignore_ascii_case(SHELL_SCHEME) {
            let mut names = rest.split('/').filter(|s| !s.is_empty());
            let Some(folder) = names.next() else {
                return Err(ResolveError::InvalidLocator(format!(
                    "`{input}` names no known folder"
                )));
            };
            return Ok(ShellUri::Shell {
                folder: folder.to_string(),
                segments: names.map(str::to_string).collect(),
            });
        }

        if scheme.eq_ignore_ascii_case(FILE_SCHEME) {
            let path = strip_path_authority(rest);
            if path.is_empty() {
                return Err(ResolveError::InvalidLocator(format!(
                    "`{input}` carries no path"
                )));
            }
            return Ok(ShellUri::File {
                path: path.to_string(),
            });
        }

        Err(ResolveError::UnsupportedScheme(scheme.to_string()))
    }
}

/// Strip the empty-authority slash in front of a drive-rooted path, so
/// `file:///C:\Users` and `file://C:\Users` parse to the same location.
/// A slash starting a unix-style path is part of the path and kept.
fn strip_path_authority(rest: &str) -> &str {
    if let Some(stripped) = rest.strip_prefix('/')
        && let Some(head) = stripped.split(['/', '\\']).next()
        && paths::is_drive(head)
    {
        return stripped;
    }
    rest
}

impl fmt::Display for ShellUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellUri::Shell { folder, segments } => {
                write!(f, "{SHELL_SCHEME}:///{folder}")?;
                for segment in segments {
                    write!(f, "/{segment}")?;
                }
                Ok(())
            }
            ShellUri::File { path } => {
                if path.starts_with('/') {
                    write!(f, "{FILE_SCHEME}://{path}")
                } else {
                    write!(f, "{FILE_SCHEME}:///{path}")
                }
            }
        }
    }
}
