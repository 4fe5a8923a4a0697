//! Error types for the namespace model.
//!
//! Each domain carries its own error enum; [`ShellError`] aggregates them
//! for callers that cross domains (the browser, the demo CLI). Provider
//! failures surface as [`NativeError`] and are passed through unmodified,
//! never masked.

use thiserror::Error;

/// Identity resolution failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The locator string cannot be understood at all.
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    /// The locator is a URI with a scheme other than `shell` or `file`.
    #[error("unsupported uri scheme `{0}`")]
    UnsupportedScheme(String),

    /// The locator parsed, but no item exists at the location.
    #[error("no item found at `{0}`")]
    NotFound(String),

    /// A `shell:///` locator names a folder the index does not know.
    #[error("`{0}` is not a registered known folder")]
    UnknownFolder(String),

    /// A provider call failed while resolving.
    #[error(transparent)]
    Native(#[from] NativeError),
}

/// Filter-string parse and wildcard compilation failures.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The filter string must pair every caption with a pattern, e.g.
    /// `"Text files|*.txt|All files|*.*"`.
    #[error("malformed filter `{input}`: expected caption|pattern pairs, found {tokens} tokens")]
    MalformedFilter { input: String, tokens: usize },

    /// A wildcard pattern did not compile.
    #[error("invalid wildcard pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// History navigation failures. All of these are expected, recoverable
/// conditions; callers can consult the availability flags first, but the
/// failing call itself never mutates the history.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("cannot navigate back: already at the oldest entry")]
    CannotNavigateBack,

    #[error("cannot navigate forward: already at the newest entry")]
    CannotNavigateForward,

    #[error("item is not in the back history")]
    NotInBackHistory,

    #[error("item is not in the forward history")]
    NotInForwardHistory,
}

/// A failed call into the native namespace binding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("native operation `{operation}` failed: {message}")]
pub struct NativeError {
    pub operation: &'static str,
    pub message: String,
}

impl NativeError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Manifest loading and validation failures.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Drive names must be designators like `C:` or the unix root `/`.
    #[error("`{0}` is not a drive designator")]
    InvalidDrive(String),

    /// Folder and file entries must carry absolute paths.
    #[error("manifest entry `{0}` must be an absolute path")]
    RelativePath(String),

    /// A file entry sits where a folder chain needs to pass through.
    #[error("manifest conflict at `{0}`: a file blocks the folder chain")]
    Conflict(String),
}

/// Aggregate error for callers that cross domains.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Native(#[from] NativeError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

pub type ResolveResult<T> = Result<T, ResolveError>;
pub type FilterResult<T> = Result<T, FilterError>;
pub type HistoryResult<T> = Result<T, HistoryError>;
pub type NativeResult<T> = Result<T, NativeError>;
pub type ManifestResult<T> = Result<T, ManifestError>;
pub type ShellResult<T> = Result<T, ShellError>;
