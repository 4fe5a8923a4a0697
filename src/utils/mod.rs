//! Utility modules.
//!
//! Provides:
//! - [`paths`] - lexical path splitting, joining and containment

pub mod paths;
