//! Error types and result aliases for thyprettier.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used throughout the crate
//! - [`IoContext`]: names the file an I/O error happened on

use std::path::Path;

use anyhow::Context as AnyhowContext;

pub type Result<T> = anyhow::Result<T>;

/// Attach the offending path to an I/O result
pub trait IoContext<T> {
    /// `action` reads as a verb: "open", "read", "create"
    fn for_path(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn for_path(self, action: &str, path: &Path) -> Result<T> {
        self.with_context(|| format!("Failed to {action} {}", path.display()))
    }
}
