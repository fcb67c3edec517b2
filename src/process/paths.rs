//! Output file naming
//!
//! A formatted theory is never written over its source. It goes to a sibling
//! file whose stem carries the clean suffix: `Foo.thy` becomes `Foo-clean.thy`.

use std::path::{Path, PathBuf};

/// Sibling path the formatted version of `path` is written to
///
/// The suffix goes between the stem and the extension. A path without an
/// extension just gets the suffix appended.
#[must_use]
pub fn clean_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(name)
}

/// Whether `path` already is a clean output of some other file
#[must_use]
pub fn is_clean_output(path: &Path, suffix: &str) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.len() > suffix.len() && stem.ends_with(suffix))
}
