//! File processing and formatting pipeline.
//!
//! This module orchestrates the two-pass formatting process:
//!
//! **Pass 1 - Rewrite:**
//! - Normalize whitespace and spacing around operators
//! - Move line-breaking keywords and split lines at mid-line keywords
//! - Merge justification lines, drop redundant brackets and solver commands
//!
//! **Pass 2 - Indentation:**
//! - Assign each clean line a level from its category and the previous line
//! - Squash multi-line quoted terms to two widths
//!
//! The main entry point is [`format_file`] which processes a buffered reader
//! and writes formatted output to any `Write` implementation. [`paths`] names
//! the sibling file a formatted theory is written to.

pub mod paths;
pub mod pipeline;

pub use paths::{clean_path, is_clean_output};
pub use pipeline::{format_file, format_lines, format_source};
