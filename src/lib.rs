//! thyprettier - Auto-formatter for Isabelle theory files
//!
//! A line-based formatter for `.thy` proof scripts: normalized spacing,
//! canonical line breaking and depth-based indentation, driven by keyword
//! tables and quote/bracket counting rather than a grammar.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod process;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Config;
pub use error::Result;
pub use process::{clean_path, format_file, format_lines, format_source, is_clean_output};
