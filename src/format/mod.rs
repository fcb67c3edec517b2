//! Theory source formatting.
//!
//! This module contains the line-level formatting logic organized into submodules:
//! - [`classify`]: Keyword tables and line categories
//! - [`tracker`]: Quote state, keyword search relative to quoted terms, bracket deltas
//! - [`whitespace`]: Applies spacing rules around operators, brackets and punctuation
//! - [`line_split`]: Moves breaker keywords and splits lines at mid-line keywords
//! - [`cleanup`]: Merges justification lines, removes superfluous parentheses and
//!   solver commands, flags `auto`
//! - [`indenter`]: Assigns indentation levels and squashes multi-line quoted terms

pub mod classify;
pub mod cleanup;
pub mod indenter;
pub mod line_split;
pub mod tracker;
pub mod whitespace;

pub use classify::{
    Category, BLANK_LINES_BEFORE_DECLARATION, INDENT_WIDTH, MAX_BLANK_LINES, MAX_LINE_LENGTH,
    REVIEW_FLAG,
};
pub use cleanup::{
    annotate_auto, detach_review_flag, elide_brackets, flatten_helpers, merge_helper,
    strip_solver_helpers,
};
pub use indenter::{indent_lines, TheoryIndenter};
pub use line_split::{relocate_breakers, split_conjuncts, split_line, wrap_long_line};
pub use tracker::{bracket_delta, count_quotes, CommentBlock, QuoteState};
pub use whitespace::{collapse_whitespace, normalize_spacing};
