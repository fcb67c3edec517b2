//! In-line cleanups applied after splitting
//!
//! Covers justification-keyword deduplication and merging, removal of
//! superfluous parentheses, the review flag for the `auto` tactic and the
//! removal of exploratory solver commands.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

use crate::format::classify::{
    display_len, Category, MAX_LINE_LENGTH, PROTECTED_PROVERS, REVIEW_FLAG, TODO_MARKER,
};
use crate::format::tracker::{
    code_end, inside_quote_at, is_word_at, is_word_char, quote_positions, split_quoted,
};
use crate::format::whitespace::normalize_spacing;

/// Build a regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. All patterns in this module are
/// constants covered by tests.
fn build_re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

/// `apply auto` and `apply (auto ...`
static APPLY_AUTO_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"\bapply \(?auto\b"));

/// Exploratory solver commands, longest alternative first
static SOLVER_HELPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(&format!(
        r"\b({})\b",
        Category::SolverHelper.keywords().join("|")
    ))
});

/// A parenthesized candidate for unwrapping: no whitespace, nesting,
/// separators, digits or operator characters inside
static ATOMIC_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r#"\(([^\s()',0-9{}\[\]"\\+\-*=|@#:;]+)\)"#));

/// Strip a trailing review flag so the line is reformatted as if it had
/// never been flagged; [`annotate_auto`] puts it back
#[must_use]
pub fn detach_review_flag(line: &str) -> String {
    line.strip_suffix(REVIEW_FLAG)
        .map_or(line, str::trim_end)
        .to_string()
}

/// Byte offsets of whole-word `word` occurrences in the code part of the
/// line, outside quoted terms
fn code_word_positions(line: &str, word: &str, inside_quote: bool) -> Vec<usize> {
    let limit = code_end(line, inside_quote);
    line.match_indices(word)
        .map(|(i, _)| i)
        .filter(|&i| {
            i < limit && is_word_at(line, i, word.len()) && !inside_quote_at(line, i, inside_quote)
        })
        .collect()
}

/// Collapse repeated justification keywords into one
///
/// `using a using b` becomes `using a b`.
#[must_use]
pub fn flatten_helpers(line: &str, inside_quote: bool) -> String {
    let mut line = line.to_string();
    for &helper in Category::ProofHelper.keywords() {
        let positions = code_word_positions(&line, helper, inside_quote);
        if positions.len() < 2 {
            continue;
        }
        let mut flattened = format!("{}{helper}", &line[..positions[0]]);
        let ends = positions.iter().skip(1).copied().chain(std::iter::once(line.len()));
        for (&start, end) in positions.iter().zip(ends) {
            let argument = line[start + helper.len()..end].trim();
            if !argument.is_empty() {
                flattened.push(' ');
                flattened.push_str(argument);
            }
        }
        line = flattened;
    }
    line
}

/// Merge a justification line into the previous output line when both start
/// with the same keyword and the result stays within the line budget
///
/// Returns true when the line was absorbed.
pub fn merge_helper(line: &str, output: &mut [String]) -> bool {
    let Some(helper) = Category::ProofHelper.leading_word(line) else {
        return false;
    };
    let Some(last) = output.last_mut() else {
        return false;
    };
    if Category::ProofHelper.leading_word(last) != Some(helper) {
        return false;
    }
    if display_len(last) + display_len(line) - helper.len() >= MAX_LINE_LENGTH {
        return false;
    }
    last.push(' ');
    last.push_str(line[helper.len()..].trim());
    true
}

fn is_protected_prover(token: &str) -> bool {
    PROTECTED_PROVERS.contains(&token)
}

/// Remove one layer of parentheses around atomic tokens in unquoted text
fn unwrap_atomic_once(segment: &str) -> String {
    let mut result = String::with_capacity(segment.len());
    let mut copied = 0;
    for caps in ATOMIC_GROUP_RE.captures_iter(segment) {
        let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let glued_before = segment[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(is_word_char);
        let glued_after = segment[whole.end()..]
            .chars()
            .next()
            .is_some_and(is_word_char);
        if glued_before || glued_after || is_protected_prover(token.as_str()) {
            continue;
        }
        result.push_str(&segment[copied..whole.start()]);
        result.push_str(token.as_str());
        copied = whole.end();
    }
    result.push_str(&segment[copied..]);
    result
}

/// Unwrap `(token)` groups outside quoted terms and comments
fn unwrap_atomic(line: &str, inside_quote: bool) -> String {
    let end = code_end(line, inside_quote);
    let (code, comment) = line.split_at(end);
    let parts = split_quoted(code);
    let mut result = String::with_capacity(line.len());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            result.push('"');
        }
        let quoted = inside_quote ^ (i % 2 == 1);
        if quoted {
            result.push_str(part);
        } else {
            let mut current = (*part).to_string();
            loop {
                let next = unwrap_atomic_once(&current);
                if next == current {
                    break;
                }
                current = next;
            }
            result.push_str(&current);
        }
    }
    result.push_str(comment);
    result
}

/// Location of a closing parenthesis: on the current line or on a pending
/// line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    Current(usize),
    Pending(usize, usize),
}

/// Scan forward from just after `"(` for the matching `)`
///
/// Returns the closer only when it is directly followed (whitespace aside)
/// by the closing quote, with no comma at the outermost level.
fn find_term_closer(rest: &str, offset: usize, pending: &VecDeque<String>) -> Option<Closer> {
    let mut depth = 1usize;
    let mut closer = None;

    let sources = std::iter::once((None, rest)).chain(
        pending
            .iter()
            .enumerate()
            .map(|(idx, line)| (Some(idx), line.as_str())),
    );
    for (source, text) in sources {
        let quotes = quote_positions(text);
        for (i, c) in text.char_indices() {
            if closer.is_some() {
                if c.is_whitespace() {
                    continue;
                }
                return (c == '"' && quotes.contains(&i)).then_some(closer).flatten();
            }
            match c {
                '"' if quotes.contains(&i) => return None,
                ',' if depth == 1 => return None,
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        closer = Some(match source {
                            None => Closer::Current(offset + i),
                            Some(idx) => Closer::Pending(idx, i),
                        });
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Remove one pair of parentheses wrapping a whole quoted term
fn unwrap_quoted_term_once(
    line: &mut String,
    pending: &mut VecDeque<String>,
    inside_quote: bool,
) -> bool {
    let quotes = quote_positions(line);
    for (k, &q) in quotes.iter().enumerate() {
        let opening = !(inside_quote ^ (k % 2 == 1));
        if !opening || !line[q + 1..].starts_with('(') {
            continue;
        }
        let start = q + 2;
        match find_term_closer(&line[start..], start, pending) {
            Some(Closer::Current(close)) => {
                line.remove(close);
                line.remove(q + 1);
                return true;
            }
            Some(Closer::Pending(idx, close)) => {
                if let Some(target) = pending.get_mut(idx) {
                    target.remove(close);
                }
                line.remove(q + 1);
                return true;
            }
            None => {}
        }
    }
    false
}

/// Remove superfluous parentheses
///
/// `(simp)` becomes `simp` when the group holds a single atomic token, and
/// `"(A \<and> B)"` becomes `"A \<and> B"` even when the closing `)"` lies on
/// a later pending line.
pub fn elide_brackets(line: &str, pending: &mut VecDeque<String>, inside_quote: bool) -> String {
    let mut line = unwrap_atomic(line, inside_quote);
    while unwrap_quoted_term_once(&mut line, pending, inside_quote) {}
    line
}

/// Append the review flag to lines that call the generic `auto` tactic
#[must_use]
pub fn annotate_auto(line: &str) -> String {
    if APPLY_AUTO_RE.is_match(line) && !line.contains(TODO_MARKER) {
        format!("{line} {REVIEW_FLAG}")
    } else {
        line.to_string()
    }
}

/// Remove exploratory solver commands outside quoted terms
#[must_use]
pub fn strip_solver_helpers(line: &str, inside_quote: bool) -> String {
    let end = code_end(line, inside_quote);
    let (code, comment) = line.split_at(end);
    if !SOLVER_HELPER_RE.is_match(code) {
        return line.to_string();
    }

    let mut stripped = String::with_capacity(line.len());
    for (i, part) in split_quoted(code).iter().enumerate() {
        if i > 0 {
            stripped.push('"');
        }
        if inside_quote ^ (i % 2 == 1) {
            stripped.push_str(part);
        } else {
            stripped.push_str(&SOLVER_HELPER_RE.replace_all(part, ""));
        }
    }
    stripped.push_str(comment);
    // The removal can leave punctuation next to a space it would not take
    normalize_spacing(&stripped, inside_quote)
}
