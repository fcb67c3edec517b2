//! Quote and bracket tracking
//!
//! Quoted terms may span several physical lines, so both the rewrite
//! pipeline and the indenter carry a [`QuoteState`] from line to line. The
//! helpers here count unescaped quotes, locate keywords relative to quoted
//! spans, and measure the net bracket depth change of a line.

/// Opening multi-character bracket token
pub const MULTI_OPEN: &str = "\\<lbrakk>";
/// Closing multi-character bracket token
pub const MULTI_CLOSE: &str = "\\<rbrakk>";

const CARTOUCHE_OPEN: &str = "\\<open>";
const CARTOUCHE_CLOSE: &str = "\\<close>";
const COMMENT_OPEN: &str = "(*";
const COMMENT_CLOSE: &str = "*)";
const INLINE_TEXT: &str = "text \\<open>";

/// Whether the scan is inside a quoted term that crosses a line boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteState {
    inside: bool,
}

impl QuoteState {
    #[must_use]
    pub fn new(inside: bool) -> Self {
        Self { inside }
    }

    #[must_use]
    pub fn is_inside(self) -> bool {
        self.inside
    }

    /// Account for one more line; returns true if the state flipped
    pub fn update(&mut self, line: &str) -> bool {
        let toggles = count_quotes(line) % 2 == 1;
        if toggles {
            self.inside = !self.inside;
        }
        toggles
    }
}

/// Depth of open cartouche / `(* *)` comment blocks started by comment lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentBlock {
    depth: usize,
}

impl CommentBlock {
    #[must_use]
    pub fn is_open(self) -> bool {
        self.depth > 0
    }

    pub fn update(&mut self, line: &str) {
        let opens = line.matches(CARTOUCHE_OPEN).count() + line.matches(COMMENT_OPEN).count();
        let closes = line.matches(CARTOUCHE_CLOSE).count() + line.matches(COMMENT_CLOSE).count();
        self.depth = (self.depth + opens).saturating_sub(closes);
    }
}

/// Characters that belong to an identifier for keyword-boundary purposes
///
/// Symbol escapes (`\<and>`) count as identifier characters so that a
/// keyword spelled inside one is never taken for the keyword itself.
#[must_use]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '\'' | '.' | '\\' | '<' | '>' | '^')
}

/// Number of quote characters not preceded by a backslash
#[must_use]
pub fn count_quotes(line: &str) -> usize {
    quote_positions(line).len()
}

/// Byte offsets of every unescaped quote character
#[must_use]
pub fn quote_positions(line: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut prev = None;
    for (i, c) in line.char_indices() {
        if c == '"' && prev != Some('\\') {
            positions.push(i);
        }
        prev = Some(c);
    }
    positions
}

/// Split a line at its unescaped quotes
///
/// Always returns at least one part; consecutive parts alternate between
/// outside and inside a quoted term.
#[must_use]
pub fn split_quoted(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for pos in quote_positions(line) {
        parts.push(&line[start..pos]);
        start = pos + 1;
    }
    parts.push(&line[start..]);
    parts
}

/// Whether byte offset `idx` lies inside a quoted term, given the state at
/// the start of the line
#[must_use]
pub fn inside_quote_at(line: &str, idx: usize, inside_at_start: bool) -> bool {
    inside_at_start ^ (count_quotes(&line[..idx]) % 2 == 1)
}

/// Whether `line[idx..idx + len]` is not glued to identifier characters
#[must_use]
pub fn is_word_at(line: &str, idx: usize, len: usize) -> bool {
    let before = line[..idx].chars().next_back();
    let after = line[idx + len..].chars().next();
    !matches!(before, Some(c) if is_word_char(c)) && !matches!(after, Some(c) if is_word_char(c))
}

/// Byte offset where the code part of a line ends: the start of the first
/// `(*` comment or inline `text \<open>` outside quoted terms
#[must_use]
pub fn code_end(line: &str, inside_at_start: bool) -> usize {
    [COMMENT_OPEN, INLINE_TEXT]
        .iter()
        .filter_map(|marker| {
            line.match_indices(marker)
                .map(|(i, _)| i)
                .find(|&i| !inside_quote_at(line, i, inside_at_start))
        })
        .min()
        .unwrap_or(line.len())
}

/// First whole-word occurrence of `word`, anywhere in the line
#[must_use]
pub fn find_word(line: &str, word: &str) -> Option<usize> {
    line.match_indices(word)
        .map(|(i, _)| i)
        .find(|&i| is_word_at(line, i, word.len()))
}

/// First whole-word occurrence of `word` outside quoted terms
#[must_use]
pub fn find_word_outside(line: &str, word: &str, inside_at_start: bool) -> Option<usize> {
    line.match_indices(word).map(|(i, _)| i).find(|&i| {
        is_word_at(line, i, word.len()) && !inside_quote_at(line, i, inside_at_start)
    })
}

/// Occurrences of a multi-character token, measured as removed length
/// divided by token length
#[must_use]
pub fn approx_token_count(line: &str, token: &str) -> usize {
    (line.len() - line.replace(token, "").len()) / token.len()
}

/// Net bracket delta of a line: `(` and `[` plus `\<lbrakk>`, minus their
/// closing counterparts
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn bracket_delta(line: &str) -> isize {
    let opens = line.chars().filter(|c| matches!(c, '(' | '[')).count()
        + approx_token_count(line, MULTI_OPEN);
    let closes = line.chars().filter(|c| matches!(c, ')' | ']')).count()
        + approx_token_count(line, MULTI_CLOSE);
    opens as isize - closes as isize
}
