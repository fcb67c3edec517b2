//! Whitespace formatting for theory lines
//!
//! Implements quote-aware spacing in two stages:
//! 1. `format_structural`: tokenize the text outside quoted terms and
//!    re-join the tokens with operator, bracket and punctuation spacing
//! 2. `normalize_spacing`: glue the formatted outside parts and the trimmed
//!    quoted parts back together with one space at each quote boundary
//!
//! Quoted terms, cartouches and `(* *)` comments are copied verbatim apart
//! from the trimming at quote boundaries.

use crate::format::tracker::{split_quoted, MULTI_CLOSE, MULTI_OPEN};

const CARTOUCHE_OPEN: &str = "\\<open>";
const CARTOUCHE_CLOSE: &str = "\\<close>";

/// Characters that form symbolic operator runs (`=`, `==>`, `::` is separate)
const OPERATOR_CHARS: &[char] = &['+', '-', '*', '=', '|', '@', '#', '`', '<', '>'];

/// Alphabetic operators
const OPERATOR_WORDS: &[&str] = &["div"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Word,
    Operator,
    Open,
    Close,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    /// Comments and cartouches, copied verbatim
    Opaque,
}

#[derive(Debug, Clone, Copy)]
struct Piece<'a> {
    kind: Kind,
    text: &'a str,
    /// Whitespace preceded this piece in the input
    spaced: bool,
}

/// A formatted run of text between two quotes
#[derive(Debug, Clone, PartialEq, Eq)]
struct Formatted {
    text: String,
    /// First token is a closer or punctuation that glues to what precedes it
    glues_left: bool,
    /// Last token is an opener that glues to what follows it
    glues_right: bool,
}

/// Collapse every whitespace run to a single space and trim the line
#[must_use]
pub fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize spacing of a whole line
///
/// `inside_quote` is the quote state at the start of the line: when true the
/// first part of the line continues a quoted term opened on an earlier line.
#[must_use]
pub fn normalize_spacing(line: &str, inside_quote: bool) -> String {
    let parts = split_quoted(line);
    if parts.len() == 1 {
        return if inside_quote {
            line.trim().to_string()
        } else {
            format_structural(line).text
        };
    }

    let last = parts.len() - 1;
    let mut result = String::with_capacity(line.len() + 8);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            result.push('"');
        }
        let quoted = inside_quote ^ (i % 2 == 1);
        if quoted {
            result.push_str(part.trim());
            continue;
        }

        let formatted = format_structural(part);
        if formatted.text.is_empty() {
            // Two quoted terms next to each other get one separating space
            if i > 0 && i < last {
                result.push(' ');
            }
            continue;
        }
        if i > 0 && !formatted.glues_left {
            result.push(' ');
        }
        result.push_str(&formatted.text);
        if i < last && !formatted.glues_right {
            result.push(' ');
        }
    }
    result.trim().to_string()
}

fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(&c)
}

/// Length of a `\<name>` symbol at the start of `rest`, if any
fn symbol_len(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix("\\<")?;
    let name_len = body.find(|c: char| !c.is_ascii_alphabetic())?;
    body[name_len..].starts_with('>').then_some(name_len + 3)
}

/// Length of a cartouche starting at `rest`, nested cartouches included
fn cartouche_len(rest: &str) -> usize {
    let mut depth = 0usize;
    let mut i = 0;
    while i < rest.len() {
        if rest[i..].starts_with(CARTOUCHE_OPEN) {
            depth += 1;
            i += CARTOUCHE_OPEN.len();
        } else if rest[i..].starts_with(CARTOUCHE_CLOSE) {
            depth = depth.saturating_sub(1);
            i += CARTOUCHE_CLOSE.len();
            if depth == 0 {
                return i;
            }
        } else {
            i += rest[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    rest.len()
}

/// Whether a word starting at `rest` must stop here
fn ends_word(rest: &str) -> bool {
    let Some(c) = rest.chars().next() else {
        return true;
    };
    if c.is_whitespace() || matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | ',' | ';' | ':') {
        return true;
    }
    if is_operator_char(c) {
        return true;
    }
    symbol_len(rest).is_some()
}

fn tokenize(segment: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut spaced = false;
    let mut i = 0;

    while i < segment.len() {
        let rest = &segment[i..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        if c.is_whitespace() {
            spaced = true;
            i += c.len_utf8();
            continue;
        }

        let (kind, len) = if rest.starts_with("(*") {
            let len = rest[2..].find("*)").map_or(rest.len(), |end| end + 4);
            (Kind::Opaque, len)
        } else if rest.starts_with(CARTOUCHE_OPEN) {
            (Kind::Opaque, cartouche_len(rest))
        } else if rest.starts_with(MULTI_OPEN) {
            (Kind::Open, MULTI_OPEN.len())
        } else if rest.starts_with(MULTI_CLOSE) {
            (Kind::Close, MULTI_CLOSE.len())
        } else if let Some(len) = symbol_len(rest) {
            (Kind::Operator, len)
        } else {
            match c {
                '(' | '{' => (Kind::Open, 1),
                ')' | '}' => (Kind::Close, 1),
                '[' => (Kind::LBracket, 1),
                ']' => (Kind::RBracket, 1),
                ',' => (Kind::Comma, 1),
                ';' => (Kind::Semicolon, 1),
                ':' if rest.starts_with("::") => (Kind::Operator, 2),
                ':' => (Kind::Colon, 1),
                c if is_operator_char(c) => {
                    let len = rest.find(|c: char| !is_operator_char(c)).unwrap_or(rest.len());
                    (Kind::Operator, len)
                }
                _ => {
                    let mut len = 0;
                    while len < rest.len() {
                        let tail = &rest[len..];
                        if len > 0 && ends_word(tail) {
                            break;
                        }
                        // Control symbols such as \<^sub> belong to the identifier
                        len += if tail.starts_with("\\<^") {
                            tail.find('>').map_or(tail.len(), |end| end + 1)
                        } else {
                            tail.chars().next().map_or(1, char::len_utf8)
                        };
                    }
                    let kind = if OPERATOR_WORDS.contains(&&rest[..len]) {
                        Kind::Operator
                    } else {
                        Kind::Word
                    };
                    (kind, len)
                }
            }
        };

        pieces.push(Piece {
            kind,
            text: &segment[i..i + len],
            spaced,
        });
        spaced = false;
        i += len;
    }
    pieces
}

/// `[of` and `[OF` attach to the fact they instantiate
fn is_instantiation(next: Option<&Piece<'_>>) -> bool {
    matches!(next, Some(p) if p.kind == Kind::Word && (p.text == "of" || p.text == "OF"))
}

/// Decide whether a single space separates two adjacent pieces
fn space_between(prev: &Piece<'_>, cur: &Piece<'_>, next: Option<&Piece<'_>>) -> bool {
    use Kind::{Close, Colon, Comma, LBracket, Open, Operator, RBracket, Semicolon};

    if matches!(cur.kind, Close | RBracket | Comma | Colon | Semicolon) {
        return false;
    }
    if matches!(prev.kind, Open | LBracket | Comma) {
        return false;
    }
    if matches!(prev.kind, Colon | Semicolon) {
        return true;
    }
    if cur.kind == LBracket {
        return !is_instantiation(next);
    }
    if cur.kind == Open {
        return true;
    }
    if matches!(prev.kind, Close | RBracket) {
        return true;
    }
    // Operators take a space on each side unless glued to an underscore
    if prev.kind == Operator {
        return !cur.text.starts_with('_') || cur.spaced;
    }
    if cur.kind == Operator {
        return !prev.text.ends_with('_') || cur.spaced;
    }
    cur.spaced
}

/// Apply operator, bracket and punctuation spacing to text outside quotes
fn format_structural(segment: &str) -> Formatted {
    let pieces = tokenize(segment);
    let mut text = String::with_capacity(segment.len() + 8);
    for (idx, piece) in pieces.iter().enumerate() {
        if idx > 0 && space_between(&pieces[idx - 1], piece, pieces.get(idx + 1)) {
            text.push(' ');
        }
        text.push_str(piece.text);
    }

    let glues_left = pieces.first().is_some_and(|p| {
        matches!(
            p.kind,
            Kind::Close | Kind::RBracket | Kind::Comma | Kind::Colon | Kind::Semicolon
        )
    });
    let glues_right = pieces
        .last()
        .is_some_and(|p| matches!(p.kind, Kind::Open | Kind::LBracket));

    Formatted {
        text,
        glues_left,
        glues_right,
    }
}
