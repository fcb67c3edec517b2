//! Line breaking for theory lines
//!
//! Implements the rules that move or cut lines at keyword boundaries:
//! - [`relocate_breakers`]: move line enders, line starters and leading
//!   `and` across the line boundary they sit on
//! - [`split_line`]: cut a line at a mid-line keyword, queueing the tail
//! - [`split_conjuncts`]: one quoted clause per line for `assumes`/`shows`/`fixes`
//! - [`wrap_long_line`]: greedy word packing for long justification lines
//!
//! Tails are pushed to the front of the pending queue so they are the next
//! lines the pipeline visits.

use std::collections::VecDeque;

use crate::format::classify::{contains_word, display_len, Category, MAX_LINE_LENGTH};
use crate::format::tracker::{
    code_end, find_word, find_word_outside, inside_quote_at, is_word_at, is_word_char,
    quote_positions, split_quoted,
};

/// Queue `lines` so they are visited next, in order
pub fn queue_next<I>(pending: &mut VecDeque<String>, lines: I)
where
    I: IntoIterator<Item = String>,
    I::IntoIter: DoubleEndedIterator,
{
    for line in lines.into_iter().rev() {
        pending.push_front(line);
    }
}

/// Whole-word occurrence of `word` in the code part of the line
fn find_code_word(line: &str, word: &str, inside_quote: bool) -> Option<usize> {
    find_word_outside(line, word, inside_quote).filter(|&p| p < code_end(line, inside_quote))
}

/// First occurrence of `keyword` with matching neighbours, optionally
/// restricted to the code part outside quoted terms
fn find_split<B, A>(
    line: &str,
    keyword: &str,
    outside: Option<bool>,
    before: B,
    after: A,
) -> Option<usize>
where
    B: Fn(char) -> bool,
    A: Fn(char) -> bool,
{
    let limit = outside.map_or(line.len(), |inside| code_end(line, inside));
    line.match_indices(keyword).map(|(i, _)| i).find(|&i| {
        let prev = line[..i].chars().next_back();
        let next = line[i + keyword.len()..].chars().next();
        matches!(prev, Some(c) if before(c))
            && matches!(next, Some(c) if after(c))
            && outside.map_or(true, |inside| i < limit && !inside_quote_at(line, i, inside))
    })
}

fn is_breaker_prefix(c: char) -> bool {
    c.is_whitespace() || c == ')'
}

fn is_breaker_suffix(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

/// Whether `line` ends with `keyword` as a whole word
fn ends_with_word(line: &str, keyword: &str) -> bool {
    line.strip_suffix(keyword).is_some_and(|head| {
        head.chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c))
    })
}

/// Append `suffix` to the last output line if there is a non-blank one
fn append_to_last(output: &mut [String], suffix: &str) -> bool {
    match output.last_mut() {
        Some(last) if !last.trim().is_empty() => {
            last.push(' ');
            last.push_str(suffix);
            true
        }
        _ => false,
    }
}

/// Move breaker keywords across line boundaries
///
/// - a line that is, or starts with, a line ender hands the keyword to the
///   previous output line
/// - a line ending with a line starter hands the keyword to the next
///   pending line
/// - a leading `and` moves to the previous output line
/// - a line opening a quoted clause right after a closed one joins them
///   with `and`
pub fn relocate_breakers(
    line: String,
    output: &mut [String],
    pending: &mut VecDeque<String>,
    inside_quote: bool,
) -> String {
    let mut line = line;

    for &ender in Category::LineEnder.keywords() {
        let Some(rest) = line.strip_prefix(ender) else {
            continue;
        };
        let at_boundary = rest
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || matches!(c, '(' | ')' | '"'));
        if at_boundary && append_to_last(output, ender) {
            line = rest.trim().to_string();
        }
    }

    for &starter in Category::LineStarter.keywords() {
        if !ends_with_word(&line, starter) {
            continue;
        }
        if let Some(next) = pending.front_mut() {
            *next = format!("{starter} {next}").trim().to_string();
            line.truncate(line.len() - starter.len());
            line = line.trim().to_string();
        }
    }

    if find_word(&line, "and") == Some(0) && append_to_last(output, "and") {
        return line["and".len()..].trim().to_string();
    }

    if !inside_quote
        && line.starts_with('"')
        && output.last().is_some_and(|last| last.ends_with('"'))
    {
        append_to_last(output, "and");
    }
    line
}

/// Split at a mid-line line ender (head keeps the keyword) and then at a
/// mid-line line starter (tail starts with the keyword)
fn split_breakers(line: String, pending: &mut VecDeque<String>) -> String {
    let mut line = line;
    for &ender in Category::LineEnder.keywords() {
        if let Some(p) = find_split(&line, ender, None, is_breaker_prefix, is_breaker_suffix) {
            let tail = line[p + ender.len()..].trim().to_string();
            if !tail.is_empty() {
                pending.push_front(tail);
            }
            line = format!("{} {ender}", line[..p].trim_end());
        }
    }
    for &starter in Category::LineStarter.keywords() {
        if let Some(p) = find_split(&line, starter, None, is_breaker_prefix, is_breaker_suffix) {
            pending.push_front(line[p..].trim().to_string());
            line = line[..p].trim_end().to_string();
        }
    }
    line
}

/// Byte length of the method argument at the start of `after`: a balanced
/// parenthesized group, or the first word
fn method_len(after: &str) -> usize {
    if after.starts_with('(') {
        let mut depth = 0usize;
        for (i, c) in after.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
        }
        after.len()
    } else {
        after.find(char::is_whitespace).unwrap_or(after.len())
    }
}

fn starts_with_comment(text: &str) -> bool {
    code_end(text, false) == 0
}

/// Put `apply <method>` on a line of its own
fn split_apply(line: &str, pending: &mut VecDeque<String>, inside_quote: bool) -> Option<String> {
    let p = find_code_word(line, "apply", inside_quote)?;
    let after = line[p + "apply".len()..].trim_start();
    let (method, remainder) = after.split_at(method_len(after));
    let remainder = remainder.trim();

    let mut apply_line = format!("apply {method}").trim_end().to_string();
    let mut queued = Vec::new();
    if starts_with_comment(remainder) {
        apply_line = format!("{apply_line} {remainder}");
    } else if !remainder.is_empty() {
        queued.push(remainder.to_string());
    }

    if p == 0 {
        if queued.is_empty() {
            return None;
        }
        queue_next(pending, queued);
        return Some(apply_line);
    }
    queue_next(pending, std::iter::once(apply_line).chain(queued).collect::<Vec<_>>());
    Some(line[..p].trim_end().to_string())
}

/// Cut the line at byte `p`, queueing the tail
fn cut_at(line: &str, p: usize, pending: &mut VecDeque<String>) -> String {
    pending.push_front(line[p..].trim().to_string());
    line[..p].trim_end().to_string()
}

fn split_helpers(line: &str, pending: &mut VecDeque<String>, inside_quote: bool) -> Option<String> {
    if contains_word(line, "proof") {
        return None;
    }
    Category::ProofHelper.keywords().iter().find_map(|helper| {
        find_code_word(line, helper, inside_quote)
            .filter(|&p| p > 0)
            .map(|p| cut_at(line, p, pending))
    })
}

fn split_by(line: &str, pending: &mut VecDeque<String>, inside_quote: bool) -> Option<String> {
    find_code_word(line, "by", inside_quote)
        .filter(|&p| p > 0)
        .map(|p| cut_at(line, p, pending))
}

/// A declaration or `fixes`/`assumes` line is cut at the next clause keyword
fn split_parameters(
    line: &str,
    pending: &mut VecDeque<String>,
    inside_quote: bool,
) -> Option<String> {
    let opens_statement = Category::Declaration.starts(line)
        || Category::Parameter
            .leading_word(line)
            .is_some_and(|kw| kw != "shows");
    if !opens_statement {
        return None;
    }
    let limit = code_end(line, inside_quote);
    Category::Parameter
        .keywords()
        .iter()
        .filter_map(|kw| {
            line.match_indices(kw).map(|(i, _)| i).find(|&i| {
                i > 0
                    && i < limit
                    && is_word_at(line, i, kw.len())
                    && !inside_quote_at(line, i, inside_quote)
            })
        })
        .min()
        .map(|p| cut_at(line, p, pending))
}

fn split_and(line: &str, pending: &mut VecDeque<String>, inside_quote: bool) -> Option<String> {
    let p = find_split(
        line,
        "and",
        Some(inside_quote),
        |c| c.is_whitespace() || matches!(c, ')' | '"'),
        |c| c.is_whitespace() || matches!(c, '(' | ')' | '"'),
    )?;
    let tail = line[p + "and".len()..].trim();
    if !tail.is_empty() {
        pending.push_front(tail.to_string());
    }
    Some(format!("{} and", line[..p].trim_end()))
}

/// Positions `(closing, opening)` of adjacent quoted clauses: a closing
/// quote followed only by whitespace and an opening quote, outside any
/// `[...]` instantiation
fn clause_boundaries(line: &str, inside_quote: bool) -> Vec<(usize, usize)> {
    let quotes = quote_positions(line);
    let mut boundaries = Vec::new();
    for (k, pair) in quotes.windows(2).enumerate() {
        let closing = inside_quote ^ (k % 2 == 1);
        if !closing || !line[pair[0] + 1..pair[1]].trim().is_empty() {
            continue;
        }
        if instantiation_depth(line, pair[0], inside_quote) == 0 {
            boundaries.push((pair[0], pair[1]));
        }
    }
    boundaries
}

/// Net `[` depth outside quoted terms before byte `upto`
fn instantiation_depth(line: &str, upto: usize, inside_quote: bool) -> isize {
    split_quoted(&line[..upto])
        .iter()
        .enumerate()
        .filter(|(i, _)| !(inside_quote ^ (i % 2 == 1)))
        .map(|(_, part)| {
            part.chars()
                .map(|c| match c {
                    '[' => 1,
                    ']' => -1,
                    _ => 0,
                })
                .sum::<isize>()
        })
        .sum()
}

fn split_clauses(line: &str, pending: &mut VecDeque<String>, inside_quote: bool) -> Option<String> {
    if contains_word(line, "proof") || Category::Parameter.leading_word(line).is_some() {
        return None;
    }
    let &(close, open) = clause_boundaries(line, inside_quote).first()?;
    pending.push_front(line[open..].trim().to_string());
    Some(format!("{} and", line[..=close].trim_end()))
}

/// Split the line at mid-line keywords
///
/// Line enders and line starters are handled first and may both apply.
/// After that the first matching rule of `apply`, justification keywords,
/// `by`, clause keywords, `and` and adjacent quoted clauses cuts the line.
/// The head is split again until no rule matches; every tail is queued
/// ahead of the tails queued before it.
pub fn split_line(line: String, pending: &mut VecDeque<String>, inside_quote: bool) -> String {
    let mut line = line;
    loop {
        let head = split_breakers(line.clone(), pending);
        let head = split_apply(&head, pending, inside_quote)
            .or_else(|| split_helpers(&head, pending, inside_quote))
            .or_else(|| split_by(&head, pending, inside_quote))
            .or_else(|| split_parameters(&head, pending, inside_quote))
            .or_else(|| split_and(&head, pending, inside_quote))
            .or_else(|| split_clauses(&head, pending, inside_quote))
            .unwrap_or(head);
        if head == line {
            return line;
        }
        line = head;
    }
}

/// One quoted clause per line for `assumes`, `shows` and `fixes` lines
///
/// Every clause but the last is suffixed with `and`; the clauses after the
/// first are queued.
pub fn split_conjuncts(line: String, pending: &mut VecDeque<String>, inside_quote: bool) -> String {
    if Category::Parameter.leading_word(&line).is_none() {
        return line;
    }
    let boundaries = clause_boundaries(&line, inside_quote);
    if boundaries.is_empty() {
        return line;
    }

    let mut parts = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for &(close, open) in &boundaries {
        parts.push(format!("{} and", line[start..=close].trim()));
        start = open;
    }
    parts.push(line[start..].trim().to_string());

    let mut parts = parts.into_iter();
    let first = parts.next().unwrap_or_default();
    queue_next(pending, parts.collect::<Vec<_>>());
    first
}

/// Units of a justification line: words, with `[...]` instantiations and
/// quoted terms kept whole
fn wrap_units(text: &str) -> Vec<String> {
    let mut units: Vec<String> = Vec::new();
    let mut open = false;
    for word in text.split_whitespace() {
        if open {
            if let Some(unit) = units.last_mut() {
                unit.push(' ');
                unit.push_str(word);
            }
        } else {
            units.push(word.to_string());
        }
        open = units.last().is_some_and(|unit| {
            let depth: isize = unit
                .chars()
                .map(|c| match c {
                    '[' => 1,
                    ']' => -1,
                    _ => 0,
                })
                .sum();
            depth > 0 || quote_positions(unit).len() % 2 == 1
        });
    }
    units
}

/// Greedily pack a long justification line into the line budget
///
/// Always keeps at least one unit on the line; the rest is queued as a new
/// line starting with the same keyword.
pub fn wrap_long_line(line: String, pending: &mut VecDeque<String>) -> String {
    let Some(helper) = Category::ProofHelper.leading_word(&line) else {
        return line;
    };
    if display_len(&line) <= MAX_LINE_LENGTH {
        return line;
    }

    let units = wrap_units(&line[helper.len()..]);
    let mut head = helper.to_string();
    let mut taken = 0;
    for unit in &units {
        if taken > 0 && display_len(&head) + 1 + display_len(unit) > MAX_LINE_LENGTH {
            break;
        }
        head.push(' ');
        head.push_str(unit);
        taken += 1;
    }
    if taken < units.len() {
        pending.push_front(format!("{helper} {}", units[taken..].join(" ")));
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(lines: &[&str]) -> VecDeque<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    fn split(line: &str) -> (String, Vec<String>) {
        let mut pending = VecDeque::new();
        let head = split_line(line.to_string(), &mut pending, false);
        (head, pending.into_iter().collect())
    }

    #[test]
    fn test_queue_next_keeps_order() {
        let mut pending = queue(&["c"]);
        queue_next(&mut pending, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(pending, queue(&["a", "b", "c"]));
    }

    #[test]
    fn test_relocate_leading_ender() {
        let mut output = vec!["obtain x".to_string()];
        let mut pending = VecDeque::new();
        let line = relocate_breakers("where \"P x\"".to_string(), &mut output, &mut pending, false);
        assert_eq!(line, "\"P x\"");
        assert_eq!(output, vec!["obtain x where"]);
    }

    #[test]
    fn test_relocate_ender_needs_boundary() {
        let mut output = vec!["x".to_string()];
        let mut pending = VecDeque::new();
        let line = relocate_breakers("office".to_string(), &mut output, &mut pending, false);
        assert_eq!(line, "office");
        assert_eq!(output, vec!["x"]);
    }

    #[test]
    fn test_relocate_trailing_starter() {
        let mut output = Vec::new();
        let mut pending = queue(&["show ?thesis"]);
        let line = relocate_breakers("have \"P\" then".to_string(), &mut output, &mut pending, false);
        assert_eq!(line, "have \"P\"");
        assert_eq!(pending, queue(&["then show ?thesis"]));
    }

    #[test]
    fn test_relocate_trailing_starter_without_next_line() {
        let mut output = Vec::new();
        let mut pending = VecDeque::new();
        let line = relocate_breakers("if a then".to_string(), &mut output, &mut pending, false);
        assert_eq!(line, "if a then");
    }

    #[test]
    fn test_relocate_leading_and() {
        let mut output = vec!["assumes \"A\"".to_string()];
        let mut pending = VecDeque::new();
        let line = relocate_breakers("and \"B\"".to_string(), &mut output, &mut pending, false);
        assert_eq!(line, "\"B\"");
        assert_eq!(output, vec!["assumes \"A\" and"]);
    }

    #[test]
    fn test_relocate_adjacent_clause() {
        let mut output = vec!["shows \"A\"".to_string()];
        let mut pending = VecDeque::new();
        let line = relocate_breakers("\"B\"".to_string(), &mut output, &mut pending, false);
        assert_eq!(line, "\"B\"");
        assert_eq!(output, vec!["shows \"A\" and"]);

        // a quote closing a multi-line term is not a new clause
        let mut output = vec!["have \"A".to_string()];
        relocate_breakers("\" by simp".to_string(), &mut output, &mut pending, true);
        assert_eq!(output, vec!["have \"A"]);
    }

    #[test]
    fn test_split_by() {
        let (head, tail) = split("have x by (metis foo)");
        assert_eq!(head, "have x");
        assert_eq!(tail, vec!["by (metis foo)"]);
    }

    #[test]
    fn test_split_by_ignores_quoted_and_comment() {
        assert_eq!(split("have \"x by y\"").1, Vec::<String>::new());
        assert_eq!(split("apply simp (* by hand *)").0, "apply simp (* by hand *)");
    }

    #[test]
    fn test_split_apply_group() {
        let (head, tail) = split("using foo apply (simp add: (bar)) done");
        assert_eq!(head, "using foo");
        assert_eq!(tail, vec!["apply (simp add: (bar))", "done"]);
    }

    #[test]
    fn test_split_apply_at_start() {
        let (head, tail) = split("apply simp apply auto");
        assert_eq!(head, "apply simp");
        assert_eq!(tail, vec!["apply auto"]);
        assert_eq!(split("apply (auto simp: x)").1, Vec::<String>::new());
    }

    #[test]
    fn test_split_helpers() {
        let (head, tail) = split("have \"P\" using foo by simp");
        assert_eq!(head, "have \"P\"");
        assert_eq!(tail, vec!["using foo by simp"]);
        let (head, tail) = split("using foo by simp");
        assert_eq!(head, "using foo");
        assert_eq!(tail, vec!["by simp"]);
        // proof lines keep their helpers
        assert_eq!(split("show ?thesis using foo proof -").0, "show ?thesis using foo proof -");
    }

    #[test]
    fn test_split_parameters() {
        let (head, tail) = split("lemma foo: assumes \"A\" shows \"B\"");
        assert_eq!(head, "lemma foo:");
        assert_eq!(tail, vec!["assumes \"A\" shows \"B\""]);
        let (head, tail) = split("assumes \"A\" shows \"B\"");
        assert_eq!(head, "assumes \"A\"");
        assert_eq!(tail, vec!["shows \"B\""]);
    }

    #[test]
    fn test_split_and() {
        let (head, tail) = split("fixes x :: nat and y :: nat");
        assert_eq!(head, "fixes x :: nat and");
        assert_eq!(tail, vec!["y :: nat"]);
        // inside a quoted term nothing happens
        assert_eq!(split("have \"a and b\"").0, "have \"a and b\"");
    }

    #[test]
    fn test_split_enders_and_starters() {
        let (head, tail) = split("obtain x where \"P x\"");
        assert_eq!(head, "obtain x where");
        assert_eq!(tail, vec!["\"P x\""]);
        let (head, tail) = split("\"f x = (if x then a else b)\"");
        assert_eq!(head, "\"f x = (if x");
        assert_eq!(tail, vec!["then a else b)\""]);
    }

    #[test]
    fn test_split_adjacent_clauses() {
        let (head, tail) = split("have \"A\" \"B\"");
        assert_eq!(head, "have \"A\" and");
        assert_eq!(tail, vec!["\"B\""]);
        // quoted instantiations stay together
        assert_eq!(split("note foo[of \"a\" \"b\"]").0, "note foo[of \"a\" \"b\"]");
    }

    #[test]
    fn test_split_conjuncts() {
        let mut pending = VecDeque::new();
        let head = split_conjuncts("assumes \"a=1\" \"b=2\" \"c\"".to_string(), &mut pending, false);
        assert_eq!(head, "assumes \"a=1\" and");
        assert_eq!(pending, queue(&["\"b=2\" and", "\"c\""]));
    }

    #[test]
    fn test_wrap_long_line() {
        let facts: Vec<String> = (0..20).map(|i| format!("fact_number_{i}")).collect();
        let line = format!("using {}", facts.join(" "));
        let mut pending = VecDeque::new();
        let head = wrap_long_line(line, &mut pending);
        assert!(display_len(&head) <= MAX_LINE_LENGTH);
        assert!(head.starts_with("using fact_number_0 "));
        let rest = pending.pop_front().unwrap();
        assert!(rest.starts_with("using "));
        assert_eq!(
            head.split_whitespace().count() + rest.split_whitespace().count(),
            facts.len() + 2
        );
    }

    #[test]
    fn test_wrap_keeps_instantiation_whole() {
        let long = "x".repeat(85);
        let line = format!("using {long} foo[of \"a b\" c] bar");
        let mut pending = VecDeque::new();
        let head = wrap_long_line(line, &mut pending);
        assert_eq!(head, format!("using {long}"));
        assert_eq!(pending, queue(&["using foo[of \"a b\" c] bar"]));
    }
}
