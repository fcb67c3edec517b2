/// `TheoryIndenter` - Level-based indentation for rewritten theory lines
///
/// A single `level` is carried from line to line. Each line is classified
/// to pick the level applied to it and the level carried forward; the
/// carried level is then shifted by the line's bracket delta and by any
/// quoted term the line opens or closes. When a multi-line quoted term
/// closes, the lines it spans are squashed to at most two widths.
use crate::format::classify::{
    contains_word, is_exactly, is_pass_through, is_top_level, Category, INDENT_WIDTH,
};
use crate::format::tracker::{bracket_delta, CommentBlock, QuoteState};

/// `TheoryIndenter` tracks the carried level and quoted-term spans
#[derive(Debug, Default)]
pub struct TheoryIndenter {
    /// Level carried to the next line
    level: isize,
    /// Whether the previous lines left a quoted term open
    quote: QuoteState,
    /// Open cartouche or `(* *)` block started by a comment line
    comment: CommentBlock,
    /// Index of the line that opened the current quoted term
    span_start: Option<usize>,
    /// Applied level of every line so far, `None` for blank lines
    levels: Vec<Option<usize>>,
}

impl TheoryIndenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applied and carried level for a line, before bracket and quote
    /// adjustments
    fn target(&self, line: &str, previous: &str) -> (isize, isize) {
        let cur = self.level;
        let inside = self.quote.is_inside();

        if line.is_empty() {
            return (0, cur);
        }
        if self.comment.is_open() {
            return (cur, cur);
        }
        if is_top_level(line) {
            return (0, 0);
        }
        if Category::Comment.starts(line) {
            return (cur, cur);
        }
        if Category::Parameter.starts(line) {
            return if line.ends_with("and") { (1, 2) } else { (1, 1) };
        }
        if contains_word(line, "proof") {
            return if contains_word(line, "show") || contains_word(line, "have") || inside {
                (cur, cur + 1)
            } else {
                (0, 1)
            };
        }
        if Category::Imports.starts(line) {
            return (1, 0);
        }
        if is_exactly(line, "qed") {
            return (cur - 1, cur - 1);
        }
        if Category::Tactic.starts(line) || Category::ProofHelper.starts(line) {
            return (cur + 1, cur);
        }
        if is_exactly(line, "next") {
            return (cur - 1, cur);
        }
        if contains_word(previous, "obtain") {
            return (cur + 1, cur);
        }
        if !inside && Category::Step.starts(line) {
            return (cur, cur);
        }
        if inside {
            return (cur + 1, cur);
        }
        (cur, cur)
    }

    /// Process one line and record its applied level
    ///
    /// # Arguments
    /// * `line` - The trimmed line
    /// * `previous` - The trimmed line before it (empty for the first line)
    pub fn process_line(&mut self, line: &str, previous: &str) {
        let in_block = self.comment.is_open();
        let (applied, mut carried) = self.target(line, previous);
        let index = self.levels.len();
        let mut closes_span = false;

        if in_block {
            // Prose inside an open comment block is never counted
            self.comment.update(line);
        } else {
            if is_pass_through(line) {
                self.comment.update(line);
            }
            carried += bracket_delta(line);
            let was_inside = self.quote.is_inside();
            if self.quote.update(line) {
                if was_inside {
                    carried -= 1;
                    closes_span = true;
                } else {
                    carried += 1;
                    self.span_start = Some(index);
                }
            }
        }

        self.level = carried.max(0);
        self.levels.push(if line.is_empty() {
            None
        } else {
            Some(usize::try_from(applied).unwrap_or(0))
        });

        if closes_span {
            if let Some(start) = self.span_start.take() {
                self.squash(start, index);
            }
        }
    }

    /// Remap the widths of lines `start..=end` to the smallest width and one
    /// level above it
    fn squash(&mut self, start: usize, end: usize) {
        let span = &mut self.levels[start..=end];
        let mut widths: Vec<usize> = span.iter().flatten().copied().collect();
        widths.sort_unstable();
        widths.dedup();
        let Some(&base) = widths.first() else {
            return;
        };
        for level in span.iter_mut().flatten() {
            if *level != base {
                *level = base + 1;
            }
        }
    }

    /// Applied level of every processed line, `None` for blank lines
    #[must_use]
    pub fn levels(&self) -> &[Option<usize>] {
        &self.levels
    }

    /// Current carried level
    #[must_use]
    pub fn current_level(&self) -> usize {
        usize::try_from(self.level).unwrap_or(0)
    }
}

/// Indent a sequence of rewritten lines
#[must_use]
pub fn indent_lines(lines: &[String]) -> Vec<String> {
    let mut indenter = TheoryIndenter::new();
    let mut previous = "";
    for line in lines {
        let line = line.trim();
        indenter.process_line(line, previous);
        previous = line;
    }

    lines
        .iter()
        .zip(indenter.levels())
        .map(|(line, level)| match level {
            Some(level) => format!("{}{}", " ".repeat(level * INDENT_WIDTH), line.trim()),
            None => String::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indent(lines: &[&str]) -> Vec<String> {
        let owned: Vec<String> = lines.iter().map(|s| (*s).to_string()).collect();
        indent_lines(&owned)
    }

    #[test]
    fn test_assumes_clauses() {
        assert_eq!(
            indent(&["lemma foo:", "assumes \"a=1\" and", "\"b=2\""]),
            vec!["lemma foo:", "  assumes \"a=1\" and", "    \"b=2\""]
        );
    }

    #[test]
    fn test_terminal_tactic_one_deeper() {
        assert_eq!(indent(&["have x", "by (metis foo)"]), vec!["have x", "  by (metis foo)"]);
    }

    #[test]
    fn test_structured_proof() {
        assert_eq!(
            indent(&[
                "lemma f: \"P\"",
                "proof -",
                "have \"Q\"",
                "by simp",
                "show ?thesis",
                "by simp",
                "qed",
            ]),
            vec![
                "lemma f: \"P\"",
                "proof -",
                "  have \"Q\"",
                "    by simp",
                "  show ?thesis",
                "    by simp",
                "qed",
            ]
        );
    }

    #[test]
    fn test_nested_proof_and_next() {
        assert_eq!(
            indent(&[
                "proof (induct xs)",
                "case Nil",
                "show ?case",
                "by simp",
                "next",
                "case (Cons x xs)",
                "show ?case proof -",
                "show ?thesis",
                "by simp",
                "qed",
                "qed",
            ]),
            vec![
                "proof (induct xs)",
                "  case Nil",
                "  show ?case",
                "    by simp",
                "next",
                "  case (Cons x xs)",
                "  show ?case proof -",
                "    show ?thesis",
                "      by simp",
                "  qed",
                "qed",
            ]
        );
    }

    #[test]
    fn test_squash_multiline_term() {
        let out = indent(&[
            "have \"A \\<Longrightarrow>",
            "(B \\<and>",
            "(C \\<or>",
            "D))\"",
            "by simp",
        ]);
        assert_eq!(
            out,
            vec![
                "have \"A \\<Longrightarrow>",
                "  (B \\<and>",
                "  (C \\<or>",
                "  D))\"",
                "  by simp",
            ]
        );
    }

    #[test]
    fn test_obtain_continuation() {
        assert_eq!(
            indent(&["obtain x where", "\"P x\"", "by auto"]),
            vec!["obtain x where", "  \"P x\"", "  by auto"]
        );
    }

    #[test]
    fn test_theory_header() {
        assert_eq!(
            indent(&["theory Foo", "imports Main", "begin"]),
            vec!["theory Foo", "  imports Main", "begin"]
        );
    }

    #[test]
    fn test_comment_block_keeps_level() {
        assert_eq!(
            indent(&[
                "proof -",
                "text \\<open>Some",
                "prose (with \"quote",
                "\\<close>",
                "show ?thesis",
            ]),
            vec![
                "proof -",
                "  text \\<open>Some",
                "  prose (with \"quote",
                "  \\<close>",
                "  show ?thesis",
            ]
        );
    }

    #[test]
    fn test_comment_line_brackets_carry() {
        assert_eq!(
            indent(&["proof -", "text \\<open>Case (1: the base\\<close>", "have x"]),
            vec!["proof -", "  text \\<open>Case (1: the base\\<close>", "    have x"]
        );
    }

    #[test]
    fn test_comment_line_quote_toggles() {
        let mut indenter = TheoryIndenter::new();
        indenter.process_line("proof -", "");
        indenter.process_line("text \\<open>odd \" here\\<close>", "proof -");
        // The quote opens a span, which counts as one bracket
        assert_eq!(indenter.current_level(), 2);
        indenter.process_line("have x", "text \\<open>odd \" here\\<close>");
        assert_eq!(indenter.levels()[2], Some(3));
    }

    #[test]
    fn test_level_never_negative() {
        assert_eq!(indent(&["qed", "x"]), vec!["qed", "x"]);
        assert_eq!(indent(&["a)", "b"]), vec!["a)", "b"]);
    }

    #[test]
    fn test_blank_lines_empty() {
        assert_eq!(indent(&["proof -", "", "have x"]), vec!["proof -", "", "  have x"]);
    }

    #[test]
    fn test_current_level_tracks_brackets() {
        let mut indenter = TheoryIndenter::new();
        indenter.process_line("have \"f (a [b", "");
        assert_eq!(indenter.current_level(), 3);
        indenter.process_line("c])\"", "have \"f (a [b");
        assert_eq!(indenter.current_level(), 0);
        assert_eq!(indenter.levels(), &[Some(0), Some(1)]);
    }
}
