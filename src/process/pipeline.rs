//! Two-pass formatting pipeline
//!
//! Implements the main formatting pipeline:
//! - Pass 1: Rewrite every line over a work queue that splits may push to
//! - Pass 2: Indentation of the rewritten lines

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::format::classify::{
    contains_word, is_padded_starter, is_pass_through,
    BLANK_LINES_BEFORE_DECLARATION, MAX_BLANK_LINES,
};
use crate::format::tracker::find_word;
use crate::format::{
    annotate_auto, collapse_whitespace, detach_review_flag, elide_brackets, flatten_helpers,
    indent_lines, merge_helper, normalize_spacing, relocate_breakers, split_conjuncts, split_line,
    strip_solver_helpers, wrap_long_line, CommentBlock, QuoteState,
};
use crate::Result;

/// Per-file state of the rewrite pass
struct RewriteContext {
    /// Lines still to visit; splits push their tails to the front
    pending: VecDeque<String>,
    /// Rewritten lines; only the last one is ever modified in place
    output: Vec<String>,
    /// Whether the lines emitted so far leave a quoted term open
    quote: QuoteState,
    /// Consecutive blank lines seen since the last content line
    blank_run: usize,
    /// Open cartouche or `(* *)` block started by a pass-through line
    comment: CommentBlock,
    /// Whether the last emitted line was a comment or section header
    last_was_comment: bool,
}

impl RewriteContext {
    fn new(lines: Vec<String>) -> Self {
        Self {
            pending: lines.into(),
            output: Vec::new(),
            quote: QuoteState::default(),
            // Leading blank lines are dropped
            blank_run: MAX_BLANK_LINES,
            comment: CommentBlock::default(),
            last_was_comment: false,
        }
    }

    fn run(mut self) -> Vec<String> {
        while let Some(line) = self.pending.pop_front() {
            self.rewrite_line(&line);
        }
        while self.output.last().is_some_and(String::is_empty) {
            self.output.pop();
        }
        self.output
    }

    fn emit(&mut self, line: String, comment: bool) {
        self.output.push(line);
        self.last_was_comment = comment;
    }

    /// Pad the output with blank lines before a section header or declaration
    fn pad_before_statement(&mut self) {
        if self.output.is_empty() || self.last_was_comment {
            return;
        }
        let trailing = self
            .output
            .iter()
            .rev()
            .take_while(|line| line.is_empty())
            .count();
        for _ in trailing..BLANK_LINES_BEFORE_DECLARATION {
            self.emit(String::new(), false);
        }
    }

    fn rewrite_line(&mut self, raw: &str) {
        let line = detach_review_flag(&collapse_whitespace(raw));

        // Blank-line compression
        if line.is_empty() {
            if self.blank_run < MAX_BLANK_LINES {
                self.emit(String::new(), false);
            }
            self.blank_run += 1;
            return;
        }
        self.blank_run = 0;

        if self.comment.is_open() {
            self.comment.update(&line);
            self.emit(line, true);
            return;
        }

        if is_padded_starter(&line) {
            self.pad_before_statement();
            self.blank_run = MAX_BLANK_LINES;
        }

        if is_pass_through(&line) {
            self.comment.update(&line);
            self.quote.update(&line);
            // Section headers head what follows like a comment does
            self.emit(line, true);
            return;
        }

        let inside = self.quote.is_inside();
        let line = normalize_spacing(&line, inside);
        let line = relocate_breakers(line, &mut self.output, &mut self.pending, inside);
        let line = split_line(line, &mut self.pending, inside);

        let line = flatten_helpers(&line, inside);
        if merge_helper(&line, &mut self.output) {
            self.quote.update(&line);
            return;
        }

        let line = elide_brackets(&line, &mut self.pending, inside);
        let line = split_conjuncts(line, &mut self.pending, inside);
        let line = wrap_long_line(line, &mut self.pending);
        let line = annotate_auto(&line);
        let line = strip_solver_helpers(&line, inside);

        self.quote.update(&line);
        self.place(line);
    }

    /// Append the finished line, or merge a goal-restating `proof` into the
    /// `show` line before it
    fn place(&mut self, line: String) {
        if line.is_empty() {
            return;
        }
        if find_word(&line, "proof") == Some(0) {
            if let Some(last) = self.output.last_mut() {
                if contains_word(last, "show") {
                    last.push(' ');
                    last.push_str(&line);
                    self.last_was_comment = false;
                    return;
                }
            }
        }
        self.emit(line, false);
    }
}

/// Rewrite and indent a sequence of theory lines
#[must_use]
pub fn format_lines(lines: Vec<String>) -> Vec<String> {
    let clean = RewriteContext::new(lines).run();
    indent_lines(&clean)
}

/// Format theory source text, returning newline-terminated output
#[must_use]
pub fn format_source(source: &str) -> String {
    let lines = format_lines(source.lines().map(str::to_string).collect());
    let mut formatted = lines.join("\n");
    if !formatted.is_empty() {
        formatted.push('\n');
    }
    formatted
}

/// Format a theory file read from `input` and write the result to `output`
///
/// # Errors
///
/// Returns an error if reading the input or writing the output fails.
pub fn format_file<R: BufRead, W: Write>(input: R, output: &mut W) -> Result<()> {
    let lines = input.lines().collect::<std::io::Result<Vec<_>>>()?;
    for line in format_lines(lines) {
        output.write_all(line.as_bytes())?;
        output.write_all(b"\n")?;
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor};

    use super::*;
    use crate::format::REVIEW_FLAG;

    fn lines(source: &str) -> Vec<String> {
        format_lines(source.lines().map(str::to_string).collect())
    }

    #[test]
    fn test_assumes_split_into_clauses() {
        assert_eq!(
            lines("lemma foo:\nassumes \"a=1\" \"b=2\""),
            vec!["lemma foo:", "  assumes \"a=1\" and", "    \"b=2\""]
        );
    }

    #[test]
    fn test_terminal_method_on_own_line() {
        assert_eq!(lines("have x by (metis foo)"), vec!["have x", "  by (metis foo)"]);
    }

    #[test]
    fn test_apply_auto_flagged() {
        assert_eq!(lines("apply auto"), vec![format!("  apply auto {REVIEW_FLAG}")]);
        assert_eq!(lines("apply auto (* TODO *)"), vec!["  apply auto (* TODO *)"]);
    }

    #[test]
    fn test_solver_helpers_removed() {
        assert_eq!(lines("sledgehammer [bar]"), vec!["[bar]"]);
        assert!(lines("sledgehammer").is_empty());
    }

    #[test]
    fn test_blank_lines_compressed() {
        assert_eq!(
            lines("\n\ndefinition f\n\n\n\nwhere \"f = 0\"\n\n"),
            vec!["definition f", "", "where \"f = 0\""]
        );
    }

    #[test]
    fn test_declaration_padding() {
        let out = lines("theory T\nbegin\nlemma a: \"P\"\nby simp\ntext \\<open>B\\<close>\nlemma b: \"Q\"\nby simp");
        assert_eq!(
            out,
            vec![
                "theory T",
                "begin",
                "",
                "",
                "lemma a: \"P\"",
                "  by simp",
                "text \\<open>B\\<close>",
                "lemma b: \"Q\"",
                "  by simp",
            ]
        );
    }

    #[test]
    fn test_no_padding_after_section_header() {
        assert_eq!(
            lines("begin\nsection \\<open>Intro\\<close>\nlemma a: \"P\""),
            vec!["begin", "", "", "section \\<open>Intro\\<close>", "lemma a: \"P\""]
        );
        // A second header directly after the first is not padded either
        assert_eq!(
            lines("begin\nsection \\<open>A\\<close>\nsubsection \\<open>B\\<close>"),
            vec!["begin", "", "", "section \\<open>A\\<close>", "subsection \\<open>B\\<close>"]
        );
    }

    #[test]
    fn test_blank_after_declaration_dropped() {
        assert_eq!(
            lines("lemma a: \"P\"\n\nby simp"),
            vec!["lemma a: \"P\"", "  by simp"]
        );
    }

    #[test]
    fn test_helpers_merge() {
        assert_eq!(
            lines("have \"P\"\nusing foo\nusing bar\nby simp"),
            vec!["have \"P\"", "  using foo bar", "  by simp"]
        );
    }

    #[test]
    fn test_proof_joins_show() {
        assert_eq!(
            lines("show ?thesis\nproof -\nshow ?thesis by simp\nqed"),
            vec!["show ?thesis proof -", "  show ?thesis", "    by simp", "qed"]
        );
    }

    #[test]
    fn test_comment_block_passes_through() {
        assert_eq!(
            lines("text \\<open>Some  (prose)\nby hand\\<close>\nhave x"),
            vec!["text \\<open>Some (prose)", "by hand\\<close>", "have x"]
        );
    }

    #[test]
    fn test_format_source_idempotent() {
        let source = "lemma foo : assumes \"a=1\"and \"b=2\" shows \"a+b=3\" using foo by(simp)\n";
        let once = format_source(source);
        assert_eq!(format_source(&once), once);
    }

    #[test]
    fn test_format_file() {
        let input = "have x by simp\n";
        let reader = BufReader::new(Cursor::new(input.as_bytes()));
        let mut output = Vec::new();

        format_file(reader, &mut output).unwrap();

        let result = String::from_utf8(output).unwrap();
        assert_eq!(result, "have x\n  by simp\n");
    }
}
