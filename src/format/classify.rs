//! Keyword tables and line classification
//!
//! Every rule of the formatter is keyed off a small set of fixed keyword
//! tables. Each table is a [`Category`]; the match semantics (prefix, exact
//! or whole-word search) are chosen by the caller and never change per
//! keyword. Classification never fails: unmatched input simply belongs to
//! no category.

use crate::format::tracker::find_word;

/// Number of spaces per indentation level
pub const INDENT_WIDTH: usize = 2;

/// Maximum number of consecutive blank lines kept from the input
pub const MAX_BLANK_LINES: usize = 1;

/// Blank lines inserted before section headers and declarations
pub const BLANK_LINES_BEFORE_DECLARATION: usize = 2;

/// Line-length budget for justification lines
pub const MAX_LINE_LENGTH: usize = 100;

/// Length of a line as counted against [`MAX_LINE_LENGTH`]
#[must_use]
pub fn display_len(line: &str) -> usize {
    line.chars().count()
}

/// Inline comment appended to lines that call the generic `auto` tactic
pub const REVIEW_FLAG: &str = "text \\<open> TODO: Fix! \\<close>";

/// Marker that suppresses the review flag
pub const TODO_MARKER: &str = "TODO";

/// Prover hints that must keep their parentheses
pub const PROTECTED_PROVERS: &[&str] = &["verit", "full_types"];

const SECTION_HEADERS: &[&str] = &["section", "subsection", "subsubsection"];
const COMMENTS: &[&str] = &["text", "(*"];
const DECLARATIONS: &[&str] = &["lemma", "theorem", "corollary", "proposition"];
const TOP_LEVEL: &[&str] = &[
    "fun",
    "definition",
    "function",
    "datatype",
    "type_synonym",
    "theory",
    "begin",
    "sledgehammer_params",
    "abbreviation",
    "inductive",
    "locale",
    "primrec",
    "record",
    "end",
];
const PARAMETERS: &[&str] = &["fixes", "assumes", "shows"];
const STEPS: &[&str] = &[
    "then", "have", "also", "finally", "hence", "thus", "moreover", "case", "show", "obtain",
    "assume",
];
const PROOF_HELPERS: &[&str] = &["using", "unfolding"];
const SOLVER_HELPERS: &[&str] = &["sledgehammer", "nitpick", "quickcheck", "try0", "try"];
const LINE_ENDERS: &[&str] = &["of", "where", "|"];
const LINE_STARTERS: &[&str] = &["then", "else"];
const IMPORTS: &[&str] = &["imports"];
const TACTICS: &[&str] = &["by", "apply"];

/// A keyword table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// `section` and friends: passed through verbatim, padded with blank lines
    SectionHeader,
    /// Document or source comments: passed through verbatim
    Comment,
    /// `lemma`/`theorem`-like statements: padded with blank lines
    Declaration,
    /// Other top-level commands that reset indentation
    TopLevel,
    /// `fixes`/`assumes`/`shows` clauses of a statement
    Parameter,
    /// Proof-step keywords
    Step,
    /// Justification keywords (`using`, `unfolding`)
    ProofHelper,
    /// Exploratory tactics that never stay in a finished proof
    SolverHelper,
    /// Keywords that end a line (`of`, `where`, `|`)
    LineEnder,
    /// Keywords that start a continuation line (`then`, `else`)
    LineStarter,
    /// `imports` clause of a theory header
    Imports,
    /// Terminal and applicative tactic keywords (`by`, `apply`)
    Tactic,
}

impl Category {
    /// The keyword table for this category, in match order
    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::SectionHeader => SECTION_HEADERS,
            Category::Comment => COMMENTS,
            Category::Declaration => DECLARATIONS,
            Category::TopLevel => TOP_LEVEL,
            Category::Parameter => PARAMETERS,
            Category::Step => STEPS,
            Category::ProofHelper => PROOF_HELPERS,
            Category::SolverHelper => SOLVER_HELPERS,
            Category::LineEnder => LINE_ENDERS,
            Category::LineStarter => LINE_STARTERS,
            Category::Imports => IMPORTS,
            Category::Tactic => TACTICS,
        }
    }

    /// First keyword of the table that `line` starts with (plain prefix match)
    #[must_use]
    pub fn prefix_of(self, line: &str) -> Option<&'static str> {
        self.keywords().iter().copied().find(|kw| line.starts_with(kw))
    }

    /// Whether `line` starts with any keyword of the table
    #[must_use]
    pub fn starts(self, line: &str) -> bool {
        self.prefix_of(line).is_some()
    }

    /// First keyword of the table that `line` starts with as a whole word
    #[must_use]
    pub fn leading_word(self, line: &str) -> Option<&'static str> {
        self.keywords()
            .iter()
            .copied()
            .find(|kw| find_word(line, kw) == Some(0))
    }
}

/// Lines copied verbatim: section headers and comments
#[must_use]
pub fn is_pass_through(line: &str) -> bool {
    Category::SectionHeader.starts(line) || Category::Comment.starts(line)
}

/// Lines that receive blank-line padding before them
#[must_use]
pub fn is_padded_starter(line: &str) -> bool {
    Category::SectionHeader.starts(line) || Category::Declaration.starts(line)
}

/// Lines that reset the indentation level to zero
#[must_use]
pub fn is_top_level(line: &str) -> bool {
    Category::Declaration.starts(line)
        || Category::SectionHeader.starts(line)
        || Category::TopLevel.starts(line)
}

/// Whether the line contains `keyword` as a whole word anywhere
#[must_use]
pub fn contains_word(line: &str, keyword: &str) -> bool {
    find_word(line, keyword).is_some()
}

/// Whether the line is exactly `keyword`
#[must_use]
pub fn is_exactly(line: &str, keyword: &str) -> bool {
    line == keyword
}
