//! Command-line interface for thyprettier.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Theory files or directories to format (`-` reads stdin)
    pub inputs: Vec<PathBuf>,

    /// Output to stdout instead of writing clean files
    pub stdout: bool,

    /// Marker inserted before the extension of the output file
    pub suffix: Option<String>,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Recursive directory processing (`None` keeps the configured value)
    pub recursive: Option<bool>,

    /// Silent mode (no output)
    pub silent: bool,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Theory file extensions (replace the configured list when given)
    pub extensions: Vec<String>,

    /// Enable debug output
    pub debug: bool,
}

impl CliArgs {
    /// Whether input comes from stdin
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.inputs.is_empty() || self.inputs.iter().all(|p| p.as_os_str() == "-")
    }
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("thyprettier")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Auto-formatter for Isabelle theory files")
        .arg(
            Arg::new("inputs")
                .help("Theory files or directories to format ('-' or nothing reads stdin)")
                .value_name("FILE")
                .num_args(1..)
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("stdout")
                .short('s')
                .long("stdout")
                .help("Print formatted output instead of writing clean files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("suffix")
                .long("suffix")
                .help("Marker inserted before the extension of each output file [default: -clean]")
                .value_name("SUFFIX")
                .allow_hyphen_values(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Recursively format directories (default)")
                .action(ArgAction::SetTrue)
                .conflicts_with("no-recursive"),
        )
        .arg(
            Arg::new("no-recursive")
                .long("no-recursive")
                .help("Only format theory files directly inside given directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("extension")
                .short('x')
                .long("extension")
                .help("Theory file extension (can be repeated) [default: thy]")
                .value_name("EXT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output (shows config and skipped files)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Silent mode (no output, for editor integration)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0=auto, 1=sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
///
/// # Errors
///
/// Returns the clap error instead of exiting when the arguments are invalid.
pub fn parse_args_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Ok(args_from_matches(&build_cli().try_get_matches_from(args)?))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    let recursive = if matches.get_flag("recursive") {
        Some(true)
    } else if matches.get_flag("no-recursive") {
        Some(false)
    } else {
        None
    };

    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        stdout: matches.get_flag("stdout"),
        suffix: matches.get_one::<String>("suffix").cloned(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        recursive,
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        extensions: matches
            .get_many::<String>("extension")
            .map(|vals| vals.map(|ext| ext.trim_start_matches('.').to_string()).collect())
            .unwrap_or_default(),
        debug: matches.get_flag("debug"),
        silent: matches.get_flag("silent"),
        jobs: matches.get_one::<usize>("jobs").copied(),
    }
}
