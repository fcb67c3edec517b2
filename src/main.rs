//! thyprettier - Auto-formatter for Isabelle theory files

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glob::Pattern;
use rayon::prelude::*;
use thyprettier::process::{clean_path, format_file, is_clean_output};
use thyprettier::error::IoContext;
use thyprettier::{build_cli, parse_args, CliArgs, Config, Result};
use walkdir::WalkDir;

/// Default maximum file size in bytes (100 MB)
/// Files larger than this are skipped to prevent memory exhaustion
const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// A theory file together with the configuration that governs it
struct Job {
    path: PathBuf,
    config: Arc<Config>,
}

fn main() -> Result<()> {
    let args = parse_args();

    // No inputs on an interactive terminal: nothing to read, show help
    if args.inputs.is_empty() && io::stdin().is_terminal() {
        build_cli().print_help()?;
        return Ok(());
    }

    if args.reads_stdin() {
        // Config only governs file I/O here, but a broken one is still an error
        build_config(&args, None)?;
        return process_stdin(&args);
    }

    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                eprintln!("Warning: failed to configure thread pool: {e}");
            }
        }
    }

    let jobs = collect_jobs(&args)?;

    if jobs.is_empty() {
        if !args.silent {
            eprintln!("No theory files found to format.");
        }
        return Ok(());
    }

    if args.stdout || args.jobs == Some(1) {
        process_files_sequential(&jobs, &args);
    } else {
        process_files_parallel(&jobs, &args);
    }

    Ok(())
}

/// Build configuration from CLI args and config files
///
/// An explicit `--config` file wins over discovery. Otherwise config files
/// are discovered from `for_path` (or the current directory) upwards.
fn build_config(args: &CliArgs, for_path: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        if args.debug {
            eprintln!(
                "[DEBUG] Using explicit config file: {}",
                config_path.display()
            );
        }
        Config::from_toml_file(config_path)?
    } else {
        let start = match for_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };
        if args.debug {
            let discovered = Config::discover_config_files(&start);
            if discovered.is_empty() {
                eprintln!("[DEBUG] No config files discovered for: {}", start.display());
            } else {
                eprintln!("[DEBUG] Discovered config files for {}:", start.display());
                for f in &discovered {
                    eprintln!("[DEBUG]   - {}", f.display());
                }
            }
        }
        Config::from_discovered_files(&start)
    };

    // Override with CLI arguments
    if let Some(suffix) = &args.suffix {
        config.suffix.clone_from(suffix);
    }
    if !args.extensions.is_empty() {
        config.extensions.clone_from(&args.extensions);
    }
    if let Some(recursive) = args.recursive {
        config.recursive = recursive;
    }
    for pattern in &args.exclude {
        if !config.exclude.contains(pattern) {
            config.exclude.push(pattern.clone());
        }
    }

    if args.debug {
        print_config_debug(&config);
    }

    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }

    Ok(config)
}

/// Print configuration values in debug mode
fn print_config_debug(config: &Config) {
    eprintln!("[DEBUG] Configuration:");
    eprintln!("[DEBUG]   suffix: {}", config.suffix);
    eprintln!("[DEBUG]   extensions: {:?}", config.extensions);
    eprintln!("[DEBUG]   recursive: {}", config.recursive);
    if !config.exclude.is_empty() {
        eprintln!("[DEBUG]   exclude: {:?}", config.exclude);
    }
}

/// Collect every theory file under the inputs, each with its configuration
fn collect_jobs(args: &CliArgs) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    for input in &args.inputs {
        if !input.exists() {
            eprintln!("Error formatting {}: no such file or directory", input.display());
            continue;
        }
        let config = Arc::new(build_config(args, Some(input))?);
        let exclude_patterns: Vec<Pattern> = config
            .exclude
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    eprintln!("Warning: ignoring exclude pattern {p:?}: {e}");
                    None
                }
            })
            .collect();

        let accept = |path: &Path, explicit: bool| {
            if is_excluded(path, &exclude_patterns) {
                return false;
            }
            if is_clean_output(path, &config.suffix) {
                if args.debug {
                    eprintln!("[DEBUG] Skipping clean output: {}", path.display());
                }
                return false;
            }
            explicit || config.matches_extension(path)
        };

        if input.is_file() {
            // Files named on the command line are formatted whatever their extension
            if accept(input.as_path(), true) {
                jobs.push(Job {
                    path: input.clone(),
                    config: Arc::clone(&config),
                });
            }
        } else if config.recursive {
            // WalkDir reports symlink loops as errors, which are skipped
            for entry in WalkDir::new(input)
                .follow_links(true)
                .max_depth(256)
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                let path = entry.path();
                if path.is_file() && accept(path, false) {
                    jobs.push(Job {
                        path: path.to_path_buf(),
                        config: Arc::clone(&config),
                    });
                }
            }
        } else if let Ok(entries) = std::fs::read_dir(input) {
            for entry in entries.filter_map(std::result::Result::ok) {
                let path = entry.path();
                if path.is_file() && accept(path.as_path(), false) {
                    jobs.push(Job {
                        path,
                        config: Arc::clone(&config),
                    });
                }
            }
        }
    }

    jobs.sort_by(|a, b| a.path.cmp(&b.path));
    jobs.dedup_by(|a, b| a.path == b.path);
    Ok(jobs)
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if pattern.matches(&path_str) {
            return true;
        }

        if let Some(file_name) = path.file_name() {
            if pattern.matches(&file_name.to_string_lossy()) {
                return true;
            }
        }

        // Directory patterns match any component
        for component in path.components() {
            if let std::path::Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}

/// Success and error counts shared by the sequential and parallel paths
#[derive(Default)]
struct Summary {
    success: AtomicUsize,
    errors: AtomicUsize,
}

impl Summary {
    fn record(&self, job: &Job, result: Result<()>) {
        match result {
            Ok(()) => {
                self.success.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                eprintln!("Error formatting {}: {}", job.path.display(), e);
            }
        }
    }

    fn line(&self) -> String {
        let success = self.success.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        if errors == 0 {
            format!("Formatted {success} files successfully.")
        } else {
            format!("Formatted {success} files, {errors} errors.")
        }
    }

    fn report(&self, silent: bool) {
        if !silent {
            eprintln!("{}", self.line());
        }
    }
}

/// Process files sequentially (for stdout output)
fn process_files_sequential(jobs: &[Job], args: &CliArgs) -> Summary {
    let summary = Summary::default();
    for job in jobs {
        summary.record(job, process_single_file(job, args));
    }
    summary.report(args.silent);
    summary
}

/// Process files in parallel using Rayon
fn process_files_parallel(jobs: &[Job], args: &CliArgs) -> Summary {
    let summary = Summary::default();
    jobs.par_iter()
        .for_each(|job| summary.record(job, process_single_file(job, args)));
    summary.report(args.silent);
    summary
}

/// Format one theory file into its clean sibling (or stdout)
fn process_single_file(job: &Job, args: &CliArgs) -> Result<()> {
    let path = &job.path;

    // Check file size BEFORE reading to prevent memory exhaustion
    let file_size = std::fs::metadata(path).for_path("stat", path)?.len();
    if file_size > DEFAULT_MAX_FILE_SIZE {
        if !args.silent {
            eprintln!(
                "Skipping {} ({} MB exceeds limit of {} MB)",
                path.display(),
                file_size / (1024 * 1024),
                DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
            );
        }
        return Ok(());
    }

    let mut contents = Vec::new();
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut contents))
        .for_path("read", path)?;
    let reader = BufReader::new(Cursor::new(contents));

    if args.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        format_file(reader, &mut handle)?;
        return Ok(());
    }

    let target = clean_path(path, &job.config.suffix);
    if !args.silent {
        eprintln!("Formatting: {} -> {}", path.display(), target.display());
    }
    let mut writer = BufWriter::new(File::create(&target).for_path("create", &target)?);
    format_file(reader, &mut writer)?;
    Ok(())
}

/// Process input from stdin, output to stdout
fn process_stdin(args: &CliArgs) -> Result<()> {
    let mut contents = Vec::new();
    io::stdin().read_to_end(&mut contents)?;

    #[allow(clippy::cast_possible_truncation)]
    let size = contents.len() as u64;
    if size > DEFAULT_MAX_FILE_SIZE {
        anyhow::bail!(
            "stdin input too large ({} MB exceeds limit of {} MB)",
            size / (1024 * 1024),
            DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
        );
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    format_file(BufReader::new(Cursor::new(contents)), &mut handle)?;
    handle.flush()?;

    if !args.silent {
        eprintln!("Formatted stdin successfully.");
    }

    Ok(())
}
