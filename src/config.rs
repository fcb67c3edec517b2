//! Configuration management for thyprettier.
//!
//! This module provides the [`Config`] struct which controls which files are
//! formatted and where the results go. The formatting rules themselves are
//! fixed. Configuration can be loaded from:
//! - TOML files (`thyprettier.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from the path
//! being formatted up to the filesystem root, plus the user's home directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoContext, Result};

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["thyprettier.toml"];

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    // Fallback for Windows
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

// Serde default functions
fn default_suffix() -> String {
    "-clean".to_string()
}
fn default_extensions() -> Vec<String> {
    vec!["thy".to_string()]
}
fn default_true() -> bool {
    true
}

/// Main configuration struct for thyprettier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Marker inserted before the extension of the output file (default: "-clean")
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// File extensions treated as theory files (default: ["thy"])
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns of paths to skip
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Descend into subdirectories (default: true)
    #[serde(default = "default_true")]
    pub recursive: bool,
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub suffix: Option<String>,
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub recursive: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            suffix: default_suffix(),
            extensions: default_extensions(),
            exclude: Vec::new(),
            recursive: true,
        }
    }
}

impl Config {
    /// Validate configuration values
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.suffix.is_empty() {
            return Some("suffix must not be empty".to_string());
        }
        if self.suffix.contains(['/', '\\']) {
            return Some(format!(
                "suffix {:?} must not contain a path separator",
                self.suffix
            ));
        }
        if self.extensions.is_empty() {
            return Some("extensions must list at least one extension".to_string());
        }
        if let Some(ext) = self.extensions.iter().find(|ext| ext.is_empty()) {
            return Some(format!("extension {ext:?} is empty"));
        }
        None
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).for_path("read", path)?;
        let partial: PartialConfig = toml::from_str(&contents)?;
        let mut config = Self::default();
        config.apply_partial(&partial);
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: &PartialConfig) {
        if let Some(v) = &partial.suffix {
            self.suffix.clone_from(v);
        }
        if let Some(v) = &partial.extensions {
            self.extensions = v
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();
        }
        if let Some(v) = partial.recursive {
            self.recursive = v;
        }
        // Exclude patterns accumulate across files
        for pattern in &partial.exclude {
            if !self.exclude.contains(pattern) {
                self.exclude.push(pattern.clone());
            }
        }
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the path's directory up to the root, then adds home directory config.
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        // Add home directory config first (lowest priority)
        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            // Path doesn't exist, use current directory
            std::env::current_dir().ok()
        };

        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Root first, so more specific files come later
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Returns default config if no files found.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in &Self::discover_config_files(start_path) {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<PartialConfig>(&contents) {
                    Ok(partial) => config.apply_partial(&partial),
                    Err(e) => eprintln!("Warning: failed to parse {}: {e}", path.display()),
                },
                Err(e) => eprintln!("Warning: failed to read {}: {e}", path.display()),
            }
        }
        config
    }

    /// Whether `path` has one of the configured theory extensions
    #[must_use]
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.suffix, "-clean");
        assert_eq!(config.extensions, vec!["thy"]);
        assert!(config.exclude.is_empty());
        assert!(config.recursive);
    }

    #[test]
    fn test_config_apply_partial() {
        let mut base = Config::default();
        let partial = PartialConfig {
            suffix: Some("-fmt".to_string()),
            extensions: Some(vec![".thy".to_string(), "ML".to_string()]),
            ..Default::default()
        };

        base.apply_partial(&partial);
        assert_eq!(base.suffix, "-fmt");
        assert_eq!(base.extensions, vec!["thy", "ML"]);
        // Other fields should remain at defaults
        assert!(base.recursive);
    }

    #[test]
    fn test_config_apply_partial_preserves_unset() {
        let mut base = Config {
            recursive: false,
            ..Default::default()
        };
        let partial = PartialConfig {
            suffix: Some("-out".to_string()),
            ..Default::default()
        };

        base.apply_partial(&partial);
        assert!(!base.recursive);
        assert_eq!(base.suffix, "-out");
    }

    #[test]
    fn test_config_apply_partial_exclude_accumulates() {
        let mut base = Config::default();
        base.exclude.push("**/Old/*".to_string());

        let partial = PartialConfig {
            exclude: vec!["**/Old/*".to_string(), "*Scratch.thy".to_string()],
            ..Default::default()
        };

        base.apply_partial(&partial);
        assert_eq!(base.exclude, vec!["**/Old/*", "*Scratch.thy"]);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "suffix = \"-pretty\"\nrecursive = false\nexclude = [\"*Draft.thy\"]").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.suffix, "-pretty");
        assert!(!config.recursive);
        assert_eq!(config.exclude, vec!["*Draft.thy"]);
        assert_eq!(config.extensions, vec!["thy"]);
    }

    #[test]
    fn test_from_toml_file_rejects_bad_types() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "recursive = \"yes\"").unwrap();
        assert!(Config::from_toml_file(file.path()).is_err());
    }

    #[test]
    fn test_discover_config_files_in_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("thyprettier.toml"), "suffix = \"-outer\"\n").unwrap();
        std::fs::write(nested.join("thyprettier.toml"), "recursive = false\n").unwrap();

        let files = Config::discover_config_files(&nested);
        let outer = files.iter().position(|p| p == &dir.path().join("thyprettier.toml"));
        let inner = files.iter().position(|p| p == &nested.join("thyprettier.toml"));
        assert!(outer.unwrap() < inner.unwrap());

        let config = Config::from_discovered_files(&nested);
        assert_eq!(config.suffix, "-outer");
        assert!(!config.recursive);
    }

    #[test]
    fn test_matches_extension() {
        let config = Config::default();
        assert!(config.matches_extension(Path::new("Foo.thy")));
        assert!(!config.matches_extension(Path::new("Foo.ML")));
        assert!(!config.matches_extension(Path::new("thy")));
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(
            config.validate().is_none(),
            "Default config should be valid"
        );
    }

    #[test]
    fn test_validate_empty_suffix() {
        let config = Config {
            suffix: String::new(),
            ..Default::default()
        };
        assert!(config.validate().unwrap().contains("suffix"));
    }

    #[test]
    fn test_validate_suffix_with_separator() {
        let config = Config {
            suffix: "/clean".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap().contains("path separator"));
    }

    #[test]
    fn test_validate_no_extensions() {
        let config = Config {
            extensions: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().unwrap().contains("extensions"));
    }
}
