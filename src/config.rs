use crate::resolver::ResolverConfig;
use crate::tags::SnippetTags;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output tree layouts named by the configuration surface.
///
/// Only `ByLanguage` has defined behavior; the other modes are recognized
/// vocabulary (so the CLI can validate them) but are rejected when an
/// extraction run starts instead of silently defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum OutputStructure {
    #[serde(rename = "flat")]
    #[value(name = "flat")]
    Flat,
    #[serde(rename = "match")]
    #[value(name = "match")]
    Match,
    #[serde(rename = "organized")]
    #[value(name = "organized")]
    Organized,
    #[default]
    #[serde(rename = "byLanguage")]
    #[value(name = "byLanguage")]
    ByLanguage,
}

impl OutputStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStructure::Flat => "flat",
            OutputStructure::Match => "match",
            OutputStructure::Organized => "organized",
            OutputStructure::ByLanguage => "byLanguage",
        }
    }
}

/// Configuration for one extraction run.
///
/// Deserialized from the TOML file named by `--config`. Immutable for the
/// duration of the run.
///
/// # Example
///
/// ```toml
/// root_directory = "tests"
/// snippet_output_directory = "public/snippets"
/// file_extensions = [".ts", ".py", ".kt"]
/// exclude = ["fixture_helpers.test.ts"]
/// version = "v1"
///
/// [snippet_tags]
/// start = ":snippet-start:"
/// end = ":snippet-end:"
///
/// [resolver]
/// base_url = "http://localhost:3000/snippets"
/// languages = ["python", "kotlin"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory tree to scan for tagged snippets
    pub root_directory: PathBuf,

    /// Root of the written snippet artifact tree
    pub snippet_output_directory: PathBuf,

    /// File extensions (with leading dot) eligible for extraction
    pub file_extensions: Vec<String>,

    /// Basenames of files to skip during extraction (they still contribute
    /// names to the generated type artifact)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// The four tag markers
    #[serde(default)]
    pub snippet_tags: SnippetTags,

    /// Output tree layout; only "byLanguage" is implemented
    #[serde(default)]
    pub output_directory_structure: OutputStructure,

    /// Optional version path segment inserted between the output root and
    /// the language directories
    #[serde(default)]
    pub version: Option<String>,

    /// Runtime snippet resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// Relative `root_directory` and `snippet_output_directory` paths are
    /// resolved against the config file's parent directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.validate()?;

        if let Some(base) = path.parent() {
            config.root_directory = resolve_against(base, &config.root_directory);
            config.snippet_output_directory =
                resolve_against(base, &config.snippet_output_directory);
        }

        Ok(config)
    }

    /// Validate the configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.root_directory.as_os_str().is_empty() {
            bail!("root_directory is required");
        }
        if self.snippet_output_directory.as_os_str().is_empty() {
            bail!("snippet_output_directory is required");
        }
        if self.file_extensions.is_empty() {
            bail!("file_extensions must not be empty");
        }
        for extension in &self.file_extensions {
            if !extension.starts_with('.') {
                bail!(
                    "File extension '{}' must start with '.' (e.g. \".ts\")",
                    extension
                );
            }
        }
        if self.snippet_tags.start.is_empty() || self.snippet_tags.end.is_empty() {
            bail!("snippet_tags must include start and end tags");
        }
        Ok(())
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
