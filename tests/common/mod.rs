//! Common test utilities for integration tests
//!
//! This module contains the shared fixture helper used across integration
//! tests. Each test builds an isolated source tree in a temporary directory,
//! runs a full extraction over it, and asserts on the written artifacts.

use anyhow::Result;
use docsnip::config::{Config, OutputStructure};
use docsnip::tags::SnippetTags;
use std::path::PathBuf;
use tempfile::TempDir;

/// Isolated fixture tree with automatic cleanup
///
/// Holds a temporary directory with a `sources/` root for input files and an
/// `out/` directory for extraction output, allowing tests to run in parallel
/// without interfering with each other.
pub struct FixtureTree {
    dir: TempDir,
}

impl FixtureTree {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("sources"))?;
        Ok(Self { dir })
    }

    /// Writes a source file under the fixture root, creating parent
    /// directories as needed.
    pub fn write_source(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Writes a file directly under the temporary directory (outside the
    /// source root), e.g. a config file.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("sources")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// A default extraction configuration over this fixture tree.
    pub fn config(&self) -> Config {
        Config {
            root_directory: self.root(),
            snippet_output_directory: self.output(),
            file_extensions: vec![".ts".to_string(), ".py".to_string(), ".kt".to_string()],
            exclude: Vec::new(),
            snippet_tags: SnippetTags::default(),
            output_directory_structure: OutputStructure::ByLanguage,
            version: None,
            resolver: Default::default(),
        }
    }

    pub fn read_artifact(&self, relative: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.output().join(relative))?)
    }

    pub fn artifact_exists(&self, relative: &str) -> bool {
        self.output().join(relative).exists()
    }
}
