//! docsnip library
//!
//! This library extracts named, tagged regions of source text from a tree of
//! files and republishes them as standalone artifacts grouped by language, so
//! documentation can embed live code samples that originate from executable
//! test files. The primary interface is the docsnip binary, but the library
//! can be used programmatically.
//!
//! ## Public API
//!
//! - [`SnippetExtractor`] - runs a full extraction over a configured tree
//! - [`SnippetResolver`] - resolves a snippet name into per-language content
//!   at documentation-render time, with caching
//! - [`format_snippet`] - display formatting for resolved snippet content

pub mod config;
pub mod extractor;
pub mod language;
pub mod prepend;
pub mod resolver;
pub mod tags;
pub mod typegen;
pub mod walker;

pub use config::{Config, OutputStructure};
pub use resolver::{format_snippet, FormatOptions, SnippetResolver, SnippetResult};
pub use walker::SnippetExtractor;
