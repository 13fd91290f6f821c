use crate::config::{Config, OutputStructure};
use crate::extractor::{self, ProcessedNames};
use crate::language::{directory_for_language, language_from_extension};
use crate::prepend;
use crate::tags::name_after;
use crate::typegen;
use anyhow::{bail, Context, Result};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Dependency and build directories never entered by the walk.
const SKIPPED_DIRECTORIES: [&str; 4] = ["node_modules", "dist", "target", ".git"];

/// Ordered census of every snippet name discovered during the walk.
///
/// This is the canonical name-discovery pass: it records names from every
/// extension-eligible file (before the exclusion check, language agnostic)
/// and feeds the generated type artifact.
#[derive(Debug, Default)]
struct NameCensus {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

/// Drives a full extraction run: walks the configured root, extracts and
/// writes snippets per file, then generates the type artifact from the name
/// census.
///
/// Directory entries are processed concurrently and sub-directories recurse
/// independently. Per-file state (the prepend map) is function-local; the
/// only tree-wide mutable structures are the processed-name registry and the
/// name census, both insert-only.
pub struct SnippetExtractor {
    config: Config,
    registry: ProcessedNames,
    census: Mutex<NameCensus>,
}

impl SnippetExtractor {
    /// Creates an extractor from a validated configuration.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid (missing or malformed fields).
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: ProcessedNames::new(),
            census: Mutex::new(NameCensus::default()),
        })
    }

    /// Runs the extraction: tree walk, snippet artifacts, type artifact.
    ///
    /// # Errors
    ///
    /// Fails on unsupported output structures, malformed snippets (missing
    /// name or end tag), and any I/O error. Extraction is all-or-nothing per
    /// run; artifacts already written before a failure are left in place and
    /// overwritten wholesale on the next run.
    pub async fn run(&self) -> Result<()> {
        if self.config.output_directory_structure != OutputStructure::ByLanguage {
            bail!(
                "Output structure '{}' is not implemented; only 'byLanguage' is supported",
                self.config.output_directory_structure.as_str()
            );
        }

        tokio::fs::create_dir_all(&self.config.snippet_output_directory)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output directory {}",
                    self.config.snippet_output_directory.display()
                )
            })?;

        self.process_directory(self.config.root_directory.clone())
            .await?;

        let names = {
            let census = self.census.lock().expect("name census lock poisoned");
            census.ordered.clone()
        };
        typegen::write(&names, &self.config.snippet_output_directory).await?;

        log::info!(
            "Extraction finished: {} distinct snippet name(s) discovered under {}",
            names.len(),
            self.config.root_directory.display()
        );
        Ok(())
    }

    /// Recurses into a directory, processing all entries concurrently.
    fn process_directory(&self, dir: PathBuf) -> BoxFuture<'_, Result<()>> {
        async move {
            log::debug!("Scanning directory {}", dir.display());

            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to read directory {}", dir.display()))?;

            let mut pending = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .with_context(|| format!("Failed to read directory {}", dir.display()))?
            {
                let file_type = entry.file_type().await.with_context(|| {
                    format!("Failed to stat directory entry {}", entry.path().display())
                })?;
                pending.push((entry.path(), file_type.is_dir()));
            }

            try_join_all(pending.into_iter().map(|(path, is_dir)| async move {
                if is_dir {
                    if is_skipped_directory(&path) {
                        return Ok(());
                    }
                    self.process_directory(path).await
                } else if self.is_eligible(&path) {
                    self.process_file(&path).await
                } else {
                    Ok(())
                }
            }))
            .await?;

            Ok(())
        }
        .boxed()
    }

    /// A file is eligible when its extension is in the configured set.
    fn is_eligible(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(extension) => {
                let dotted = format!(".{}", extension);
                self.file_extensions().iter().any(|e| e == &dotted)
            }
            None => false,
        }
    }

    fn file_extensions(&self) -> &[String] {
        &self.config.file_extensions
    }

    async fn process_file(&self, path: &Path) -> Result<()> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        // Census happens before the exclusion check so excluded files still
        // contribute names to the generated type artifact.
        self.record_names(&content);

        let prepend_blocks = prepend::collect(&content, &self.config.snippet_tags);

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if self.config.exclude.iter().any(|e| e == file_name) {
            log::debug!("Skipping excluded file {}", path.display());
            return Ok(());
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let language = language_from_extension(&extension);

        let snippets = extractor::extract(
            &content,
            language,
            &prepend_blocks,
            &self.registry,
            &self.config.snippet_tags,
            file_name,
        )?;

        if snippets.is_empty() {
            return Ok(());
        }

        log::debug!(
            "Extracted {} snippet(s) from {}",
            snippets.len(),
            path.display()
        );
        self.write_snippets(language, &snippets).await
    }

    /// Appends every start-tag name in the file to the census, first
    /// discovery wins.
    fn record_names(&self, content: &str) {
        let mut census = self.census.lock().expect("name census lock poisoned");
        for line in content.split('\n') {
            if let Some(name) = name_after(line, &self.config.snippet_tags.start) {
                if census.seen.insert(name.to_string()) {
                    census.ordered.push(name.to_string());
                }
            }
        }
    }

    /// Writes one artifact per snippet under
    /// `<output>/[version/]<language-directory>/<name>.snippet.txt`,
    /// overwriting existing artifacts unconditionally.
    async fn write_snippets(
        &self,
        language: &str,
        snippets: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut output_dir = self.config.snippet_output_directory.clone();
        if let Some(version) = &self.config.version {
            output_dir.push(version);
        }
        output_dir.push(directory_for_language(language));

        tokio::fs::create_dir_all(&output_dir)
            .await
            .with_context(|| {
                format!("Failed to create output directory {}", output_dir.display())
            })?;

        for (name, content) in snippets {
            let artifact = output_dir.join(format!("{}.snippet.txt", name));
            tokio::fs::write(&artifact, content)
                .await
                .with_context(|| format!("Failed to write snippet {}", artifact.display()))?;
            log::debug!("Wrote {}", artifact.display());
        }

        Ok(())
    }
}

fn is_skipped_directory(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| SKIPPED_DIRECTORIES.contains(&name))
}
