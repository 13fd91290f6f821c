use crate::tags::{is_comment_line, name_after, strip_comment_leader, SnippetTags};
use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// Tree-wide registry of (language, name) pairs that have already produced a
/// snippet somewhere in the walk.
///
/// The registry enforces the "first occurrence wins" policy: later files that
/// declare the same snippet name for the same language are silently skipped.
/// It is the only mutable state shared across concurrently processed files,
/// and it only ever grows: there is no removal or update, just an atomic
/// insert-if-absent check per key.
#[derive(Debug, Default)]
pub struct ProcessedNames {
    claimed: Mutex<HashSet<(String, String)>>,
}

impl ProcessedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims (language, name). Returns false when another file
    /// already produced this snippet for this language.
    pub fn try_claim(&self, language: &str, name: &str) -> bool {
        self.claimed
            .lock()
            .expect("processed-name registry lock poisoned")
            .insert((language.to_string(), name.to_string()))
    }
}

/// An open snippet cursor: the name being accumulated, the raw body lines,
/// and the prepend blocks registered for that name in this file.
struct Cursor {
    name: String,
    lines: Vec<String>,
    prepends: Vec<String>,
}

/// Scans one file's lines for start/end tags and returns the extracted
/// snippets as a name → normalized body map.
///
/// Tag recognition works on a comment-stripped view of each line (one leading
/// `//` or `#` removed), so tags may live inside single-line comments. Body
/// lines are accumulated verbatim and normalized when the end tag closes the
/// cursor; matching prepend blocks are joined ahead of the body, separated by
/// a blank line.
///
/// # Errors
///
/// Fails the whole run when a start tag carries no snippet name, or when the
/// file ends with a cursor still open (missing end tag). Both errors name the
/// offending file.
pub fn extract(
    content: &str,
    language: &str,
    prepend_blocks: &HashMap<String, Vec<String>>,
    registry: &ProcessedNames,
    tags: &SnippetTags,
    file_name: &str,
) -> Result<BTreeMap<String, String>> {
    let mut snippets = BTreeMap::new();
    let mut cursor: Option<Cursor> = None;

    for line in content.split('\n') {
        let stripped = strip_comment_leader(line);

        if stripped.contains(tags.start.as_str()) {
            let Some(name) = name_after(stripped, &tags.start) else {
                bail!("Missing snippet name in file {}", file_name);
            };

            // Already produced for this language somewhere in the tree: the
            // tag is a no-op, and its closing tag will be ignored because no
            // cursor is open.
            if !registry.try_claim(language, name) {
                continue;
            }

            cursor = Some(Cursor {
                name: name.to_string(),
                lines: Vec::new(),
                prepends: prepend_blocks.get(name).cloned().unwrap_or_default(),
            });
        } else if stripped.contains(tags.end.as_str()) {
            if let Some(open) = cursor.take() {
                let body = normalize_indentation(&open.lines);
                let text = if open.prepends.is_empty() {
                    body
                } else {
                    format!("{}\n\n{}", open.prepends.join("\n"), body)
                };
                snippets.insert(open.name, text);
            }
        } else if let Some(open) = cursor.as_mut() {
            open.lines.push(line.to_string());
        }
    }

    if let Some(open) = cursor {
        bail!(
            "Missing end tag for snippet '{}' in file {}",
            open.name,
            file_name
        );
    }

    Ok(snippets)
}

/// Normalizes an accumulated snippet body.
///
/// Strips the minimum leading-whitespace width shared by all non-blank lines,
/// drops lines consisting solely of a comment leader, strips one leading
/// comment leader from the remaining comment lines, prunes blank lines, and
/// joins the rest with newlines, trimming the overall result.
pub fn normalize_indentation(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let min_indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned = Vec::new();
    for line in lines {
        let dedented: String = line.chars().skip(min_indent).collect();
        let trimmed = dedented.trim();
        if trimmed == "//" || trimmed == "#" {
            continue;
        }
        let result = if is_comment_line(&dedented) {
            strip_comment_leader(&dedented).to_string()
        } else {
            dedented
        };
        if result.trim().is_empty() {
            continue;
        }
        cleaned.push(result);
    }

    cleaned.join("\n").trim().to_string()
}
