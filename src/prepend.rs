use crate::tags::{is_comment_line, SnippetTags};
use std::collections::HashMap;

/// Collects prepend ("import") blocks from one file's text.
///
/// A prepend block names one or more target snippets on its start line and
/// carries the lines up to the matching end marker:
///
/// ```text
/// // :prepend-start: example1 example2
/// import { add } from "./math";
/// // :prepend-end:
/// ```
///
/// Comment lines inside the block are treated as blank and dropped; the
/// remaining lines are joined and trimmed. The resulting block text is
/// appended to each target name's list, in declaration order.
///
/// The returned map is scoped to this file only. A start marker with no
/// matching end marker terminates the scan for the rest of the file without
/// error; any later prepend tags in the file are not processed.
pub fn collect(content: &str, tags: &SnippetTags) -> HashMap<String, Vec<String>> {
    let mut blocks: HashMap<String, Vec<String>> = HashMap::new();
    let start_marker = tags.prepend_start.as_str();
    let end_marker = tags.prepend_end.as_str();

    let mut search_from = 0;
    while let Some(found) = content[search_from..].find(start_marker) {
        let after_marker = search_from + found + start_marker.len();

        // The remainder of the start line is a whitespace-separated list of
        // target snippet names.
        let Some(line_break) = content[after_marker..].find('\n') else {
            break;
        };
        let line_end = after_marker + line_break;
        let names: Vec<&str> = content[after_marker..line_end].split_whitespace().collect();

        let Some(end_found) = content[line_end..].find(end_marker) else {
            log::debug!("Prepend block without end marker; skipping rest of file");
            break;
        };
        let block_end = line_end + end_found;

        let block = clean_block(&content[line_end + 1..block_end]);
        for name in names {
            blocks.entry(name.to_string()).or_default().push(block.clone());
        }

        search_from = block_end + end_marker.len();
    }

    blocks
}

/// Blanks comment lines, drops empty lines, joins and trims the block body.
fn clean_block(raw: &str) -> String {
    raw.split('\n')
        .map(|line| if is_comment_line(line) { "" } else { line })
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_single_block() {
        let content = "\
// :prepend-start: example1
import { add } from \"./math\";
// :prepend-end:
";
        let blocks = collect(content, &SnippetTags::default());
        assert_eq!(
            blocks["example1"],
            vec!["import { add } from \"./math\";".to_string()]
        );
    }

    #[test]
    fn test_collect_multiple_targets() {
        let content = "\
# :prepend-start: first second
import math
# :prepend-end:
";
        let blocks = collect(content, &SnippetTags::default());
        assert_eq!(blocks["first"], vec!["import math".to_string()]);
        assert_eq!(blocks["second"], vec!["import math".to_string()]);
    }

    #[test]
    fn test_comment_lines_inside_block_are_dropped() {
        let content = "\
// :prepend-start: example1
import foo
// only used by the demo
import bar
// :prepend-end:
";
        let blocks = collect(content, &SnippetTags::default());
        assert_eq!(blocks["example1"], vec!["import foo\nimport bar".to_string()]);
    }

    #[test]
    fn test_repeated_blocks_accumulate_in_order() {
        let content = "\
// :prepend-start: example1
import foo
// :prepend-end:
// :prepend-start: example1
import bar
// :prepend-end:
";
        let blocks = collect(content, &SnippetTags::default());
        assert_eq!(
            blocks["example1"],
            vec!["import foo".to_string(), "import bar".to_string()]
        );
    }

    #[test]
    fn test_missing_end_marker_truncates_scan() {
        // The unterminated block is dropped, and so is everything after it.
        let content = "\
// :prepend-start: broken
import foo
// :prepend-start: later
import bar
";
        let blocks = collect(content, &SnippetTags::default());
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_no_prepend_tags() {
        let blocks = collect("let x = 1;\n", &SnippetTags::default());
        assert!(blocks.is_empty());
    }
}
