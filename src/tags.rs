use serde::{Deserialize, Serialize};

/// Single-line comment leaders that may prefix a tag marker.
pub const COMMENT_LEADERS: [&str; 2] = ["//", "#"];

/// The four textual markers that delimit snippet and prepend regions.
///
/// All markers are configurable through the `[snippet_tags]` table of the
/// configuration file; the defaults match the conventional tag vocabulary:
///
/// ```text
/// // :snippet-start: example1
/// let x = 1;
/// // :snippet-end:
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetTags {
    pub start: String,
    pub end: String,
    pub prepend_start: String,
    pub prepend_end: String,
}

impl Default for SnippetTags {
    fn default() -> Self {
        Self {
            start: ":snippet-start:".to_string(),
            end: ":snippet-end:".to_string(),
            prepend_start: ":prepend-start:".to_string(),
            prepend_end: ":prepend-end:".to_string(),
        }
    }
}

/// Returns true when the line, after left-trim, begins with a single-line
/// comment leader.
pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    COMMENT_LEADERS
        .iter()
        .any(|leader| trimmed.starts_with(leader))
}

/// Strips exactly one leading comment leader and any whitespace that follows
/// it. Non-comment lines are returned unchanged (including their leading
/// whitespace).
pub fn strip_comment_leader(line: &str) -> &str {
    let trimmed = line.trim_start();
    for leader in COMMENT_LEADERS {
        if let Some(rest) = trimmed.strip_prefix(leader) {
            return rest.trim_start();
        }
    }
    line
}

/// Returns the first whitespace-delimited token after `tag` on the line, if
/// the line contains the tag and a token follows it.
pub fn name_after<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let idx = line.find(tag)?;
    line[idx + tag.len()..].split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_comment_line() {
        assert!(is_comment_line("// hello"));
        assert!(is_comment_line("   # hello"));
        assert!(!is_comment_line("let x = 1; // trailing"));
        assert!(!is_comment_line(""));
    }

    #[test]
    fn test_strip_comment_leader() {
        assert_eq!(strip_comment_leader("// hello"), "hello");
        assert_eq!(strip_comment_leader("  #   hello"), "hello");
        assert_eq!(strip_comment_leader("    let x = 1;"), "    let x = 1;");
    }

    #[test]
    fn test_strip_comment_leader_strips_only_one() {
        // A doubled leader loses exactly one marker.
        assert_eq!(strip_comment_leader("// // nested"), "// nested");
    }

    #[test]
    fn test_name_after() {
        assert_eq!(
            name_after("// :snippet-start: example1", ":snippet-start:"),
            Some("example1")
        );
        assert_eq!(
            name_after(":snippet-start: first second", ":snippet-start:"),
            Some("first")
        );
        assert_eq!(name_after("// :snippet-start:", ":snippet-start:"), None);
        assert_eq!(name_after("no tag here", ":snippet-start:"), None);
    }
}
