/// Maps a file extension (with leading dot) to its language label.
///
/// Unrecognized extensions map to the literal `other` language, which keeps
/// extraction working for any configured extension while grouping unknown
/// content under a single directory.
pub fn language_from_extension(extension: &str) -> &'static str {
    match extension {
        ".js" => "javascript",
        ".ts" => "typescript",
        ".kt" => "kotlin",
        ".py" => "python",
        ".swift" => "swift",
        ".gradle" => "gradle",
        ".bash" => "bash",
        ".xml" => "xml",
        _ => "other",
    }
}

/// Returns the short on-disk directory code for a language label.
///
/// Only python/typescript/kotlin/javascript have a distinct short code; every
/// other language uses its label as the directory name.
pub fn directory_for_language(language: &str) -> &str {
    match language {
        "python" => "py",
        "typescript" => "ts",
        "kotlin" => "kt",
        "javascript" => "js",
        other => other,
    }
}
