use crate::language::directory_for_language;
use anyhow::{ensure, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Configuration for the runtime snippet resolver.
///
/// Unlike the extraction configuration, this value is mutable: it is replaced
/// through [`SnippetResolver::update_config`], and every replacement clears
/// the resolution cache wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base location of the published snippet artifacts
    pub base_url: String,

    /// Languages to resolve, in display order; the first one is the
    /// default language of every result
    pub languages: Vec<String>,

    /// Per-language import lines attached to results for languages with a
    /// non-empty list, independent of retrieval success
    pub default_imports: HashMap<String, Vec<String>>,

    /// Bound on each per-language fetch; a timeout is treated like any
    /// other retrieval miss
    pub fetch_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/snippets".to_string(),
            languages: vec!["python".to_string(), "kotlin".to_string()],
            default_imports: HashMap::new(),
            fetch_timeout_secs: 10,
        }
    }
}

/// Partial configuration update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverConfigUpdate {
    pub base_url: Option<String>,
    pub languages: Option<Vec<String>>,
    pub default_imports: Option<HashMap<String, Vec<String>>>,
    pub fetch_timeout_secs: Option<u64>,
}

/// The runtime-assembled, multi-language view of one snippet.
///
/// `languages` is always exactly the set of keys of `content`, in configured
/// language order. `default_language` is the first configured language, even
/// when its retrieval failed, so callers get a predictable default tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnippetResult {
    pub name: String,
    pub languages: Vec<String>,
    pub default_language: String,
    pub content: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<HashMap<String, Vec<String>>>,
}

/// Display options for [`format_snippet`].
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub language: String,
    pub show_line_numbers: bool,
}

/// Formats snippet content for display. Pure, no I/O, no caching.
///
/// When `show_line_numbers` is set, each line is prefixed with a 1-based
/// index and a separator; otherwise the content is returned unchanged.
pub fn format_snippet(content: &str, options: &FormatOptions) -> String {
    if !options.show_line_numbers {
        return content.to_string();
    }
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!("{} | {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

struct ResolverState {
    config: ResolverConfig,
    config_version: u64,
    cache: HashMap<String, SnippetResult>,
}

/// Resolves snippet names into per-language content at documentation-render
/// time, with memoization.
///
/// Per-language fetches for one [`get_snippet`](Self::get_snippet) call run
/// concurrently, and a failed, non-success, or timed-out retrieval for one
/// language never fails the call; that language is simply absent from the
/// result. Results are cached by name; any configuration update clears the
/// entire cache.
pub struct SnippetResolver {
    client: reqwest::Client,
    state: Mutex<ResolverState>,
}

impl SnippetResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            state: Mutex::new(ResolverState {
                config,
                config_version: 0,
                cache: HashMap::new(),
            }),
        }
    }

    /// Shallow-merges the partial configuration into the current one and
    /// unconditionally clears the entire resolution cache, regardless of
    /// which field changed.
    pub fn update_config(&self, update: ResolverConfigUpdate) {
        let mut state = self.state.lock().expect("resolver state lock poisoned");
        if let Some(base_url) = update.base_url {
            state.config.base_url = base_url;
        }
        if let Some(languages) = update.languages {
            state.config.languages = languages;
        }
        if let Some(default_imports) = update.default_imports {
            state.config.default_imports = default_imports;
        }
        if let Some(fetch_timeout_secs) = update.fetch_timeout_secs {
            state.config.fetch_timeout_secs = fetch_timeout_secs;
        }
        state.config_version += 1;
        state.cache.clear();
        log::debug!(
            "Resolver configuration updated (v{}), cache cleared",
            state.config_version
        );
    }

    /// Number of cached results.
    pub fn cache_len(&self) -> usize {
        self.state
            .lock()
            .expect("resolver state lock poisoned")
            .cache
            .len()
    }

    /// Resolves a snippet name into its per-language content.
    ///
    /// Cached results are returned without I/O. On a miss, the artifact is
    /// fetched for every configured language concurrently and the assembled
    /// result is memoized under the name.
    ///
    /// # Errors
    ///
    /// Fails when no languages are configured. Individual retrieval misses
    /// are logged and degrade the result instead of failing it.
    pub async fn get_snippet(&self, name: &str) -> Result<SnippetResult> {
        let (config, version) = {
            let state = self.state.lock().expect("resolver state lock poisoned");
            if let Some(hit) = state.cache.get(name) {
                log::debug!("Resolution cache hit for '{}'", name);
                return Ok(hit.clone());
            }
            (state.config.clone(), state.config_version)
        };

        ensure!(
            !config.languages.is_empty(),
            "No languages configured for snippet resolution"
        );

        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        let outcomes = join_all(config.languages.iter().map(|language| {
            let base_url = config.base_url.clone();
            let language = language.clone();
            async move {
                let body = self.fetch_language(&base_url, &language, name, timeout).await;
                (language, body)
            }
        }))
        .await;

        let mut languages = Vec::new();
        let mut content = HashMap::new();
        for (language, body) in outcomes {
            if let Some(body) = body {
                languages.push(language.clone());
                content.insert(language, body);
            }
        }

        let imports: HashMap<String, Vec<String>> = config
            .languages
            .iter()
            .filter_map(|language| {
                config
                    .default_imports
                    .get(language)
                    .filter(|lines| !lines.is_empty())
                    .map(|lines| (language.clone(), lines.clone()))
            })
            .collect();

        let result = SnippetResult {
            name: name.to_string(),
            languages,
            default_language: config.languages[0].clone(),
            content,
            imports: if imports.is_empty() { None } else { Some(imports) },
        };

        {
            let mut state = self.state.lock().expect("resolver state lock poisoned");
            // A config update raced this resolution: return the result but
            // keep the fresh cache empty of stale entries.
            if state.config_version == version {
                state.cache.insert(name.to_string(), result.clone());
            }
        }

        Ok(result)
    }

    /// Fetches one language's artifact. Any failure (connection error,
    /// non-success status, timeout, body decode) is logged and mapped to
    /// `None` so the language is omitted from the result.
    async fn fetch_language(
        &self,
        base_url: &str,
        language: &str,
        name: &str,
        timeout: Duration,
    ) -> Option<String> {
        let url = format!(
            "{}/{}/{}.snippet.txt",
            base_url.trim_end_matches('/'),
            directory_for_language(language),
            name
        );
        log::debug!("Fetching snippet '{}' for {} from {}", name, language, url);

        let response = match tokio::time::timeout(timeout, self.client.get(&url).send()).await {
            Err(_) => {
                log::warn!(
                    "Timed out fetching snippet '{}' for language {}",
                    name,
                    language
                );
                return None;
            }
            Ok(Err(e)) => {
                log::warn!(
                    "Failed to fetch snippet '{}' for language {}: {}",
                    name,
                    language,
                    e
                );
                return None;
            }
            Ok(Ok(response)) => response,
        };

        if !response.status().is_success() {
            log::warn!(
                "Snippet '{}' unavailable for language {} (status {})",
                name,
                language,
                response.status()
            );
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                log::warn!(
                    "Failed to read snippet '{}' body for language {}: {}",
                    name,
                    language,
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, languages: &[&str]) -> ResolverConfig {
        ResolverConfig {
            base_url: server.uri(),
            languages: languages.iter().map(|l| l.to_string()).collect(),
            default_imports: HashMap::new(),
            fetch_timeout_secs: 5,
        }
    }

    async fn mount_snippet(server: &MockServer, dir: &str, name: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/{}/{}.snippet.txt", dir, name)))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_format_snippet_with_line_numbers() {
        let options = FormatOptions {
            language: "x".to_string(),
            show_line_numbers: true,
        };
        assert_eq!(format_snippet("a\nb", &options), "1 | a\n2 | b");
    }

    #[test]
    fn test_format_snippet_without_line_numbers() {
        let options = FormatOptions {
            language: "x".to_string(),
            show_line_numbers: false,
        };
        assert_eq!(format_snippet("a\nb", &options), "a\nb");
    }

    #[tokio::test]
    async fn test_get_snippet_all_languages_succeed() {
        let server = MockServer::start().await;
        mount_snippet(&server, "py", "example1", "print('x')").await;
        mount_snippet(&server, "kt", "example1", "println(\"x\")").await;

        let resolver = SnippetResolver::new(config_for(&server, &["python", "kotlin"]));
        let result = resolver.get_snippet("example1").await.unwrap();

        assert_eq!(result.name, "example1");
        assert_eq!(result.languages, vec!["python", "kotlin"]);
        assert_eq!(result.default_language, "python");
        assert_eq!(result.content["python"], "print('x')");
        assert_eq!(result.content["kotlin"], "println(\"x\")");
        assert!(result.imports.is_none());
    }

    #[tokio::test]
    async fn test_failed_language_is_omitted_not_fatal() {
        let server = MockServer::start().await;
        mount_snippet(&server, "py", "example1", "print('x')").await;
        // No kotlin mock mounted: the kt fetch returns 404.

        let resolver = SnippetResolver::new(config_for(&server, &["python", "kotlin"]));
        let result = resolver.get_snippet("example1").await.unwrap();

        assert_eq!(result.languages, vec!["python"]);
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.content["python"], "print('x')");
    }

    #[tokio::test]
    async fn test_default_language_is_first_configured_even_on_failure() {
        let server = MockServer::start().await;
        mount_snippet(&server, "py", "example1", "print('x')").await;

        // Kotlin is configured first but its fetch fails.
        let resolver = SnippetResolver::new(config_for(&server, &["kotlin", "python"]));
        let result = resolver.get_snippet("example1").await.unwrap();

        assert_eq!(result.default_language, "kotlin");
        assert_eq!(result.languages, vec!["python"]);
    }

    #[tokio::test]
    async fn test_imports_attached_independent_of_retrieval() {
        let server = MockServer::start().await;
        mount_snippet(&server, "py", "example1", "print('x')").await;

        let mut config = config_for(&server, &["python", "kotlin"]);
        config.default_imports.insert(
            "python".to_string(),
            vec!["from typing import Any".to_string()],
        );
        // Kotlin retrieval fails, but its configured imports still show up.
        config
            .default_imports
            .insert("kotlin".to_string(), vec!["import java.util.*".to_string()]);
        config
            .default_imports
            .insert("swift".to_string(), Vec::new());

        let resolver = SnippetResolver::new(config);
        let result = resolver.get_snippet("example1").await.unwrap();

        let imports = result.imports.unwrap();
        assert_eq!(imports["python"], vec!["from typing import Any"]);
        assert_eq!(imports["kotlin"], vec!["import java.util.*"]);
        // Empty lists and unconfigured languages are not attached.
        assert!(!imports.contains_key("swift"));
    }

    #[tokio::test]
    async fn test_results_are_cached_per_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/py/example1.snippet.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("print('x')"))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = SnippetResolver::new(config_for(&server, &["python"]));
        let first = resolver.get_snippet("example1").await.unwrap();
        let second = resolver.get_snippet("example1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(resolver.cache_len(), 1);
        // The mock's expect(1) verifies exactly one retrieval happened.
        server.verify().await;
    }

    #[tokio::test]
    async fn test_update_config_clears_cache_and_refetches() {
        let server = MockServer::start().await;
        mount_snippet(&server, "py", "example1", "old body").await;

        let resolver = SnippetResolver::new(config_for(&server, &["python"]));
        resolver.get_snippet("example1").await.unwrap();
        assert_eq!(resolver.cache_len(), 1);

        let second_server = MockServer::start().await;
        mount_snippet(&second_server, "py", "example1", "new body").await;
        resolver.update_config(ResolverConfigUpdate {
            base_url: Some(second_server.uri()),
            ..Default::default()
        });
        assert_eq!(resolver.cache_len(), 0);

        let result = resolver.get_snippet("example1").await.unwrap();
        assert_eq!(result.content["python"], "new body");
    }

    #[tokio::test]
    async fn test_no_configured_languages_is_an_error() {
        let server = MockServer::start().await;
        let resolver = SnippetResolver::new(config_for(&server, &[]));
        assert!(resolver.get_snippet("example1").await.is_err());
    }

    #[tokio::test]
    async fn test_serialized_result_shape() {
        let server = MockServer::start().await;
        mount_snippet(&server, "py", "example1", "print('x')").await;

        let mut config = config_for(&server, &["python", "kotlin"]);
        config.default_imports.insert(
            "python".to_string(),
            vec!["from typing import Any".to_string()],
        );

        let resolver = SnippetResolver::new(config);
        let result = resolver.get_snippet("example1").await.unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["name"], "example1");
        assert_eq!(json["languages"], serde_json::json!(["python"]));
        assert_eq!(json["default_language"], "python");
        assert_eq!(json["content"]["python"], "print('x')");
        assert_eq!(
            json["imports"]["python"],
            serde_json::json!(["from typing import Any"])
        );
        assert!(json["imports"].get("kotlin").is_none());
    }
}
