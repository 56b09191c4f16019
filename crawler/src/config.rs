//! Crawl configuration loaded from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while turning raw configuration values into usable form.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("popular_word_count must be at least 1")]
    ZeroPopularWordCount,
}

/// Immutable settings for one crawl run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlConfig {
    /// Seed URLs the crawl starts from. Duplicates are fine; the visited
    /// set deduplicates them on the first hop.
    pub start_pages: Vec<String>,

    /// Wall-clock budget for the whole crawl, measured from crawl start.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum link-following depth. 0 visits nothing.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// How many ranked words the result keeps. Must be at least 1.
    #[serde(default = "default_popular_word_count")]
    pub popular_word_count: usize,

    /// Full-string regex patterns; a URL matching any of them is never
    /// crawled.
    #[serde(default)]
    pub ignored_urls: Vec<String>,

    /// Full-string regex patterns; words matching any of them are not
    /// counted.
    #[serde(default)]
    pub ignored_words: Vec<String>,

    /// Concurrent page fetches. 0 means "use all available cores".
    #[serde(default)]
    pub parallelism: usize,

    /// Where to write the crawl result JSON; stdout when absent.
    #[serde(default)]
    pub result_path: Option<PathBuf>,

    /// Where to append the profiler report; stdout when absent.
    #[serde(default)]
    pub profile_output_path: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_depth() -> usize {
    3
}

fn default_popular_word_count() -> usize {
    10
}

impl CrawlConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config {}", path.as_ref().display()))?;
        let config: CrawlConfig =
            serde_json::from_str(&raw).context("failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.popular_word_count == 0 {
            return Err(ConfigError::ZeroPopularWordCount);
        }
        Ok(())
    }

    /// Effective number of concurrent fetches: the configured hint capped
    /// by what the host actually offers, and at least 1.
    pub fn effective_parallelism(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        match self.parallelism {
            0 => available,
            hint => hint.min(available),
        }
    }
}

/// Compile raw patterns into full-string matchers. A pattern has to match
/// the whole URL or word, not a substring of it.
pub fn compile_anchored(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
                ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "start_pages": ["https://example.com"],
            "timeout_secs": 5,
            "max_depth": 2,
            "popular_word_count": 4,
            "ignored_urls": ["https://example\\.com/private.*"],
            "ignored_words": ["^.{1,3}$"],
            "parallelism": 8,
            "result_path": "out/result.json",
            "profile_output_path": "out/profile.txt"
        }"#;

        let config: CrawlConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.start_pages, vec!["https://example.com"]);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.popular_word_count, 4);
        assert_eq!(config.parallelism, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_apply() {
        let config: CrawlConfig =
            serde_json::from_str(r#"{"start_pages": []}"#).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.popular_word_count, 10);
        assert!(config.ignored_urls.is_empty());
        assert!(config.result_path.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let parsed = serde_json::from_str::<CrawlConfig>(
            r#"{"start_pages": [], "max_pages": 10}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_zero_popular_word_count_rejected() {
        let config: CrawlConfig =
            serde_json::from_str(r#"{"start_pages": [], "popular_word_count": 0}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroPopularWordCount)
        ));
    }

    #[test]
    fn test_anchored_patterns_match_full_string_only() {
        let patterns = compile_anchored(&["https://x\\.test/skip".to_string()]).unwrap();
        assert!(patterns[0].is_match("https://x.test/skip"));
        assert!(!patterns[0].is_match("https://x.test/skip/deeper"));
        assert!(!patterns[0].is_match("prefix https://x.test/skip"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let result = compile_anchored(&["(unclosed".to_string()]);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_effective_parallelism_is_at_least_one() {
        let config: CrawlConfig =
            serde_json::from_str(r#"{"start_pages": [], "parallelism": 1}"#).unwrap();
        assert_eq!(config.effective_parallelism(), 1);

        let auto: CrawlConfig = serde_json::from_str(r#"{"start_pages": []}"#).unwrap();
        assert!(auto.effective_parallelism() >= 1);
    }
}
