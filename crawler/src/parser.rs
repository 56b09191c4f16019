//! The page parser collaborator: given a URL, produce the page's word
//! counts and outgoing links.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use profiler::{Instrumented, ProfiledOps};
use regex::Regex;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use crate::extract;

const USER_AGENT: &str = "WordCrawler";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// What a single parsed page contributes to the crawl.
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub word_counts: HashMap<String, usize>,
    pub links: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("request for {url} failed: {source}")]
    Fetch { url: String, source: reqwest::Error },
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
}

/// A collaborator that turns a URL into word counts and outgoing links.
///
/// Implementations may be called concurrently on different URLs; no
/// ordering is assumed between calls.
#[async_trait]
pub trait PageParser: Send + Sync {
    async fn parse(&self, url: &str) -> Result<PageData, ParseError>;
}

/// HTTP-backed parser: fetch the body with a shared client, then extract
/// words and links from it.
pub struct HttpPageParser {
    client: Client,
    ignored_words: Vec<Regex>,
}

impl HttpPageParser {
    pub fn new(ignored_words: Vec<Regex>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            ignored_words,
        })
    }
}

#[async_trait]
impl PageParser for HttpPageParser {
    async fn parse(&self, url: &str) -> Result<PageData, ParseError> {
        let base = Url::parse(url).map_err(|source| ParseError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let response = self
            .client
            .get(base.clone())
            .send()
            .await
            .map_err(|source| ParseError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParseError::Status {
                url: url.to_string(),
                status,
            });
        }

        let html = response
            .text()
            .await
            .map_err(|source| ParseError::Fetch {
                url: url.to_string(),
                source,
            })?;

        Ok(PageData {
            word_counts: extract::word_counts(&html, &self.ignored_words),
            links: extract::links(&html, &base),
        })
    }
}

impl ProfiledOps for HttpPageParser {
    const PROFILED: &'static [&'static str] = &["parse"];

    fn type_label(&self) -> &'static str {
        "HttpPageParser"
    }
}

/// Forwarding impl so a profiler-wrapped parser is a drop-in collaborator.
///
/// The timer guard records the elapsed time even when `parse` fails, and
/// the error value passes through untouched.
#[async_trait]
impl<P> PageParser for Instrumented<P>
where
    P: PageParser + ProfiledOps + Send + Sync,
{
    async fn parse(&self, url: &str) -> Result<PageData, ParseError> {
        let _timer = self.timer("parse");
        self.inner().parse(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profiler::Profiler;

    struct FailingParser;

    #[async_trait]
    impl PageParser for FailingParser {
        async fn parse(&self, url: &str) -> Result<PageData, ParseError> {
            Err(ParseError::Status {
                url: url.to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            })
        }
    }

    impl ProfiledOps for FailingParser {
        const PROFILED: &'static [&'static str] = &["parse"];

        fn type_label(&self) -> &'static str {
            "FailingParser"
        }
    }

    #[tokio::test]
    async fn test_profiled_parser_keeps_the_original_error() {
        let profiler = Profiler::new();
        let parser = profiler.wrap(FailingParser).unwrap();

        let err = parser.parse("https://example.com/").await.unwrap_err();
        assert!(matches!(
            err,
            ParseError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                ..
            }
        ));

        // The failed call still shows up in the timing store.
        assert!(profiler.recorded("FailingParser", "parse").is_some());
    }

    #[tokio::test]
    async fn test_profiled_parser_times_successful_calls() {
        struct SlowParser;

        #[async_trait]
        impl PageParser for SlowParser {
            async fn parse(&self, _url: &str) -> Result<PageData, ParseError> {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(PageData::default())
            }
        }

        impl ProfiledOps for SlowParser {
            const PROFILED: &'static [&'static str] = &["parse"];

            fn type_label(&self) -> &'static str {
                "SlowParser"
            }
        }

        let profiler = Profiler::new();
        let parser = profiler.wrap(SlowParser).unwrap();

        parser.parse("https://example.com/").await.unwrap();
        parser.parse("https://example.com/").await.unwrap();

        let total = profiler.recorded("SlowParser", "parse").unwrap();
        assert!(total >= Duration::from_millis(20));
    }
}
