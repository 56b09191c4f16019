//! The crawl engine: recursive, parallel traversal from the seed URLs.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{compile_anchored, ConfigError, CrawlConfig};
use crate::parser::PageParser;
use crate::ranking;
use crate::state::{VisitedSet, WordCountAccumulator};

/// Outcome of one crawl: the top-K words in rank order and how many
/// distinct URLs were processed.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    #[serde(serialize_with = "serialize_ranked")]
    pub word_counts: Vec<(String, usize)>,
    pub urls_visited: usize,
}

/// Keep the ranked list a JSON object, in rank order.
fn serialize_ranked<S: Serializer>(
    entries: &[(String, usize)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (word, count) in entries {
        map.serialize_entry(word, count)?;
    }
    map.end()
}

pub struct CrawlEngine {
    parser: Arc<dyn PageParser>,
    timeout: Duration,
    max_depth: usize,
    popular_word_count: usize,
    ignored_urls: Vec<Regex>,
    parallelism: usize,
}

/// Everything a recursive task shares with its siblings.
struct CrawlShared {
    parser: Arc<dyn PageParser>,
    deadline: Instant,
    ignored_urls: Vec<Regex>,
    fetch_slots: Semaphore,
    visited: VisitedSet,
    counts: WordCountAccumulator,
}

impl CrawlEngine {
    pub fn new(parser: Arc<dyn PageParser>, config: &CrawlConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            parser,
            timeout: Duration::from_secs(config.timeout_secs),
            max_depth: config.max_depth,
            popular_word_count: config.popular_word_count,
            ignored_urls: compile_anchored(&config.ignored_urls)?,
            parallelism: config.effective_parallelism(),
        })
    }

    /// Crawl from the seeds until the depth budget and the deadline are
    /// exhausted.
    ///
    /// Blocks until every recursive task has finished. Per-page parse
    /// failures are dead ends, never an error of the crawl itself, so this
    /// is infallible.
    pub async fn crawl(&self, start_pages: &[String]) -> CrawlResult {
        let shared = Arc::new(CrawlShared {
            parser: Arc::clone(&self.parser),
            deadline: Instant::now() + self.timeout,
            ignored_urls: self.ignored_urls.clone(),
            fetch_slots: Semaphore::new(self.parallelism),
            visited: VisitedSet::new(),
            counts: WordCountAccumulator::new(),
        });

        let roots: Vec<JoinHandle<()>> = start_pages
            .iter()
            .map(|seed| tokio::spawn(visit(Arc::clone(&shared), seed.clone(), self.max_depth)))
            .collect();
        for root in roots {
            let _ = root.await;
        }

        let urls_visited = shared.visited.len().await;
        let word_counts = if shared.counts.is_empty().await {
            Vec::new()
        } else {
            ranking::rank(&shared.counts.snapshot().await, self.popular_word_count)
        };
        debug!(urls_visited, "crawl finished");

        CrawlResult {
            word_counts,
            urls_visited,
        }
    }
}

/// One recursive unit of work: process `url`, then fan out into its links.
///
/// Boxed so the async recursion has a sized future. Children run as their
/// own tasks, concurrently with each other and with unrelated branches,
/// and are all awaited before the parent completes.
fn visit(shared: Arc<CrawlShared>, url: String, depth: usize) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        if depth == 0 {
            return;
        }
        if Instant::now() >= shared.deadline {
            return;
        }
        if shared
            .ignored_urls
            .iter()
            .any(|pattern| pattern.is_match(&url))
        {
            return;
        }
        if !shared.visited.insert(&url).await {
            return;
        }

        // The permit bounds concurrent parses only; it is released before
        // any child work, so deep fan-out cannot exhaust the pool.
        let parsed = {
            let _permit = match shared.fetch_slots.acquire().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            shared.parser.parse(&url).await
        };

        let page = match parsed {
            Ok(page) => page,
            Err(error) => {
                warn!(%url, %error, "skipping page");
                return;
            }
        };

        shared.counts.merge(&page.word_counts).await;

        let children: Vec<JoinHandle<()>> = page
            .links
            .into_iter()
            .map(|link| tokio::spawn(visit(Arc::clone(&shared), link, depth - 1)))
            .collect();
        for child in children {
            let _ = child.await;
        }
    })
}
