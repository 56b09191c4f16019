//! Shared state for one crawl invocation.
//!
//! Both collections are created fresh per `crawl` call and shared by every
//! task of that call. Locks cover only the in-memory mutation, never a
//! page fetch.

use std::collections::{HashMap, HashSet};

use tokio::sync::{Mutex, RwLock};

/// URLs already claimed by some task of the current crawl.
#[derive(Default)]
pub struct VisitedSet {
    urls: RwLock<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for the calling task.
    ///
    /// Returns true exactly once per URL across all concurrent callers;
    /// the insert itself is the uniqueness gate.
    pub async fn insert(&self, url: &str) -> bool {
        // Fast path with the read lock
        {
            let urls = self.urls.read().await;
            if urls.contains(url) {
                return false;
            }
        }

        // The insert doubles as the re-check after the lock upgrade
        let mut urls = self.urls.write().await;
        urls.insert(url.to_string())
    }

    /// Number of distinct URLs claimed so far.
    pub async fn len(&self) -> usize {
        self.urls.read().await.len()
    }
}

/// Global word -> count map fed by every parsed page.
#[derive(Default)]
pub struct WordCountAccumulator {
    counts: Mutex<HashMap<String, usize>>,
}

impl WordCountAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page's local counts into the shared totals. A single lock
    /// acquisition covers the whole merge, so concurrent merges cannot
    /// drop increments.
    pub async fn merge(&self, page_counts: &HashMap<String, usize>) {
        let mut counts = self.counts.lock().await;
        for (word, count) in page_counts {
            *counts.entry(word.clone()).or_insert(0) += count;
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.counts.lock().await.is_empty()
    }

    /// Clone the totals. Meant to be called after every task has joined.
    pub async fn snapshot(&self) -> HashMap<String, usize> {
        self.counts.lock().await.clone()
    }
}
