//! Per-feed polling loop with deduplication.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::cache::{Cache, MemoryCache};
use crate::domain::{Feed, FeedItem};
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::Normalizer;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Polls one feed URL and reports items it has not seen before.
///
/// The first successful poll only fills the cache, so starting up against a
/// long feed does not flood the channel. Failed polls leave the cache and the
/// cold-start state untouched.
pub struct FeedPoller<C: Cache = MemoryCache> {
    feed: Feed,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    cache: C,
    interval: Duration,
    primed: bool,
}

impl<C: Cache> FeedPoller<C> {
    pub fn new(
        url: &str,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
        cache: C,
        interval: Duration,
    ) -> Self {
        Self {
            feed: Feed::new(url.to_string()),
            fetcher,
            normalizer,
            cache,
            interval,
            primed: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.feed.url
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Runs a single fetch-decode-filter cycle.
    pub async fn poll_once(&mut self) -> Result<Vec<FeedItem>> {
        let result = self
            .fetcher
            .fetch(
                &self.feed.url,
                self.feed.etag.as_deref(),
                self.feed.last_modified.as_deref(),
            )
            .await?;

        let items = match result {
            FetchResult::NotModified => {
                debug!(url = %self.feed.url, "Feed not modified");
                return Ok(Vec::new());
            }
            FetchResult::Content {
                body,
                etag,
                last_modified,
            } => {
                let (meta, items) = self.normalizer.normalize(&body)?;
                debug!(
                    url = %self.feed.url,
                    title = meta.title.as_deref().unwrap_or_default(),
                    items = items.len(),
                    "Feed decoded"
                );
                self.feed.etag = etag;
                self.feed.last_modified = last_modified;
                items
            }
        };

        let mut fresh = Vec::new();
        for item in items {
            let id = item.identity();
            if id.is_empty() {
                debug!(url = %self.feed.url, "Skipping item with neither guid nor title");
                continue;
            }
            if self.cache.seen(id) {
                continue;
            }
            debug!(url = %self.feed.url, id, "New item");
            self.cache.add(id)?;
            if self.primed {
                fresh.push(item);
            }
        }

        if !self.primed {
            info!(url = %self.feed.url, "Feed primed, announcing only new items from now on");
            self.primed = true;
        }
        Ok(fresh)
    }

    /// Polls forever on a fixed interval, sending new items to `tx`.
    ///
    /// Returns once the receiving side is dropped.
    pub async fn run(mut self, tx: mpsc::Sender<FeedItem>) {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            if tx.is_closed() {
                return;
            }

            let start = Utc::now();
            match self.poll_once().await {
                Ok(items) => {
                    let elapsed = Utc::now().signed_duration_since(start);
                    info!(
                        url = %self.feed.url,
                        new = items.len(),
                        "Poll complete ({:.1}s)",
                        elapsed.num_milliseconds() as f64 / 1000.0
                    );
                    for item in items {
                        if tx.send(item).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => warn!(
                    url = %self.feed.url,
                    error = %e,
                    "Poll failed, retrying in {:?}",
                    self.interval
                ),
            }
        }
    }
}
