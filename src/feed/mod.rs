//! Feed poller: announce new feed items in the channel, oldest first.
//!
//! Runs as an independent task once the session confirms channel membership.
//! Polls with adaptive backoff — eagerly after startup or fresh activity,
//! settling to roughly once a minute on a quiet feed — and never gives up:
//! fetch and parse failures just wait for the next cycle.

pub mod cursor;
pub mod parse;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::irc::Message;
use crate::outbound::Outbound;

use cursor::FeedCursor;
use parse::FeedItem;

/// Backoff ceiling: roughly one poll per minute once the feed is quiet.
const MAX_BACKOFF_SECS: u64 = 59;

/// Errors from one poll cycle. Always recovered by waiting for the next.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Fetch failed or the server answered with an error status.
    #[error("feed fetch failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The poller state and its injected collaborators.
pub struct FeedPoller {
    url: String,
    channel: String,
    outbound: Outbound,
    http: reqwest::Client,
    cursor: FeedCursor,
    item_pause: Duration,
}

impl FeedPoller {
    /// Build a poller from the feed config and its collaborators.
    pub fn new(
        config: &FeedConfig,
        channel: String,
        outbound: Outbound,
        cursor: FeedCursor,
    ) -> Self {
        Self {
            url: config.url.clone(),
            channel,
            outbound,
            http: reqwest::Client::new(),
            cursor,
            item_pause: Duration::from_secs(config.item_pause_secs),
        }
    }

    /// Run forever, once the session signals channel membership.
    pub async fn run(mut self, mut joined: watch::Receiver<bool>) {
        while !*joined.borrow() {
            if joined.changed().await.is_err() {
                // Session is gone; the process is on its way down.
                return;
            }
        }
        info!(url = %self.url, cursor = self.cursor.value(), "feed poller started");

        let mut backoff_secs: u64 = 1;
        loop {
            tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            backoff_secs = backoff_secs.saturating_add(1).min(MAX_BACKOFF_SECS);

            match self.poll_once().await {
                Ok(true) => backoff_secs = 1,
                Ok(false) => {}
                // Errors advance the backoff exactly like empty polls.
                Err(e) => warn!(error = %e, "feed poll failed"),
            }
        }
    }

    /// One poll cycle: fetch, parse, announce what is new.
    async fn poll_once(&mut self) -> Result<bool, FeedError> {
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let items = parse::parse_items(&body);
        debug!(count = items.len(), "feed fetched");
        Ok(self.announce(items).await)
    }

    /// Emit every item newer than the cursor, oldest first, persisting the
    /// cursor after each emission so a crash duplicates at most one item.
    /// Returns whether anything was emitted.
    pub async fn announce(&mut self, mut items: Vec<FeedItem>) -> bool {
        items.sort_by_key(|item| item.timestamp);

        let mut emitted = false;
        for item in &items {
            if item.timestamp <= self.cursor.value() {
                continue;
            }
            let text = parse::announcement_text(item);
            self.outbound
                .send(Message::privmsg(&self.channel, &text))
                .await;
            self.cursor.advance(item.timestamp).await;
            emitted = true;
            tokio::time::sleep(self.item_pause).await;
        }
        emitted
    }
}
