//! Tests for `src/feed/mod.rs` — announcement ordering and idempotence.

use std::sync::Arc;

use tokio::sync::mpsc;

use skald::config::FeedConfig;
use skald::feed::cursor::FeedCursor;
use skald::feed::parse::FeedItem;
use skald::feed::FeedPoller;
use skald::irc::Message;
use skald::limiter::RateLimiter;
use skald::outbound::Outbound;

fn item(title: &str, timestamp: i64) -> FeedItem {
    FeedItem {
        title: title.to_owned(),
        description: String::new(),
        timestamp,
    }
}

/// A poller over a temp cursor file and an inspectable outbound channel.
/// `item_pause_secs` is zero so tests never wait.
async fn test_poller(cursor_path: std::path::PathBuf) -> (FeedPoller, mpsc::Receiver<Message>) {
    let config = FeedConfig {
        url: "http://feed.invalid/rss".to_owned(),
        cursor_path: Some(cursor_path.clone()),
        item_pause_secs: 0,
    };
    let (tx, rx) = mpsc::channel(32);
    let outbound = Outbound::new(tx, Arc::new(RateLimiter::new(100.0, 0.0)));
    let cursor = FeedCursor::load(cursor_path).await;
    (
        FeedPoller::new(&config, "#songs".to_owned(), outbound, cursor),
        rx,
    )
}

fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<String> {
    let mut texts = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        texts.push(msg.param(1).unwrap_or_default().to_owned());
    }
    texts
}

#[tokio::test]
async fn announces_oldest_first_regardless_of_feed_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut poller, mut rx) = test_poller(dir.path().join("cursor")).await;

    let emitted = poller
        .announce(vec![item("three", 3), item("one", 1), item("two", 2)])
        .await;

    assert!(emitted);
    assert_eq!(drain(&mut rx), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn items_at_or_below_cursor_never_reannounced() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cursor");
    std::fs::write(&path, "2").expect("seed cursor file");

    let (mut poller, mut rx) = test_poller(path).await;
    let emitted = poller
        .announce(vec![item("one", 1), item("two", 2), item("three", 3)])
        .await;

    assert!(emitted);
    assert_eq!(drain(&mut rx), vec!["three"]);
}

#[tokio::test]
async fn reannouncing_same_items_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut poller, mut rx) = test_poller(dir.path().join("cursor")).await;

    let items = vec![item("one", 1), item("two", 2)];
    assert!(poller.announce(items.clone()).await);
    assert_eq!(drain(&mut rx).len(), 2);

    // The same poll result again: nothing new.
    assert!(!poller.announce(items).await);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn cursor_file_tracks_each_emission() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cursor");
    let (mut poller, mut rx) = test_poller(path.clone()).await;

    poller.announce(vec![item("one", 10)]).await;
    assert_eq!(
        std::fs::read_to_string(&path).expect("cursor file"),
        "10",
        "cursor must be durable right after the emission"
    );

    poller.announce(vec![item("two", 20)]).await;
    assert_eq!(std::fs::read_to_string(&path).expect("cursor file"), "20");
    assert_eq!(drain(&mut rx).len(), 2);
}

#[tokio::test]
async fn restart_resumes_from_persisted_cursor() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cursor");

    {
        let (mut poller, mut rx) = test_poller(path.clone()).await;
        poller.announce(vec![item("one", 1), item("two", 2)]).await;
        assert_eq!(drain(&mut rx).len(), 2);
    }

    // A fresh poller (a restarted process) sees the same feed: only the
    // genuinely new item goes out.
    let (mut poller, mut rx) = test_poller(path).await;
    poller
        .announce(vec![item("one", 1), item("two", 2), item("three", 3)])
        .await;
    assert_eq!(drain(&mut rx), vec!["three"]);
}

#[tokio::test]
async fn empty_poll_announces_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut poller, mut rx) = test_poller(dir.path().join("cursor")).await;

    assert!(!poller.announce(Vec::new()).await);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn announcement_uses_description_when_short() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut poller, mut rx) = test_poller(dir.path().join("cursor")).await;

    let mut short = item("Title A", 1);
    short.description = "a short summary".to_owned();
    let mut long = item("Title B", 2);
    long.description = "b".repeat(600);

    poller.announce(vec![short, long]).await;
    assert_eq!(drain(&mut rx), vec!["a short summary", "Title B"]);
}
