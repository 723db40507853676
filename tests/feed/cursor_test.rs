//! Tests for `src/feed/cursor.rs` — durable cursor load and advance.

use skald::feed::cursor::FeedCursor;

#[tokio::test]
async fn missing_file_loads_as_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cursor = FeedCursor::load(dir.path().join("cursor")).await;
    assert_eq!(cursor.value(), 0);
}

#[tokio::test]
async fn unparseable_file_loads_as_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cursor");
    std::fs::write(&path, "not a number").expect("write");

    let cursor = FeedCursor::load(path).await;
    assert_eq!(cursor.value(), 0);
}

#[tokio::test]
async fn advance_persists_and_survives_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cursor");

    let mut cursor = FeedCursor::load(path.clone()).await;
    cursor.advance(1_700_000_000).await;
    assert_eq!(cursor.value(), 1_700_000_000);

    let reloaded = FeedCursor::load(path).await;
    assert_eq!(reloaded.value(), 1_700_000_000);
}

#[tokio::test]
async fn advance_writes_plain_decimal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cursor");

    let mut cursor = FeedCursor::load(path.clone()).await;
    cursor.advance(42).await;

    let contents = std::fs::read_to_string(&path).expect("cursor file");
    assert_eq!(contents, "42");
}

#[tokio::test]
async fn advance_creates_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state").join("deep").join("cursor");

    let mut cursor = FeedCursor::load(path.clone()).await;
    cursor.advance(7).await;

    let reloaded = FeedCursor::load(path).await;
    assert_eq!(reloaded.value(), 7);
}

#[tokio::test]
async fn whitespace_around_value_tolerated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cursor");
    std::fs::write(&path, "99\n").expect("write");

    let cursor = FeedCursor::load(path).await;
    assert_eq!(cursor.value(), 99);
}
