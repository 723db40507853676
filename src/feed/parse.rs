//! Minimal RSS item extraction.
//!
//! Deterministic string extraction over a full XML parser: pull `<item>`
//! blocks, read `<title>`, `<description>` and `<pubDate>` from each, and
//! skip anything that does not carry a parseable RFC 2822 date. Feeds are
//! consumed, not validated.

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

/// Descriptions at least this long are unreadable in a channel; fall back
/// to the title.
const MAX_DESCRIPTION_CHARS: usize = 500;

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").expect("static pattern"));

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title[^>]*>(.*?)</title>").expect("static pattern"));

static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<description[^>]*>(.*?)</description>").expect("static pattern")
});

static PUB_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<pubDate[^>]*>(.*?)</pubDate>").expect("static pattern"));

/// One feed entry, reduced to what the poller needs.
#[derive(Debug, Clone)]
pub struct FeedItem {
    /// Item headline.
    pub title: String,
    /// Item body/summary, possibly empty.
    pub description: String,
    /// Publication time, epoch seconds.
    pub timestamp: i64,
}

/// Extract feed items in document order.
///
/// Items without a parseable `<pubDate>` are dropped — without a timestamp
/// the cursor cannot order or deduplicate them.
pub fn parse_items(xml: &str) -> Vec<FeedItem> {
    ITEM_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let block = caps.get(1)?.as_str();
            let date = field(block, &PUB_DATE_RE)?;
            let timestamp = DateTime::parse_from_rfc2822(&date).ok()?.timestamp();
            Some(FeedItem {
                title: field(block, &TITLE_RE).unwrap_or_default(),
                description: field(block, &DESCRIPTION_RE).unwrap_or_default(),
                timestamp,
            })
        })
        .collect()
}

/// Channel line for an item: the description when it is short enough to be
/// readable, the title otherwise. Embedded CR/LF are flattened away.
pub fn announcement_text(item: &FeedItem) -> String {
    let prefer_description = !item.description.is_empty()
        && item.description.chars().count() < MAX_DESCRIPTION_CHARS;
    let text = if prefer_description {
        &item.description
    } else {
        &item.title
    };
    text.replace('\r', "")
        .replace('\n', " ")
        .trim()
        .to_owned()
}

/// First capture of `re` in `block`, CDATA-unwrapped, entity-decoded, trimmed.
fn field(block: &str, re: &Regex) -> Option<String> {
    let raw = re.captures(block)?.get(1)?.as_str().trim();
    Some(decode_entities(strip_cdata(raw)).trim().to_owned())
}

/// Unwrap a `<![CDATA[...]]>` section, if present.
fn strip_cdata(text: &str) -> &str {
    text.strip_prefix("<![CDATA[")
        .and_then(|inner| inner.strip_suffix("]]>"))
        .unwrap_or(text)
}

/// Decode the handful of entities feeds actually use.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
