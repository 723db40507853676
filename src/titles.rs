//! URL → one-line channel summary.
//!
//! A HEAD request classifies the resource: non-HTML gets a `host:
//! content-type [size]` line, HTML gets fetched (bounded) and mined for a
//! title. Every failure degrades to "say nothing" — nothing here returns an
//! error past this boundary, and the operator sees failures only in the log.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::dedup::DedupCache;

/// Read at most this many body bytes, no matter how large the page claims to be.
const MAX_BODY_BYTES: usize = 256_000;

/// Video platform whose pages hide the title in embedded player JSON.
const VIDEO_HOST: &str = "youtube.com";

/// User agent that convinces the video platform to serve plain markup.
const VIDEO_USER_AGENT: &str = "please just show the title";

/// Social platform that blocks anonymous fetches.
const BLOCKED_HOST: &str = "twitter.com";

/// Open mirror used in place of [`BLOCKED_HOST`].
const MIRROR_HOST: &str = "nitter.net";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title[^>]*>(.*?)</title>").expect("static pattern"));

static VIDEO_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#","title":\{"simpleText":"(.*?)"\},"description":\{"s"#).expect("static pattern")
});

/// Resolves URLs into one-line summaries, remembering what it already handled.
pub struct TitleResolver {
    http: reqwest::Client,
    dedup: DedupCache,
}

impl TitleResolver {
    /// Create a resolver over the given dedup cache.
    pub fn new(dedup: DedupCache) -> Self {
        Self {
            http: reqwest::Client::new(),
            dedup,
        }
    }

    /// Resolve a URL into a line worth saying, or an empty string for
    /// "nothing to say" — recently-handled URLs, fetch failures, and
    /// title-less pages all land there.
    pub async fn resolve(&self, url: &str) -> String {
        if !self.dedup.should_process(url) {
            debug!(url, "recently handled, skipping");
            return String::new();
        }

        let head = match self.http.head(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url, error = %e, "failed to fetch link");
                return String::new();
            }
        };

        let content_type = head
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();

        if content_type.contains("html") {
            return self.html_title(url).await;
        }

        // Host from the final URL, after any redirects.
        let host = head.url().host_str().unwrap_or("").to_owned();
        summary_line(&host, &content_type, head.content_length())
    }

    /// The HTML path: full (bounded) GET plus host-specific request shaping.
    async fn html_title(&self, url: &str) -> String {
        let Ok(mut target) = Url::parse(url) else {
            return String::new();
        };

        let video = target
            .host_str()
            .is_some_and(|h| host_matches(h, VIDEO_HOST));
        if target
            .host_str()
            .is_some_and(|h| host_matches(h, BLOCKED_HOST))
            && target.set_host(Some(MIRROR_HOST)).is_err()
        {
            return String::new();
        }

        let mut request = self.http.get(target);
        if video {
            request = request
                .header(reqwest::header::USER_AGENT, VIDEO_USER_AGENT)
                .header(reqwest::header::ACCEPT, "*/*");
        }

        let mut resp = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "failed to fetch link");
                return String::new();
            }
        };

        let host = resp.url().host_str().unwrap_or("").to_owned();
        let body = bounded_body(&mut resp).await;

        match extract_title(&body, video) {
            Some(title) => {
                let line = format!("{host}: {title}");
                line.trim_matches(['\r', '\n', ' ', '\t']).to_owned()
            }
            None => {
                info!(url, "no title pattern matched");
                String::new()
            }
        }
    }
}

/// Summary for non-HTML resources: `host: content-type [n kb]`.
///
/// An unknown declared length counts as zero.
fn summary_line(host: &str, content_type: &str, length: Option<u64>) -> String {
    let kb = length.unwrap_or(0) / 1024;
    format!("{host}: {content_type} [{kb} kb]")
}

/// Pull the title out of a page body with the host-appropriate pattern.
fn extract_title(body: &str, video: bool) -> Option<String> {
    let re: &Regex = if video { &VIDEO_TITLE_RE } else { &TITLE_RE };
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Whether `host` is `domain` or a subdomain of it.
fn host_matches(host: &str, domain: &str) -> bool {
    host.strip_suffix(domain)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
}

/// Accumulate at most [`MAX_BODY_BYTES`] of the response body.
///
/// A mid-body transport error keeps whatever arrived — a partial page may
/// still contain the title tag.
async fn bounded_body(resp: &mut reqwest::Response) -> String {
    let mut buf: Vec<u8> = Vec::new();
    loop {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let remaining = MAX_BODY_BYTES.saturating_sub(buf.len());
                let take = remaining.min(chunk.len());
                buf.extend_from_slice(&chunk[..take]);
                if buf.len() >= MAX_BODY_BYTES {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "body read ended early");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
