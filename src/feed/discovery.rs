use std::collections::BTreeSet;
use std::sync::OnceLock;
use std::time::Duration;

use feed_rs::model::Feed;
use scraper::{Html, Selector};
use url::Url;

use crate::feed::probe::probe;
use crate::transport::{read_capped_body, FetchOutcome, Transport};

/// Pause before re-probing a URL whose page fetch came back with an XML
/// content type; such servers often serve the feed cleanly on the second
/// touch.
const REPROBE_DELAY: Duration = Duration::from_millis(200);

/// Paths worth trying on any origin when the page itself names no feed.
const WELL_KNOWN_FEED_PATHS: &[&str] =
    &["/rss", "/rss.xml", "/feed", "/feed.xml", "/atom.xml", "/index.xml"];

/// Substrings that make an anchor href look like a feed.
const FEED_HREF_TOKENS: &[&str] = &[".xml", "/rss", "rss.xml", "atom.xml", "/feed"];

/// A feed located by [`discover`]: the URL that actually answered and its
/// parsed document.
#[derive(Debug, Clone)]
pub struct ResolvedFeed {
    /// URL the usable feed was served from (not necessarily the seed).
    pub url: String,
    /// The parsed feed, guaranteed to carry at least one entry.
    pub feed: Feed,
}

/// Locates a usable feed starting from `url`, which may already be a feed
/// URL or may be an HTML page that advertises one.
///
/// The URL itself is probed first, so explicit feed URLs cost a single
/// request. Otherwise the page is fetched once through `pages` and mined
/// for candidates: advertised `<link>` feeds, feed-looking anchors, and
/// the well-known paths, all resolved against the page origin and probed
/// in deterministic order until one yields a feed with entries. An XML
/// content type on the page fetch instead triggers one delayed re-probe
/// of the original URL.
///
/// `None` means no usable feed anywhere; the caller's HTML fallback is
/// the answer to that, so no error detail survives past the debug log.
pub async fn discover(feeds: &Transport, pages: &Transport, url: &str) -> Option<ResolvedFeed> {
    if let FetchOutcome::Success(feed) = probe(feeds, url).await {
        return Some(ResolvedFeed { url: url.to_owned(), feed });
    }

    let response = match pages.get(url).await {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%url, error = %error, "discovery page fetch failed");
            return None;
        }
    };

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if content_type.contains("xml") && !content_type.contains("html") {
        tracing::debug!(%url, %content_type, "page fetch returned XML, re-probing");
        tokio::time::sleep(REPROBE_DELAY).await;
        return match probe(feeds, url).await {
            FetchOutcome::Success(feed) => Some(ResolvedFeed { url: url.to_owned(), feed }),
            _ => None,
        };
    }

    let body = match read_capped_body(response).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(%url, error = %error, "discovery page body read failed");
            return None;
        }
    };
    let html = String::from_utf8_lossy(&body);

    let candidates = collect_candidates(&html, url);
    tracing::debug!(%url, count = candidates.len(), "probing feed candidates");

    for candidate in candidates {
        if let FetchOutcome::Success(feed) = probe(feeds, &candidate).await {
            return Some(ResolvedFeed { url: candidate, feed });
        }
    }

    tracing::debug!(%url, "no candidate produced a usable feed");
    None
}

/// Collects the candidate feed URLs a page suggests: `<link>` tags whose
/// type, rel, or href smells of syndication, anchors with feed-looking
/// hrefs, and the well-known paths. Everything is resolved absolute
/// against the page origin; the sorted set keeps probe order stable
/// across runs.
fn collect_candidates(html: &str, page_url: &str) -> BTreeSet<String> {
    let mut candidates = BTreeSet::new();
    let Some(origin) = page_origin(page_url) else {
        return candidates;
    };

    let document = Html::parse_document(html);

    for link in document.select(link_selector()) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let kind = link.value().attr("type").unwrap_or("").to_lowercase();
        let rel = link.value().attr("rel").unwrap_or("").to_lowercase();
        if kind.contains("rss")
            || kind.contains("atom")
            || href.to_lowercase().contains("xml")
            || rel.contains("rss")
        {
            push_joined(&mut candidates, &origin, href);
        }
    }

    for anchor in document.select(anchor_selector()) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let lowered = href.to_lowercase();
        if FEED_HREF_TOKENS.iter().any(|token| lowered.contains(token)) {
            push_joined(&mut candidates, &origin, href);
        }
    }

    for path in WELL_KNOWN_FEED_PATHS {
        push_joined(&mut candidates, &origin, path);
    }

    candidates
}

fn push_joined(candidates: &mut BTreeSet<String>, origin: &Url, href: &str) {
    if let Ok(resolved) = origin.join(href) {
        candidates.insert(resolved.to_string());
    }
}

/// The scheme+authority of `url`, which all candidate hrefs resolve
/// against. `None` for unparseable or non-hierarchical URLs.
fn page_origin(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }
    Url::parse(&origin.ascii_serialization()).ok()
}

fn link_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("link[href]").expect("static selector"))
}

fn anchor_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("a[href]").expect("static selector"))
}
