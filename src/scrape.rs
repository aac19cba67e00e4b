//! Fallback extraction: headline candidates scraped from page headings
//! when no usable feed exists.

use std::collections::HashSet;
use std::sync::OnceLock;

use reqwest::StatusCode;
use scraper::{Html, Selector};
use url::Url;

use crate::source::{effective_limit, Headline};
use crate::transport::{read_capped_body, FetchOutcome, Transport};
use crate::util::{contains_keyword, tidy_text};

/// Headings shorter than this many characters are section labels and
/// widget titles, not headlines.
const MIN_HEADING_CHARS: usize = 5;

/// Fetches `url` and extracts its `h1`/`h2`/`h3` texts as headlines.
///
/// The request carries a same-origin `Referer`, making it resemble
/// in-site navigation. A served 403 maps to [`FetchOutcome::Blocked`] so
/// the resolver can escalate to its alternate transport; other failures
/// are plain transport outcomes. Heading texts are cleaned, length
/// filtered, keyword filtered, deduplicated by exact text within this
/// page, and capped at `effective_limit(limit)`. Links stay empty:
/// heading text carries no reliable per-item URL.
pub async fn extract_headings(
    transport: &Transport,
    url: &str,
    keyword: Option<&str>,
    limit: i64,
) -> FetchOutcome<Vec<Headline>> {
    let referer = same_origin_referer(url);
    let result = match referer.as_deref() {
        Some(referer) => transport.get_with_referer(url, referer).await,
        None => transport.get(url).await,
    };
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%url, error = %error, "heading fetch transport failure");
            return FetchOutcome::TransportError;
        }
    };

    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        tracing::debug!(%url, "heading fetch blocked");
        return FetchOutcome::Blocked;
    }
    if !status.is_success() {
        tracing::debug!(%url, status = status.as_u16(), "heading fetch failed");
        return FetchOutcome::TransportError;
    }

    let body = match read_capped_body(response).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(%url, error = %error, "heading body read failed");
            return FetchOutcome::TransportError;
        }
    };

    let html = String::from_utf8_lossy(&body);
    FetchOutcome::Success(headings_from_html(&html, keyword, limit))
}

/// The pure extraction half, split out so it is testable without a
/// server.
fn headings_from_html(html: &str, keyword: Option<&str>, limit: i64) -> Vec<Headline> {
    let cap = effective_limit(limit);
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for element in document.select(heading_selector()) {
        let text = tidy_text(&element.text().collect::<String>());
        if text.chars().count() < MIN_HEADING_CHARS {
            continue;
        }
        if let Some(keyword) = keyword {
            if !contains_keyword(&text, keyword) {
                continue;
            }
        }
        if !seen.insert(text.clone()) {
            continue;
        }
        items.push(Headline { title: text, link: String::new() });
        if items.len() >= cap {
            break;
        }
    }
    items
}

/// `Referer: <origin>/` for hierarchical URLs, `None` otherwise.
fn same_origin_referer(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/", origin.ascii_serialization()))
}

fn heading_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("h1, h2, h3").expect("static selector"))
}
