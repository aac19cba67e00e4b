use feed_rs::model::Feed;

use crate::source::{effective_limit, Headline};
use crate::util::{contains_keyword, tidy_text};

/// Converts a parsed feed into ordered headlines.
///
/// Walks the first `effective_limit(limit)` entries in document order and
/// keeps those with a non-empty cleaned title that passes the keyword
/// filter. The window is taken before filtering, so a narrow keyword can
/// legitimately return fewer than `limit` items. Entries are trusted as
/// the publisher ordered them; no deduplication happens here.
pub fn extract_items(feed: &Feed, keyword: Option<&str>, limit: i64) -> Vec<Headline> {
    let mut items = Vec::new();
    for entry in feed.entries.iter().take(effective_limit(limit)) {
        let title = entry
            .title
            .as_ref()
            .map(|text| tidy_text(&text.content))
            .unwrap_or_default();
        if title.is_empty() {
            continue;
        }
        if let Some(keyword) = keyword {
            if !contains_keyword(&title, keyword) {
                continue;
            }
        }
        let link = entry.links.first().map(|link| link.href.clone()).unwrap_or_default();
        items.push(Headline { title, link });
    }
    items
}
