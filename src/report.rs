//! Report rendering: one labeled block per source, identical on the
//! console and in the mirrored file.

use crate::source::ResolutionResult;

/// Placeholder line for a source that produced nothing.
const EMPTY_NOTE: &str = "(no items or blocked)";

/// Renders one source block:
///
/// ```text
/// === BBC [https://feeds.bbci.co.uk/news/rss.xml] ===
/// 01. Example headline
///     https://example.com/story
/// ```
///
/// Items without links (HTML-extracted headlines) get no link line, and
/// an empty result renders the placeholder note instead of items.
pub fn format_block(name: &str, result: &ResolutionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} [{}] ===\n", name.to_uppercase(), result.url));
    if result.items.is_empty() {
        out.push_str(EMPTY_NOTE);
        out.push('\n');
        return out;
    }
    for (index, item) in result.items.iter().enumerate() {
        out.push_str(&format!("{:02}. {}\n", index + 1, item.title));
        if !item.link.is_empty() {
            out.push_str(&format!("    {}\n", item.link));
        }
    }
    out
}

/// Renders the whole report: blocks in request order, a blank line after
/// each block.
pub fn render_report<'a, I>(results: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a ResolutionResult)>,
{
    let mut out = String::new();
    for (name, result) in results {
        out.push_str(&format_block(name, result));
        out.push('\n');
    }
    out
}
