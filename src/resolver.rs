//! The resolution chain: feed discovery first, HTML heading extraction
//! second, the alternate transport last, strictly in that order.

use crate::feed::{discover, extract_items};
use crate::scrape::extract_headings;
use crate::source::{ResolutionResult, Source};
use crate::transport::{FetchOutcome, HeaderProfile, Transport, TransportError, DEFAULT_TIMEOUT};

/// One named strategy in the resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Feed discovery and item extraction over every seed.
    Feed,
    /// Heading extraction with the standard page client.
    Html,
    /// Heading extraction with the alternate client.
    HtmlAlternate,
}

/// The chain evaluated for one source, in order.
pub fn phase_chain(allow_alternate: bool) -> &'static [Phase] {
    if allow_alternate {
        &[Phase::Feed, Phase::Html, Phase::HtmlAlternate]
    } else {
        &[Phase::Feed, Phase::Html]
    }
}

/// Resolves one source to a headline list.
///
/// Phases run strictly in order and the first one to produce a result
/// ends the chain. A feed found by discovery is definitive even when the
/// keyword filter leaves it empty; the HTML phases are consulted only
/// when no usable feed exists at all. When every phase comes up empty the
/// result is the first seed URL with no items, which the caller reports
/// as such rather than treating as an error.
///
/// # Errors
///
/// Only client construction can fail here. Every network failure inside
/// a phase is absorbed as "try the next thing".
pub async fn resolve(
    source: &Source,
    allow_alternate: bool,
) -> Result<ResolutionResult, TransportError> {
    for phase in phase_chain(allow_alternate) {
        tracing::debug!(source = %source.name, phase = ?phase, "starting resolution phase");
        if let Some(result) = run_phase(*phase, source).await? {
            tracing::info!(
                source = %source.name,
                phase = ?phase,
                url = %result.url,
                items = result.items.len(),
                "source resolved"
            );
            return Ok(result);
        }
    }

    tracing::info!(source = %source.name, "no phase produced headlines");
    Ok(ResolutionResult {
        url: source.seeds.first().cloned().unwrap_or_default(),
        items: Vec::new(),
    })
}

async fn run_phase(
    phase: Phase,
    source: &Source,
) -> Result<Option<ResolutionResult>, TransportError> {
    match phase {
        Phase::Feed => feed_phase(source).await,
        Phase::Html => html_phase(source, false).await,
        Phase::HtmlAlternate => html_phase(source, true).await,
    }
}

/// Runs feed discovery over the seeds in order. The first seed that
/// discovery turns into a feed decides the phase, whatever the item
/// count after filtering.
async fn feed_phase(source: &Source) -> Result<Option<ResolutionResult>, TransportError> {
    let feeds = Transport::build(HeaderProfile::Feed, false, DEFAULT_TIMEOUT)?;
    let pages = Transport::build(HeaderProfile::Page, false, DEFAULT_TIMEOUT)?;

    for seed in &source.seeds {
        if let Some(resolved) = discover(&feeds, &pages, seed).await {
            let items = extract_items(&resolved.feed, source.keyword.as_deref(), source.limit);
            return Ok(Some(ResolutionResult { url: resolved.url, items }));
        }
    }
    Ok(None)
}

/// Runs heading extraction over the seeds in order. Unlike the feed
/// phase, an empty extraction does not decide anything: the next seed
/// (and then the next phase) still gets its chance.
async fn html_phase(
    source: &Source,
    use_alternate: bool,
) -> Result<Option<ResolutionResult>, TransportError> {
    let pages = Transport::build(HeaderProfile::Page, use_alternate, DEFAULT_TIMEOUT)?;

    for seed in &source.seeds {
        match extract_headings(&pages, seed, source.keyword.as_deref(), source.limit).await {
            FetchOutcome::Success(items) if !items.is_empty() => {
                return Ok(Some(ResolutionResult { url: seed.clone(), items }));
            }
            FetchOutcome::Success(_) => {
                tracing::debug!(%seed, "page fetched but no matching headings");
            }
            FetchOutcome::Blocked => {
                tracing::debug!(%seed, use_alternate, "page blocked");
            }
            FetchOutcome::NotFound | FetchOutcome::TransportError => {
                tracing::debug!(%seed, "page fetch failed");
            }
        }
    }
    Ok(None)
}
