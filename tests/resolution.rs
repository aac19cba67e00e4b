//! Integration tests for end-to-end source resolution: seed priority,
//! feed-over-scrape preference, strict fallback ordering, alternate
//! client gating, and block handling.
//!
//! Each test stands up its own wiremock server(s); nothing leaves
//! localhost.

use masthead::report::format_block;
use masthead::resolver::resolve;
use masthead::source::Source;
use pretty_assertions::assert_eq;
use wiremock::matchers::{any, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Wire</title>
    <link>https://example.com</link>
    <item>
      <guid>1</guid>
      <title>Feed story one</title>
      <link>https://example.com/story/1</link>
    </item>
    <item>
      <guid>2</guid>
      <title>Feed story two</title>
      <link>https://example.com/story/2</link>
    </item>
  </channel>
</rss>"#;

const ATOM_TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Wire</title>
  <id>urn:example:wire</id>
  <updated>2024-05-01T00:00:00Z</updated>
  <entry>
    <id>urn:example:wire:1</id>
    <title>Tech News Today</title>
    <link href="https://example.test/tech-news-today"/>
    <updated>2024-05-01T00:00:00Z</updated>
  </entry>
  <entry>
    <id>urn:example:wire:2</id>
    <title>Sports Roundup</title>
    <link href="https://example.test/sports-roundup"/>
    <updated>2024-05-01T00:00:00Z</updated>
  </entry>
</feed>"#;

const HEADLINE_PAGE: &str = "<html><body>\
    <h1>Morning briefing headline</h1>\
    <h2>Markets rally on tech optimism</h2>\
    </body></html>";

fn source(name: &str, seeds: Vec<String>) -> Source {
    Source { name: name.to_string(), seeds, keyword: None, limit: 40 }
}

async fn mount_rss(server: &MockServer, at: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/rss+xml")
                .set_body_string(VALID_RSS),
        )
        .mount(server)
        .await;
}

async fn mount_catch_all(server: &MockServer, status: u16) {
    Mock::given(any()).respond_with(ResponseTemplate::new(status)).mount(server).await;
}

// ============================================================================
// Seed priority and feed preference
// ============================================================================

#[tokio::test]
async fn test_later_seed_resolves_when_the_first_is_dead() {
    let dead = MockServer::start().await;
    mount_catch_all(&dead, 404).await;

    let live = MockServer::start().await;
    mount_rss(&live, "/rss").await;

    let seeds = vec![format!("{}/", dead.uri()), format!("{}/rss", live.uri())];
    let result = resolve(&source("wire", seeds), false).await.unwrap();

    assert_eq!(result.url, format!("{}/rss", live.uri()));
    assert_eq!(result.items.len(), 2);
    // The dead seed was actually consulted before the live one.
    assert!(!dead.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_feed_items_carry_links_from_the_feed() {
    let server = MockServer::start().await;
    mount_rss(&server, "/rss").await;

    let result =
        resolve(&source("wire", vec![format!("{}/rss", server.uri())]), false).await.unwrap();

    assert_eq!(result.items[0].title, "Feed story one");
    assert_eq!(result.items[0].link, "https://example.com/story/1");
}

// ============================================================================
// Fallback ordering
// ============================================================================

#[tokio::test]
async fn test_html_fallback_runs_only_after_every_seed_misses_on_feeds() {
    let dead = MockServer::start().await;
    mount_catch_all(&dead, 404).await;

    let pages = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string(HEADLINE_PAGE),
        )
        .mount(&pages)
        .await;
    mount_catch_all(&pages, 404).await;

    let seeds = vec![format!("{}/", dead.uri()), format!("{}/page", pages.uri())];
    let result = resolve(&source("wire", seeds), true).await.unwrap();

    assert_eq!(result.url, format!("{}/page", pages.uri()));
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].title, "Morning briefing headline");
    assert_eq!(result.items[0].link, "");

    // The page was hit exactly three times: the feed probe, the
    // discovery page fetch, and the standard HTML pass. The permitted
    // alternate pass never ran because the chain had already resolved.
    let page_hits = pages
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/page")
        .count();
    assert_eq!(page_hits, 3);
}

// ============================================================================
// Block handling
// ============================================================================

#[tokio::test]
async fn test_fully_blocked_source_yields_empty_result_without_retries() {
    let server = MockServer::start().await;
    mount_catch_all(&server, 403).await;

    let seeds = vec![format!("{}/ua/feed", server.uri()), format!("{}/en/feed", server.uri())];
    let result = resolve(&source("blocked", seeds.clone()), true).await.unwrap();

    assert_eq!(result.url, seeds[0]);
    assert!(result.items.is_empty());

    // The first seed is touched once per strategy that reaches it (feed
    // probe, discovery page fetch, standard HTML pass, alternate HTML
    // pass). Any retry against a 403 would inflate this count.
    let first_seed_hits = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/ua/feed")
        .count();
    assert_eq!(first_seed_hits, 4);
}

#[tokio::test]
async fn test_alternate_client_recovers_a_blocked_page() {
    let server = MockServer::start().await;
    // The alternate client is recognizable by its client-hint headers;
    // only it gets the real page.
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header_exists("Sec-CH-UA"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string(HEADLINE_PAGE),
        )
        .mount(&server)
        .await;
    mount_catch_all(&server, 403).await;

    let seeds = vec![format!("{}/page", server.uri())];

    let without = resolve(&source("guarded", seeds.clone()), false).await.unwrap();
    assert!(without.items.is_empty(), "standard clients alone must stay blocked");

    let with = resolve(&source("guarded", seeds.clone()), true).await.unwrap();
    assert_eq!(with.url, seeds[0]);
    assert_eq!(with.items.len(), 2);
    assert_eq!(with.items[0].title, "Morning briefing headline");
}

// ============================================================================
// Keyword filtering end to end
// ============================================================================

#[tokio::test]
async fn test_keyword_narrows_an_atom_feed_to_matching_titles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/atom.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/atom+xml")
                .set_body_string(ATOM_TWO_ENTRIES),
        )
        .mount(&server)
        .await;

    let seed = format!("{}/atom.xml", server.uri());
    let mut wire = source("wire", vec![seed.clone()]);
    wire.keyword = Some("tech".to_string());

    let result = resolve(&wire, false).await.unwrap();

    assert_eq!(result.url, seed);
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].title, "Tech News Today");
    assert_eq!(result.items[0].link, "https://example.test/tech-news-today");

    let block = format_block(&wire.name, &result);
    assert_eq!(
        block,
        format!("=== WIRE [{seed}] ===\n01. Tech News Today\n    https://example.test/tech-news-today\n")
    );
}
