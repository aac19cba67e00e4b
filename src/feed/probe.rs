use feed_rs::model::Feed;
use reqwest::StatusCode;

use crate::transport::{read_capped_body, FetchOutcome, Transport};

/// Fetches `url` once through `transport` and classifies the result.
///
/// A usable feed parses as RSS or Atom and carries at least one entry; a
/// well-formed feed with zero entries is as useless to a headline reader
/// as an HTML page, so both classify as [`FetchOutcome::NotFound`]. A
/// served 403 maps to [`FetchOutcome::Blocked`]. The probe never returns
/// an error: discovery calls it against many URLs that are expected to
/// miss.
pub async fn probe(transport: &Transport, url: &str) -> FetchOutcome<Feed> {
    let response = match transport.get(url).await {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%url, error = %error, "feed probe transport failure");
            return FetchOutcome::TransportError;
        }
    };

    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        tracing::debug!(%url, "feed probe blocked");
        return FetchOutcome::Blocked;
    }
    if !status.is_success() {
        tracing::debug!(%url, status = status.as_u16(), "feed probe fetch failed");
        return FetchOutcome::TransportError;
    }

    let bytes = match read_capped_body(response).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(%url, error = %error, "feed probe body read failed");
            return FetchOutcome::TransportError;
        }
    };

    match feed_rs::parser::parse(bytes.as_slice()) {
        Ok(feed) if !feed.entries.is_empty() => FetchOutcome::Success(feed),
        Ok(_) => {
            tracing::debug!(%url, "feed parsed but carries no entries");
            FetchOutcome::NotFound
        }
        Err(error) => {
            tracing::debug!(%url, error = %error, "body is not a parseable feed");
            FetchOutcome::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::transport::{HeaderProfile, RetryPolicy, DEFAULT_TIMEOUT};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Wire</title>
    <link>https://example.com</link>
    <item>
      <guid>1</guid>
      <title>First Story</title>
      <link>https://example.com/story/1</link>
    </item>
  </channel>
</rss>"#;

    const EMPTY_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Quiet Wire</title>
    <link>https://example.com</link>
  </channel>
</rss>"#;

    fn test_transport() -> Transport {
        let policy = RetryPolicy {
            max_retries: 0,
            backoff: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        Transport::build_with_policy(HeaderProfile::Feed, false, DEFAULT_TIMEOUT, policy).unwrap()
    }

    #[tokio::test]
    async fn test_probe_succeeds_on_feed_with_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/rss+xml")
                    .set_body_string(VALID_RSS),
            )
            .mount(&server)
            .await;

        let outcome = probe(&test_transport(), &format!("{}/feed", server.uri())).await;

        let feed = outcome.success().expect("expected a parsed feed");
        assert_eq!(feed.entries.len(), 1);
        assert_eq!(feed.entries[0].title.as_ref().unwrap().content, "First Story");
    }

    #[tokio::test]
    async fn test_probe_classifies_html_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/html")
                    .set_body_string("<html><body>Front page</body></html>"),
            )
            .mount(&server)
            .await;

        let outcome = probe(&test_transport(), &format!("{}/page", server.uri())).await;

        assert!(matches!(outcome, FetchOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_probe_classifies_entryless_feed_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/rss+xml")
                    .set_body_string(EMPTY_RSS),
            )
            .mount(&server)
            .await;

        let outcome = probe(&test_transport(), &format!("{}/feed", server.uri())).await;

        assert!(matches!(outcome, FetchOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_probe_maps_forbidden_to_blocked_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        // Full retry budget available; 403 must not consume any of it.
        let transport =
            Transport::build(HeaderProfile::Feed, false, DEFAULT_TIMEOUT).unwrap();
        let outcome = probe(&transport, &format!("{}/feed", server.uri())).await;

        assert!(matches!(outcome, FetchOutcome::Blocked));
    }

    #[tokio::test]
    async fn test_probe_maps_not_found_status_to_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = probe(&test_transport(), &format!("{}/feed", server.uri())).await;

        assert!(matches!(outcome, FetchOutcome::TransportError));
    }

    #[tokio::test]
    async fn test_probe_maps_connection_failure_to_transport_error() {
        // Nothing listens on this port.
        let outcome = probe(&test_transport(), "http://127.0.0.1:9/feed").await;

        assert!(matches!(outcome, FetchOutcome::TransportError));
    }
}
