//! Outbound HTTP: browser-like header profiles, an explicit retry policy
//! with exponential backoff, and an alternate client variant for origins
//! that block the standard one.
//!
//! Construction is the only fallible step. Once built, a [`Transport`]
//! absorbs transient failures inside its retry budget and hands the final
//! response (or a terminal error) back for the caller to classify. A
//! served 403 is never retried: that status is a block signal the
//! fallback chain must see immediately.

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, PRAGMA, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use reqwest::redirect;
use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Per-request timeout when the caller does not choose one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound on any response body this crate will buffer.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Connect phase gets at most this much of the overall timeout.
const CONNECT_TIMEOUT_CAP: Duration = Duration::from_secs(10);

/// Redirect hops followed before giving up on a URL.
const MAX_REDIRECTS: usize = 5;

/// Desktop Chrome user-agent sent by the standard clients.
const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

const ACCEPT_FEED: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8,*/*;q=0.1";
const ACCEPT_PAGE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANG: &str = "uk-UA,uk;q=0.9,en-US;q=0.8,en;q=0.7";

/// User-agents the alternate client rotates through. Selection is keyed
/// on the target URL so one origin always sees the same browser.
const ALTERNATE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/126.0.0.0 Safari/537.36",
];

/// Which `Accept` family a client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Prefer RSS/Atom/XML documents.
    Feed,
    /// Prefer HTML documents.
    Page,
}

/// Retry behaviour attached to a transport.
///
/// `retry_statuses` deliberately excludes 403. A served forbidden
/// response is terminal for the URL; retrying it only burns time against
/// a wall the fallback chain is built to walk around.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt of each request.
    pub max_retries: u32,
    /// First backoff delay; doubles on every further retry.
    pub backoff: Duration,
    /// Response statuses that consume a retry.
    pub retry_statuses: &'static [StatusCode],
    /// Methods allowed to retry at all.
    pub retry_methods: &'static [Method],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(500),
            retry_statuses: &[
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
            retry_methods: &[Method::GET, Method::HEAD],
        }
    }
}

impl RetryPolicy {
    fn retries_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status)
    }

    fn retries_method(&self, method: &Method) -> bool {
        self.retry_methods.contains(method)
    }

    /// Delay before retry number `retry` (zero-based): backoff, 2x, 4x...
    fn delay_before(&self, retry: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(retry)
    }
}

/// Errors a [`Transport`] can surface. Network errors appear only after
/// the retry budget is spent; everything else is construction or a body
/// that breaks the buffering cap.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The standard client could not be constructed. A local TLS or
    /// runtime problem, not a network condition.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    /// DNS, connect, TLS, timeout, or body error after retries.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The response body exceeded [`MAX_BODY_BYTES`].
    #[error("response body exceeds {} bytes", MAX_BODY_BYTES)]
    BodyTooLarge,
}

/// What fetching one URL produced, after transport-side retries.
///
/// Probes and extractors fold every failure into a value so discovery
/// and fallback can keep trying subsequent candidates, while callers
/// still distinguish "nothing usable there" from "actively blocked".
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    /// The fetch succeeded and the body qualified.
    Success(T),
    /// The fetch succeeded but the body did not qualify (not a usable
    /// feed, or no matching headings).
    NotFound,
    /// A served 403: this URL refuses automated access. Terminal for the
    /// URL; callers move on to the next strategy instead of retrying.
    Blocked,
    /// DNS failure, connection error, timeout, or retry exhaustion.
    TransportError,
}

impl<T> FetchOutcome<T> {
    /// The payload, when this outcome carries one.
    pub fn success(self) -> Option<T> {
        match self {
            FetchOutcome::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// A configured HTTP client plus the retry policy applied to every
/// request issued through it.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    policy: RetryPolicy,
    alternate: bool,
}

impl Transport {
    /// Builds the transport for one resolution phase. Performs no network
    /// I/O.
    ///
    /// `use_alternate` asks for the browser-imitating variant. When that
    /// variant cannot be constructed the standard client is used
    /// silently; degraded imitation beats a dead phase.
    ///
    /// # Errors
    ///
    /// Only when the standard client itself cannot be built, which means
    /// the local TLS or runtime setup is broken.
    pub fn build(
        profile: HeaderProfile,
        use_alternate: bool,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Self::build_with_policy(profile, use_alternate, timeout, RetryPolicy::default())
    }

    /// Same as [`Transport::build`] with a caller-supplied retry policy,
    /// so tests can shrink the backoff schedule.
    pub fn build_with_policy(
        profile: HeaderProfile,
        use_alternate: bool,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self, TransportError> {
        let mut client = None;
        if use_alternate {
            match alternate_client(profile, timeout) {
                Ok(built) => client = Some(built),
                Err(error) => {
                    tracing::debug!(error = %error, "alternate client unavailable, using standard client");
                }
            }
        }

        let alternate = client.is_some();
        let client = match client {
            Some(client) => client,
            None => standard_client(profile, timeout).map_err(TransportError::Build)?,
        };

        Ok(Self { client, policy, alternate })
    }

    /// Issues a GET for `url`, retrying per the policy.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] once the retry budget is spent
    /// on connection-level failures. A response with a non-success status
    /// is NOT an error here; the caller classifies statuses.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        self.send(Method::GET, url, HeaderMap::new()).await
    }

    /// Same as [`Transport::get`] with a `Referer` header attached.
    pub async fn get_with_referer(
        &self,
        url: &str,
        referer: &str,
    ) -> Result<reqwest::Response, TransportError> {
        let mut extra = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(referer) {
            extra.insert(REFERER, value);
        }
        self.send(Method::GET, url, extra).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        extra: HeaderMap,
    ) -> Result<reqwest::Response, TransportError> {
        let retryable = self.policy.retries_method(&method);
        let mut retry = 0u32;
        loop {
            let mut request = self.client.request(method.clone(), url).headers(extra.clone());
            if self.alternate {
                request = request.header(USER_AGENT, rotated_user_agent(url));
            }
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if retryable
                        && self.policy.retries_status(status)
                        && retry < self.policy.max_retries
                    {
                        let delay = self.policy.delay_before(retry);
                        tracing::debug!(
                            %url,
                            status = status.as_u16(),
                            retry = retry + 1,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after retryable status"
                        );
                        tokio::time::sleep(delay).await;
                        retry += 1;
                        continue;
                    }
                    // 403 lands here on the first pass; block signals
                    // reach the caller with zero retries spent.
                    return Ok(response);
                }
                Err(error) => {
                    // Malformed URLs and redirect-policy failures are
                    // permanent for this URL.
                    let permanent = error.is_builder() || error.is_redirect();
                    if retryable && !permanent && retry < self.policy.max_retries {
                        let delay = self.policy.delay_before(retry);
                        tracing::debug!(
                            %url,
                            error = %error,
                            retry = retry + 1,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after transport error"
                        );
                        tokio::time::sleep(delay).await;
                        retry += 1;
                        continue;
                    }
                    return Err(TransportError::Network(error));
                }
            }
        }
    }
}

/// Reads a response body up to [`MAX_BODY_BYTES`], streaming so an absent
/// or lying `Content-Length` cannot exhaust memory.
///
/// # Errors
///
/// [`TransportError::BodyTooLarge`] past the cap, or
/// [`TransportError::Network`] if the connection dies mid-body.
pub async fn read_capped_body(response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
    if let Some(length) = response.content_length() {
        if length > MAX_BODY_BYTES as u64 {
            return Err(TransportError::BodyTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > MAX_BODY_BYTES {
            return Err(TransportError::BodyTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn standard_client(
    profile: HeaderProfile,
    timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .default_headers(profile_headers(profile))
        .redirect(redirect_policy())
        .timeout(timeout)
        .connect_timeout(timeout.min(CONNECT_TIMEOUT_CAP))
        .pool_max_idle_per_host(2)
        .build()
}

fn alternate_client(
    profile: HeaderProfile,
    timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .default_headers(alternate_headers(profile))
        .redirect(redirect_policy())
        .timeout(timeout)
        .connect_timeout(timeout.min(CONNECT_TIMEOUT_CAP))
        .cookie_store(true)
        .build()
}

fn profile_headers(profile: HeaderProfile) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    match profile {
        HeaderProfile::Feed => {
            headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_FEED));
        }
        HeaderProfile::Page => {
            headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_PAGE));
            headers.insert(DNT, HeaderValue::from_static("1"));
            headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        }
    }
    headers
}

/// Client-hint and fetch-metadata headers a real desktop Chrome sends.
fn alternate_headers(profile: HeaderProfile) -> HeaderMap {
    let mut headers = profile_headers(profile);
    headers.insert(
        "Sec-CH-UA",
        HeaderValue::from_static("\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"126\""),
    );
    headers.insert("Sec-CH-UA-Mobile", HeaderValue::from_static("?0"));
    headers.insert("Sec-CH-UA-Platform", HeaderValue::from_static("\"macOS\""));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    headers
}

fn rotated_user_agent(url: &str) -> &'static str {
    let sum = url.bytes().fold(0usize, |acc, byte| acc.wrapping_add(byte as usize));
    ALTERNATE_USER_AGENTS[sum % ALTERNATE_USER_AGENTS.len()]
}

/// Follows redirects to a shallow depth with loop detection.
fn redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let url = attempt.url();
        if attempt.previous().iter().any(|previous| previous.as_str() == url.as_str()) {
            return attempt.error("redirect loop detected");
        }
        tracing::debug!(to = %url, hop = attempt.previous().len() + 1, "following redirect");
        attempt.follow()
    })
}
