//! masthead resolves logical news sources to headline lists.
//!
//! Resolution prefers machine-structured data: every seed URL runs
//! through feed discovery ([`feed::discover`]) and item extraction
//! first. When no usable feed exists anywhere, the resolver falls back
//! to scraping page headings, initially with a standard browser-profile
//! client and, when permitted, once more with an alternate client for
//! origins that block automation. The chain short-circuits on the first
//! phase that produces a result and degrades to an empty result instead
//! of failing.
//!
//! Network trouble never escapes the pipeline: probes and extractors
//! return [`transport::FetchOutcome`] values, and [`resolver::resolve`]
//! reports whatever the chain managed to produce.

pub mod feed;
pub mod report;
pub mod resolver;
pub mod scrape;
pub mod source;
pub mod transport;
pub mod util;
