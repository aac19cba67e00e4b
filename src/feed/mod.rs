//! The feed side of resolution: probing, discovery, and item extraction.
//!
//! - [`probe`] fetches one URL and decides whether it is a usable feed
//! - [`discover`] runs the probe-then-scan heuristic from an arbitrary URL
//! - [`extract_items`] turns a parsed feed into headline items
//!
//! Everything here folds failure into its return value: discovery probes
//! many URLs that are expected not to be feeds, and the resolver treats a
//! fruitless pass as a signal to fall back, not a fault.

mod discovery;
mod items;
mod probe;

pub use discovery::{discover, ResolvedFeed};
pub use items::extract_items;
pub use probe::probe;
