//! Utility functions for common operations.
//!
//! # Examples
//!
//! ```
//! use masthead::util::{contains_keyword, tidy_text};
//!
//! // Clean a scraped heading for display
//! let title = tidy_text("  Breaking:\n  major story  ");
//! assert_eq!(title, "Breaking: major story");
//!
//! // Unicode-aware keyword filtering
//! assert!(contains_keyword(&title, "BREAKING"));
//! ```

mod text;

pub use text::{contains_keyword, tidy_text};
