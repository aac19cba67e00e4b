//! The data model: logical sources, extracted headlines, and the built-in
//! source registry.

/// Cap applied when a caller passes a non-positive limit, bounding the
/// output for misconfigured limits and oversized feeds.
pub const DEFAULT_ITEM_CAP: usize = 50;

/// A logical news origin: an ordered list of candidate URLs plus the
/// filter settings applied to whatever the resolver extracts from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Identifier used in report headings.
    pub name: String,
    /// Candidate URLs in decreasing priority order.
    pub seeds: Vec<String>,
    /// Optional case-insensitive substring filter on titles.
    pub keyword: Option<String>,
    /// Result-count limit; non-positive means [`DEFAULT_ITEM_CAP`].
    pub limit: i64,
}

/// One extracted headline. `link` is empty when the item came from HTML
/// heading extraction, which has no reliable per-item URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub link: String,
}

/// What resolving a source produced: the URL that actually answered (feed
/// or page) and the headlines pulled from it. An empty `items` list is an
/// expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub url: String,
    pub items: Vec<Headline>,
}

/// Number of entries the extractors will consider: the caller's limit when
/// positive, otherwise [`DEFAULT_ITEM_CAP`].
pub fn effective_limit(limit: i64) -> usize {
    if limit > 0 {
        limit as usize
    } else {
        DEFAULT_ITEM_CAP
    }
}

/// A built-in source definition.
#[derive(Debug, Clone, Copy)]
pub struct KnownSource {
    pub name: &'static str,
    pub seeds: &'static [&'static str],
}

impl KnownSource {
    /// Instantiates the registry entry with one run's filter settings.
    pub fn to_source(&self, keyword: Option<String>, limit: i64) -> Source {
        Source {
            name: self.name.to_string(),
            seeds: self.seeds.iter().map(|seed| seed.to_string()).collect(),
            keyword,
            limit,
        }
    }
}

/// Built-in registry. `all` on the command line resolves these top to
/// bottom; seed order within an entry is the order resolution tries them.
pub static KNOWN_SOURCES: &[KnownSource] = &[
    KnownSource {
        name: "bbc",
        seeds: &["https://feeds.bbci.co.uk/news/rss.xml"],
    },
    KnownSource {
        name: "pravda",
        seeds: &[
            "https://www.pravda.com.ua/rss/view_news/",
            "https://www.pravda.com.ua/rss/",
        ],
    },
    KnownSource {
        name: "lb",
        seeds: &["https://lb.ua/rss"],
    },
    KnownSource {
        name: "zn",
        seeds: &["https://zn.ua/rss.xml", "https://zn.ua/ukr/rss"],
    },
    KnownSource {
        name: "censor",
        seeds: &["https://censor.net/ua/feed", "https://censor.net/en/feed"],
    },
];

/// Looks up a built-in source by name, ASCII case-insensitively.
pub fn find_known(name: &str) -> Option<&'static KnownSource> {
    KNOWN_SOURCES.iter().find(|known| known.name.eq_ignore_ascii_case(name))
}
