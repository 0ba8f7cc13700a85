use url::Url;

/// One configured site to crawl, built by the roster loader and immutable
/// for the duration of a run.
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    /// Company or platform name, used as the posting's source.
    pub name: String,
    /// Page fetched for listings (usually the careers page).
    pub url: String,
    /// Base for resolving relative posting links.
    pub base_url: Url,
    /// Primary css selectors, tried in order until one matches.
    pub selectors: Vec<String>,
}

impl ScrapeTarget {
    pub fn new(name: String, url: String, base_url: Url, selectors: Vec<String>) -> Self {
        ScrapeTarget {
            name,
            url,
            base_url,
            selectors,
        }
    }
}
