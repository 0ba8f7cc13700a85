use serde::Serialize;

use crate::domain::country::Country;

/// One extracted job posting. Built once by the extractor and never mutated
/// afterwards; it is either kept or discarded.
#[derive(Debug, Clone, Serialize)]
pub struct JobPosting {
    /// Dedup key, stable across runs for the same real-world posting.
    pub identity: String,
    pub source_name: String,
    pub title: String,
    /// Absolute url, or empty when the fragment carried no link.
    pub url: String,
    /// Full text of the originating fragment, kept for re-classification.
    pub raw_text: String,
    pub location_label: String,
    pub country: Country,
}

impl JobPosting {
    pub fn new(
        source_name: String,
        title: String,
        url: String,
        raw_text: String,
        country: Country,
        location_label: String,
    ) -> Self {
        let identity = derive_identity(&source_name, &url, &title);

        JobPosting {
            identity,
            source_name,
            title,
            url,
            raw_text,
            location_label,
            country,
        }
    }
}

/// The url is the preferred key since titles repeat across departments; a
/// fragment without a link falls back to the title.
pub fn derive_identity(source_name: &str, url: &str, title: &str) -> String {
    match url.is_empty() {
        false => format!("{}:{}", source_name, url),
        true => format!("{}:{}", source_name, title),
    }
}
