use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::country::LocationClassifier;
use crate::domain::job::JobPosting;
use crate::domain::target::ScrapeTarget;

/// Fragments whose entire text is one of these are navigation chrome, not
/// postings.
const BOILERPLATE_TEXT: [&str; 5] = ["jobs", "careers", "search", "apply", "home"];

/// Titles containing any of these are site furniture rather than roles.
const SKIP_TITLE_KEYWORDS: [&str; 8] = [
    "cookie", "privacy", "about us", "contact", "home", "search", "filter", "menu",
];

/// Tried when none of a target's primary selectors match anything.
const GENERIC_SELECTORS: [&str; 11] = [
    "a[href*=\"job\"]",
    "a[href*=\"career\"]",
    "a[href*=\"position\"]",
    ".job",
    ".career",
    ".position",
    ".role",
    ".opportunity",
    "h3",
    "h4",
    "div[class*=\"title\"]",
];

const GENERIC_MAX_ELEMENTS: usize = 30;

/// Per-fragment rejections logged per target before going quiet.
const MAX_REJECTION_LOGS: usize = 3;

const HEADING_TAGS: [&str; 5] = ["h1", "h2", "h3", "h4", "h5"];

/// Turns candidate HTML fragments into job postings. Holds the classifier so
/// every extracted posting leaves with a country attached.
pub struct JobExtractor {
    classifier: LocationClassifier,
    max_elements: usize,
}

impl JobExtractor {
    pub fn new(max_elements: usize) -> Self {
        JobExtractor {
            classifier: LocationClassifier::new(),
            max_elements,
        }
    }

    /// Parses a whole page and extracts postings from the first selector
    /// that matches anything. Synchronous on purpose: `scraper::Html` is not
    /// Send, so parsing happens between awaits in the orchestrator.
    pub fn extract_jobs(&self, html: &str, target: &ScrapeTarget) -> Vec<JobPosting> {
        let document = Html::parse_document(html);
        let fragments = self.select_fragments(&document, target);

        let mut jobs = Vec::new();
        let mut rejected = 0usize;

        for fragment in &fragments {
            match self.extract_job(*fragment, target) {
                Some(job) => jobs.push(job),
                None => {
                    rejected += 1;
                    if rejected <= MAX_REJECTION_LOGS {
                        log::debug!(
                            "{}: skipped a <{}> fragment that did not look like a posting",
                            target.name,
                            fragment.value().name()
                        );
                    }
                }
            }
        }

        log::info!(
            "{}: {} elements matched, {} postings extracted, {} rejected",
            target.name,
            fragments.len(),
            jobs.len(),
            rejected
        );

        jobs
    }

    /// First primary selector with at least one match wins; otherwise the
    /// generic list under the same rule. Nothing matching is an empty result,
    /// not an error.
    fn select_fragments<'a>(
        &self,
        document: &'a Html,
        target: &ScrapeTarget,
    ) -> Vec<ElementRef<'a>> {
        for selector_str in &target.selectors {
            match Selector::parse(selector_str) {
                Ok(selector) => {
                    let matches: Vec<ElementRef> =
                        document.select(&selector).take(self.max_elements).collect();
                    if !matches.is_empty() {
                        log::debug!(
                            "{}: selector '{}' matched {} elements",
                            target.name,
                            selector_str,
                            matches.len()
                        );
                        return matches;
                    }
                }
                Err(e) => {
                    log::warn!(
                        "{}: unparseable selector '{}': {:?}",
                        target.name,
                        selector_str,
                        e
                    );
                }
            }
        }

        for selector_str in GENERIC_SELECTORS {
            // Generic selectors are static and always parse.
            let selector = Selector::parse(selector_str).unwrap();
            let matches: Vec<ElementRef> = document
                .select(&selector)
                .take(GENERIC_MAX_ELEMENTS)
                .collect();
            if !matches.is_empty() {
                log::debug!(
                    "{}: fell back to generic selector '{}' with {} elements",
                    target.name,
                    selector_str,
                    matches.len()
                );
                return matches;
            }
        }

        Vec::new()
    }

    /// Extracts one posting from one fragment, or rejects it. A rejection is
    /// confined to the fragment and never aborts the batch.
    pub fn extract_job(&self, fragment: ElementRef, target: &ScrapeTarget) -> Option<JobPosting> {
        let raw_text = fragment_lines(fragment);
        if raw_text.len() < 5 {
            return None;
        }
        let text_lower = raw_text.to_lowercase();
        if BOILERPLATE_TEXT.contains(&text_lower.as_str()) {
            return None;
        }

        let title = derive_title(fragment, &raw_text)?;
        if title.len() < 3 {
            return None;
        }
        let title_lower = title.to_lowercase();
        if SKIP_TITLE_KEYWORDS
            .iter()
            .any(|keyword| title_lower.contains(keyword))
        {
            return None;
        }

        let url = derive_url(fragment, &target.base_url);
        let (country, location_label) = self.classifier.classify(&raw_text);

        Some(JobPosting::new(
            target.name.clone(),
            title,
            url,
            raw_text,
            country,
            location_label,
        ))
    }
}

/// Text nodes of the fragment, trimmed and newline-joined so the first line
/// stays usable as a title fallback.
fn fragment_lines(fragment: ElementRef) -> String {
    fragment
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flat single-line text, for titles taken from a specific element.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn derive_title(fragment: ElementRef, raw_text: &str) -> Option<String> {
    let tag = fragment.value().name();

    let title = if HEADING_TAGS.contains(&tag) {
        element_text(fragment)
    } else if tag == "a" {
        let text = element_text(fragment);
        match text.is_empty() {
            false => text,
            true => fragment
                .value()
                .attr("title")
                .unwrap_or_default()
                .to_string(),
        }
    } else {
        let heading_or_link = Selector::parse("h1, h2, h3, h4, h5, a").unwrap();
        match fragment.select(&heading_or_link).next() {
            Some(child) => element_text(child),
            None => raw_text.lines().next().unwrap_or_default().to_string(),
        }
    };

    let title = title.trim().to_string();
    match title.is_empty() {
        true => None,
        false => Some(title),
    }
}

fn derive_url(fragment: ElementRef, base_url: &Url) -> String {
    let href = match fragment.value().name() {
        "a" => fragment.value().attr("href"),
        _ => {
            let link = Selector::parse("a").unwrap();
            fragment
                .select(&link)
                .next()
                .and_then(|a| a.value().attr("href"))
        }
    };

    match href {
        Some(href) if !href.trim().is_empty() => resolve_url(href, base_url),
        _ => String::new(),
    }
}

fn resolve_url(href: &str, base_url: &Url) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    // A href the base cannot absorb yields no url rather than a bad one.
    base_url
        .join(href)
        .map(|joined| joined.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::country::Country;

    fn target_with_selectors(selectors: &[&str]) -> ScrapeTarget {
        ScrapeTarget::new(
            "x".to_string(),
            "https://x.com/careers".to_string(),
            Url::parse("https://x.com").unwrap(),
            selectors.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn extract_first(html: &str, selector: &str) -> Option<JobPosting> {
        let extractor = JobExtractor::new(50);
        let target = target_with_selectors(&[".job"]);
        let document = Html::parse_fragment(html);
        let sel = Selector::parse(selector).unwrap();
        let fragment = document.select(&sel).next().unwrap();
        extractor.extract_job(fragment, &target)
    }

    #[test]
    fn link_fragment_resolves_relative_href() {
        let job = extract_first(r#"<a href="/careers/123">Head of Treasury</a>"#, "a").unwrap();

        assert_eq!(job.title, "Head of Treasury");
        assert_eq!(job.url, "https://x.com/careers/123");
        assert_eq!(job.identity, "x:https://x.com/careers/123");
    }

    #[test]
    fn absolute_href_is_kept_as_is() {
        let job = extract_first(
            r#"<a href="https://jobs.x.com/1">Finance Manager - Doha</a>"#,
            "a",
        )
        .unwrap();

        assert_eq!(job.url, "https://jobs.x.com/1");
        assert_eq!(job.country, Country::Qatar);
        assert_eq!(job.location_label, "Doha, Qatar");
    }

    #[test]
    fn boilerplate_text_is_rejected() {
        assert!(extract_first(r#"<a href="/home">Home</a>"#, "a").is_none());
        assert!(extract_first("<div class=\"job\">Careers</div>", "div").is_none());
    }

    #[test]
    fn navigation_titles_are_rejected() {
        let html =
            r#"<div class="job"><h3>Cookie Preferences</h3><p>Manage your settings</p></div>"#;
        assert!(extract_first(html, "div").is_none());
    }

    #[test]
    fn title_comes_from_descendant_heading() {
        let html = r#"<div class="job">
            <h3>Senior Finance Director</h3>
            <a href="/roles/7">Apply</a>
            <span>Dubai Office</span>
        </div>"#;
        let job = extract_first(html, "div").unwrap();

        assert_eq!(job.title, "Senior Finance Director");
        assert_eq!(job.url, "https://x.com/roles/7");
        assert_eq!(job.country, Country::Uae);
        assert_eq!(job.location_label, "Dubai, UAE");
    }

    #[test]
    fn title_falls_back_to_first_line_of_text() {
        let html = "<div class=\"job\"><span>Treasury Analyst</span><span>Riyadh</span></div>";
        let job = extract_first(html, "div").unwrap();

        assert_eq!(job.title, "Treasury Analyst");
        // No link anywhere in the fragment.
        assert_eq!(job.url, "");
        assert_eq!(job.identity, "x:Treasury Analyst");
        assert_eq!(job.country, Country::SaudiArabia);
    }

    #[test]
    fn primary_selector_wins_when_it_matches() {
        let extractor = JobExtractor::new(50);
        let target = target_with_selectors(&[".job-listing", ".job-item"]);
        let html = r#"
            <div class="job-item"><a href="/a/1">Group CFO - Abu Dhabi</a></div>
            <h3>Unrelated heading far away</h3>
        "#;

        let jobs = extractor.extract_jobs(html, &target);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Group CFO - Abu Dhabi");
    }

    #[test]
    fn generic_selectors_are_tried_after_primary_miss() {
        let extractor = JobExtractor::new(50);
        let target = target_with_selectors(&[".job-listing", ".career-item"]);
        let html =
            r#"<ul><li><a href="/jobs/55">Senior Finance Director - Dubai Office</a></li></ul>"#;

        let jobs = extractor.extract_jobs(html, &target);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].url, "https://x.com/jobs/55");
        assert_eq!(jobs[0].country, Country::Uae);
    }

    #[test]
    fn no_match_anywhere_yields_zero_jobs() {
        let extractor = JobExtractor::new(50);
        let target = target_with_selectors(&[".job-listing"]);
        let html = "<p>We are not hiring at the moment.</p>";

        assert!(extractor.extract_jobs(html, &target).is_empty());
    }

    #[test]
    fn element_cap_is_applied() {
        let extractor = JobExtractor::new(2);
        let target = target_with_selectors(&[".job-item"]);
        let html = r#"
            <div class="job-item"><a href="/r/1">Finance Manager - Dubai</a></div>
            <div class="job-item"><a href="/r/2">Finance Manager - Doha</a></div>
            <div class="job-item"><a href="/r/3">Finance Manager - London</a></div>
        "#;

        let jobs = extractor.extract_jobs(html, &target);

        assert_eq!(jobs.len(), 2);
    }
}
