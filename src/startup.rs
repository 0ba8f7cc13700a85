use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::configuration::Settings;
use crate::services::digest_mailer::DigestMailer;
use crate::services::job_extractor::JobExtractor;
use crate::services::page_fetcher::PageFetcher;
use crate::services::relevance::RelevanceFilter;
use crate::services::roster;
use crate::services::scrape_orchestrator::ScrapeOrchestrator;
use crate::services::seen_store::SeenStore;

#[derive(Debug)]
pub struct RunSummary {
    pub companies_scanned: usize,
    pub new_jobs: usize,
    pub total_tracked: usize,
}

/// One full monitoring pass: roster -> scrape -> diff -> persist -> mail.
/// Individual target failures never surface here; the only fatal outcomes
/// are an unusable roster and a seen-set that cannot be persisted.
pub async fn run(settings: Settings) -> anyhow::Result<RunSummary> {
    let fetcher = Arc::new(PageFetcher::new(
        Duration::from_secs(settings.scrape.fetch_timeout_secs),
        Duration::from_secs(settings.scrape.probe_timeout_secs),
    ));

    let records = roster::load_roster(&settings.scrape.roster_file);
    let targets = roster::build_targets(records, &fetcher).await;
    if targets.is_empty() {
        bail!("no usable scrape targets; roster and fallbacks were all empty");
    }
    let companies_scanned = targets.len();

    let seen_store = SeenStore::new(&settings.state.seen_file);
    let mut seen = seen_store.load();

    let extractor = JobExtractor::new(settings.scrape.max_elements);
    let filter = RelevanceFilter::new(
        settings.filter.mode,
        settings.filter.target_countries.clone(),
        settings.filter.title_keywords.clone(),
    );
    let orchestrator = ScrapeOrchestrator::new(
        fetcher,
        extractor,
        filter,
        settings.scrape.workers,
        settings.scrape.polite_delay,
    );

    let all_jobs = orchestrator.scrape_all(targets).await;
    let new_jobs = seen_store.diff_new(&all_jobs, &seen);

    // The seen-set is committed before mailing: a posting is reported at
    // most once, even when the notification itself fails.
    seen_store.commit(&mut seen, &new_jobs);
    seen_store
        .save(&seen)
        .context("failed to persist the seen set")?;

    let mailer = DigestMailer::new(settings.email.clone());
    if let Err(e) = mailer.send_digest(&new_jobs).await {
        log::error!("Failed to send digest email: {:?}", e);
    }

    let summary = RunSummary {
        companies_scanned,
        new_jobs: new_jobs.len(),
        total_tracked: seen.len(),
    };

    log::info!(
        "Run complete: {} companies scanned, {} new jobs found, {} postings tracked",
        summary.companies_scanned,
        summary.new_jobs,
        summary.total_tracked
    );

    Ok(summary)
}
