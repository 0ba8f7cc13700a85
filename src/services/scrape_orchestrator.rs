use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;

use crate::domain::job::JobPosting;
use crate::domain::target::ScrapeTarget;
use crate::services::job_extractor::JobExtractor;
use crate::services::page_fetcher::PageFetcher;
use crate::services::relevance::RelevanceFilter;

/// Fans scraping out across targets on a bounded worker pool and aggregates
/// the relevant postings. A failing target logs and contributes zero jobs;
/// it never takes the run or its siblings down with it.
pub struct ScrapeOrchestrator {
    fetcher: Arc<PageFetcher>,
    extractor: Arc<JobExtractor>,
    filter: Arc<RelevanceFilter>,
    workers: usize,
    polite_delay: bool,
}

impl ScrapeOrchestrator {
    pub fn new(
        fetcher: Arc<PageFetcher>,
        extractor: JobExtractor,
        filter: RelevanceFilter,
        workers: usize,
        polite_delay: bool,
    ) -> Self {
        ScrapeOrchestrator {
            fetcher,
            extractor: Arc::new(extractor),
            filter: Arc::new(filter),
            workers: workers.max(1),
            polite_delay,
        }
    }

    /// Order within one target's results is stable; order across targets is
    /// whatever the pool produces.
    pub async fn scrape_all(&self, targets: Vec<ScrapeTarget>) -> Vec<JobPosting> {
        log::info!(
            "Scraping {} targets with {} workers",
            targets.len(),
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let aggregate: Arc<Mutex<Vec<JobPosting>>> = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();

        for target in targets {
            let semaphore = semaphore.clone();
            let aggregate = aggregate.clone();
            let fetcher = self.fetcher.clone();
            let extractor = self.extractor.clone();
            let filter = self.filter.clone();
            let polite_delay = self.polite_delay;

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };

                if polite_delay {
                    let delay_ms = rand::thread_rng().gen_range(1_000..=3_000);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }

                let html = match fetcher.fetch_page(&target.url).await {
                    Ok(html) => html,
                    Err(e) => {
                        log::error!("{}: fetch of {} failed: {:?}", target.name, target.url, e);
                        return;
                    }
                };

                // Parse + extract synchronously; the Html document must not
                // live across an await point.
                let jobs = extractor.extract_jobs(&html, &target);
                let relevant: Vec<JobPosting> = jobs
                    .into_iter()
                    .filter(|job| filter.is_relevant(job))
                    .collect();

                log::info!(
                    "{}: {} postings in target countries",
                    target.name,
                    relevant.len()
                );

                match aggregate.lock() {
                    Ok(mut all_jobs) => all_jobs.extend(relevant),
                    Err(e) => log::error!("{}: aggregate lock poisoned: {}", target.name, e),
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Scrape task panicked: {:?}", e);
            }
        }

        match Arc::try_unwrap(aggregate) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|e| e.into_inner()),
            // Unreachable once every task has been joined.
            Err(shared) => shared.lock().map(|jobs| jobs.clone()).unwrap_or_default(),
        }
    }
}
