pub mod digest_mailer;
pub mod job_extractor;
pub mod page_fetcher;
pub mod relevance;
pub mod roster;
pub mod scrape_orchestrator;
pub mod seen_store;

pub use digest_mailer::*;
pub use job_extractor::*;
pub use page_fetcher::*;
pub use relevance::*;
pub use roster::*;
pub use scrape_orchestrator::*;
pub use seen_store::*;
