pub mod config;
pub mod fetch;
pub mod fingerprint;
pub mod frontier;
pub mod report;
pub mod runner;
pub mod scrape;
pub mod state;
pub mod stats;
pub mod validate;


pub use config::{CrawlerConfig, CrawlerConfigRef, REQUEST_TIMEOUT_SEC};
pub use fetch::{FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use fingerprint::{FingerprintRegistry, SimHash, check_similarity};
pub use frontier::{EntryState, Frontier};
pub use report::Report;
pub use runner::{PageOutcome, SkipReason, crawl, process_url};
pub use scrape::{ExtractError, PageContent, construct_url, extract_page, tokenize};
pub use state::{CrawlerState, CrawlerStateRef};
pub use stats::{CrawlStatistics, CrawlStats};
pub use validate::{is_valid, normalize_url};
