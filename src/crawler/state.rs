use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::config::CrawlerConfig;
use super::fingerprint::FingerprintRegistry;
use super::frontier::Frontier;
use super::stats::CrawlStats;
use super::validate::normalize_url;

/// Current state of the crawler, shared by all workers
#[derive(Debug)]
pub struct CrawlerState {
    pub frontier: Frontier,
    pub stats: CrawlStats,
    /// Crawls per query-less URL, breaks `?page=N` style traps
    pub visit_counts: RwLock<HashMap<String, usize>>,
    /// Fingerprints of every page whose links were followed
    pub fingerprints: Mutex<FingerprintRegistry>,
    visit_cap: usize,
}

impl CrawlerState {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            frontier: Frontier::with_segment_repeat_limit(
                config.politeness_delay(),
                config.segment_repeat_limit,
            ),
            stats: CrawlStats::new(),
            visit_counts: RwLock::new(HashMap::new()),
            fingerprints: Mutex::new(FingerprintRegistry::new()),
            visit_cap: config.visit_cap,
        }
    }

    /// Queue the seed URLs, returning how many were accepted
    pub async fn seed(&self, seeds: &[Url]) -> usize {
        let mut accepted = 0;
        for seed in seeds {
            if self.frontier.add_url(seed).await {
                accepted += 1;
            }
        }
        accepted
    }

    /// Count one more crawl of `url`'s query-less form
    pub async fn record_visit(&self, url: &Url) -> usize {
        let mut visits = self.visit_counts.write().await;
        let count = visits.entry(normalize_url(url)).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub async fn visit_count(&self, url: &Url) -> usize {
        let visits = self.visit_counts.read().await;
        visits.get(&normalize_url(url)).copied().unwrap_or(0)
    }

    /// Drop the links whose query-less form was already crawled `visit_cap` times
    pub async fn under_visit_cap(&self, links: Vec<Url>) -> Vec<Url> {
        let visits = self.visit_counts.read().await;
        links
            .into_iter()
            .filter(|link| {
                visits.get(&normalize_url(link)).copied().unwrap_or(0) < self.visit_cap
            })
            .collect()
    }
}

pub type CrawlerStateRef = Arc<CrawlerState>;

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn visits_share_query_less_key() {
        let state = CrawlerState::new(&CrawlerConfig::new(Vec::new()));
        state.record_visit(&url("https://www.ics.uci.edu/events?page=1")).await;
        state.record_visit(&url("https://www.ics.uci.edu/events?page=2#x")).await;
        assert_eq!(state.visit_count(&url("https://www.ics.uci.edu/events")).await, 2);
    }

    #[tokio::test]
    async fn visit_cap_filters_links() {
        let config = CrawlerConfig::new(Vec::new()).with_visit_cap(2);
        let state = CrawlerState::new(&config);
        let capped = url("https://www.ics.uci.edu/calendar?day=1");
        state.record_visit(&capped).await;
        state.record_visit(&capped).await;

        let links = vec![
            url("https://www.ics.uci.edu/calendar?day=3"),
            url("https://www.ics.uci.edu/people"),
        ];
        assert_eq!(
            state.under_visit_cap(links).await,
            vec![url("https://www.ics.uci.edu/people")]
        );
    }

    #[tokio::test]
    async fn seeds_go_through_validation() {
        let state = CrawlerState::new(&CrawlerConfig::new(Vec::new()));
        let seeds = vec![
            url("https://www.ics.uci.edu"),
            url("https://www.ics.uci.edu/"),
            url("https://www.example.com/"),
        ];
        assert_eq!(state.seed(&seeds).await, 1);
        assert_eq!(state.frontier.pending_count().await, 1);
    }
}
