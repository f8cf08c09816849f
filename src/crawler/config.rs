use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::validate::DEFAULT_SEGMENT_REPEAT_LIMIT;

/// Default timeout for page requests in seconds
pub const REQUEST_TIMEOUT_SEC: u64 = 10;
/// Default number of redirects followed before a URL is abandoned
pub const DEFAULT_REDIRECT_LIMIT: usize = 6;
/// Default number of crawls allowed per query-less URL
pub const DEFAULT_VISIT_CAP: usize = 20;
/// Default similarity above which two pages count as the same page
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.95;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub seed_urls: Vec<Url>,
    pub user_agent: String,
    pub cache_server: Option<String>,
    pub worker_count: usize,
    pub request_delay_ms: u64,
    pub politeness_delay_ms: u64,
    pub visit_cap: usize,
    pub redirect_limit: usize,
    pub similarity_threshold: f64,
    pub segment_repeat_limit: usize,
    pub request_timeout_sec: u64,
}

impl CrawlerConfig {
    pub fn new(seed_urls: Vec<Url>) -> Self {
        Self {
            seed_urls,
            user_agent: concat!("uci-crawler/", env!("CARGO_PKG_VERSION")).to_string(),
            cache_server: None,
            worker_count: 2,
            request_delay_ms: 500,
            politeness_delay_ms: 500,
            visit_cap: DEFAULT_VISIT_CAP,
            redirect_limit: DEFAULT_REDIRECT_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            segment_repeat_limit: DEFAULT_SEGMENT_REPEAT_LIMIT,
            request_timeout_sec: REQUEST_TIMEOUT_SEC,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_cache_server(mut self, cache_server: Option<String>) -> Self {
        self.cache_server = cache_server;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_request_delay(mut self, delay_ms: u64) -> Self {
        self.request_delay_ms = delay_ms;
        self
    }

    pub fn with_politeness_delay(mut self, delay_ms: u64) -> Self {
        self.politeness_delay_ms = delay_ms;
        self
    }

    pub fn with_visit_cap(mut self, visit_cap: usize) -> Self {
        self.visit_cap = visit_cap;
        self
    }

    pub fn with_redirect_limit(mut self, redirect_limit: usize) -> Self {
        self.redirect_limit = redirect_limit;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_segment_repeat_limit(mut self, limit: usize) -> Self {
        self.segment_repeat_limit = limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout_sec: u64) -> Self {
        self.request_timeout_sec = timeout_sec;
        self
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    /// Label shown in download logs for the cache server
    pub fn cache_label(&self) -> &str {
        self.cache_server.as_deref().unwrap_or("none")
    }
}

pub type CrawlerConfigRef = Arc<CrawlerConfig>;
