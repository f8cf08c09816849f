use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Host whose subdomains get counted in the report
pub const SUBDOMAIN_ROOT: &str = "ics.uci.edu";

/// Everything gathered for the final report
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CrawlStatistics {
    pub unique_page_count: usize,
    /// Unique pages in the order they were crawled
    pub unique_pages: Vec<String>,
    pub word_frequency: HashMap<String, usize>,
    /// `scheme://host` of every `ics.uci.edu` subdomain with its page count
    pub subdomain_page_count: HashMap<String, usize>,
    pub max_words_url: String,
    pub max_words: usize,
    pub failed_url_count: usize,
    /// Every redirect hop seen while crawling, source -> target
    pub redirected_urls: HashMap<String, String>,
}

/// Thread-safe owner of [`CrawlStatistics`]. Every method is one short
/// critical section; nothing here blocks on I/O.
#[derive(Debug, Default)]
pub struct CrawlStats {
    inner: Mutex<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    stats: CrawlStatistics,
    seen_pages: HashSet<String>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StatsInner> {
        // poisoned lock still holds consistent counters
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn increment_unique_page_count(&self) {
        let mut inner = self.lock();
        inner.stats.unique_page_count = inner.stats.unique_page_count.saturating_add(1);
    }

    pub fn add_unique_page(&self, url: &str) {
        self.lock().stats.unique_pages.push(url.to_string());
    }

    pub fn increment_word_frequency(&self, word: &str) {
        let mut inner = self.lock();
        let count = inner.stats.word_frequency.entry(word.to_string()).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Counts `url` towards its subdomain when it lives under `ics.uci.edu`
    pub fn increment_subdomain_page_count(&self, url: &Url) {
        let Some(key) = subdomain_key(url) else { return };
        let mut inner = self.lock();
        let count = inner.stats.subdomain_page_count.entry(key).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Replaces the longest-page record when `word_count` beats it
    pub fn update_max_words(&self, url: &str, word_count: usize) {
        let mut inner = self.lock();
        if word_count > inner.stats.max_words {
            inner.stats.max_words = word_count;
            inner.stats.max_words_url = url.to_string();
        }
    }

    pub fn increment_failed_url_count(&self) {
        let mut inner = self.lock();
        inner.stats.failed_url_count = inner.stats.failed_url_count.saturating_add(1);
    }

    pub fn add_redirect(&self, from: &Url, to: &Url) {
        self.lock()
            .stats
            .redirected_urls
            .insert(from.to_string(), to.to_string());
    }

    /// Record a successfully extracted page in one critical section.
    /// Returns `false` if the page was already counted.
    pub fn record_page(&self, url: &Url, words: &[String]) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if !inner.seen_pages.insert(url.to_string()) {
            return false;
        }
        let stats = &mut inner.stats;
        stats.unique_page_count = stats.unique_page_count.saturating_add(1);
        stats.unique_pages.push(url.to_string());
        for word in words {
            let count = stats.word_frequency.entry(word.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }
        if let Some(key) = subdomain_key(url) {
            let count = stats.subdomain_page_count.entry(key).or_insert(0);
            *count = count.saturating_add(1);
        }
        if words.len() > stats.max_words {
            stats.max_words = words.len();
            stats.max_words_url = url.to_string();
        }
        true
    }

    pub fn unique_page_count(&self) -> usize {
        self.lock().stats.unique_page_count
    }

    /// Copy of the current statistics, for reporting
    pub fn snapshot(&self) -> CrawlStatistics {
        self.lock().stats.clone()
    }
}

fn subdomain_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let suffix = format!(".{}", SUBDOMAIN_ROOT);
    if host == SUBDOMAIN_ROOT || host.ends_with(&suffix) {
        Some(format!("{}://{}", url.scheme(), host))
    } else {
        None
    }
}
