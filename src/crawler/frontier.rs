//! Shared queue of URLs waiting to be crawled.
//!
//! Every URL the frontier has ever accepted stays in `entries`, so a completed
//! URL is never queued again. The crawl is over only when nothing is pending
//! and nothing is in progress; a worker still processing a page may add more.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet, VecDeque};
use std::time::Duration;
use log2::debug;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Instant, sleep};
use url::Url;

use super::validate::{DEFAULT_SEGMENT_REPEAT_LIMIT, is_valid_with_limit};

/// Lifecycle of one frontier URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    InProgress,
    Complete,
}

/// What a worker asking for work should do next
#[derive(Debug, PartialEq)]
enum Dispatch {
    Ready(Url),
    /// Every pending host was fetched too recently
    Wait(Duration),
    /// Nothing pending yet, but in-progress pages may add more
    Idle,
    Exhausted,
}

/// Pending URLs are queued per host. A host with queued URLs sits in exactly
/// one of `ready_hosts` or `cooling_hosts`, so dispatch never scans URLs.
#[derive(Debug, Default)]
struct FrontierInner {
    entries: HashMap<String, EntryState>,
    /// Pending URLs of each host with their insertion order
    host_queues: HashMap<String, VecDeque<(u64, Url)>>,
    /// Hosts that may be fetched now, keyed by the order of their oldest URL
    ready_hosts: BTreeMap<u64, String>,
    /// Hosts inside their politeness delay, earliest ready time first
    cooling_hosts: BinaryHeap<Reverse<(Instant, String)>>,
    /// Hosts present in `ready_hosts` or `cooling_hosts`
    scheduled: HashSet<String>,
    pending: usize,
    next_order: u64,
    in_progress: usize,
    last_fetch: HashMap<String, Instant>,
}

impl FrontierInner {
    fn push(&mut self, url: Url, delay: Duration, now: Instant) {
        let host = host_key(&url).to_string();
        let order = self.next_order;
        self.next_order += 1;
        self.host_queues.entry(host.clone()).or_default().push_back((order, url));
        self.pending += 1;
        if self.scheduled.insert(host.clone()) {
            self.schedule(host, delay, now);
        }
    }

    /// Put `host` in the ready set or the cooling heap
    fn schedule(&mut self, host: String, delay: Duration, now: Instant) {
        let Some(&(order, _)) = self.host_queues.get(&host).and_then(VecDeque::front) else {
            self.scheduled.remove(&host);
            return;
        };
        match self.last_fetch.get(&host).copied() {
            Some(last) if now.saturating_duration_since(last) < delay => {
                self.cooling_hosts.push(Reverse((last + delay, host)));
            }
            _ => {
                self.ready_hosts.insert(order, host);
            }
        }
    }

    fn remove_pending(&mut self, url: &Url) {
        let Some(queue) = self.host_queues.get_mut(host_key(url)) else {
            return;
        };
        if let Some(index) = queue.iter().position(|(_, queued)| queued == url) {
            queue.remove(index);
            self.pending = self.pending.saturating_sub(1);
        }
    }

    /// Oldest pending URL among the hosts that may be fetched at `now`
    fn next_ready(&mut self, delay: Duration, now: Instant) -> Dispatch {
        if self.pending == 0 {
            return if self.in_progress == 0 {
                Dispatch::Exhausted
            } else {
                Dispatch::Idle
            };
        }

        while self
            .cooling_hosts
            .peek()
            .is_some_and(|Reverse((ready_at, _))| *ready_at <= now)
        {
            if let Some(Reverse((_, host))) = self.cooling_hosts.pop() {
                self.schedule(host, delay, now);
            }
        }

        while let Some((_, host)) = self.ready_hosts.pop_first() {
            let Some(queue) = self.host_queues.get_mut(&host) else {
                self.scheduled.remove(&host);
                continue;
            };
            let Some((_, url)) = queue.pop_front() else {
                self.host_queues.remove(&host);
                self.scheduled.remove(&host);
                continue;
            };
            if queue.is_empty() {
                self.host_queues.remove(&host);
                self.scheduled.remove(&host);
                self.last_fetch.insert(host, now);
            } else {
                self.last_fetch.insert(host.clone(), now);
                self.cooling_hosts.push(Reverse((now + delay, host)));
            }
            self.pending = self.pending.saturating_sub(1);
            self.entries.insert(url.to_string(), EntryState::InProgress);
            self.in_progress += 1;
            return Dispatch::Ready(url);
        }

        let wait = self
            .cooling_hosts
            .peek()
            .map(|Reverse((ready_at, _))| ready_at.saturating_duration_since(now));
        Dispatch::Wait(wait.unwrap_or(delay))
    }
}

fn host_key(url: &Url) -> &str {
    url.host_str().unwrap_or_default()
}

/// Concurrency-safe crawl frontier with per-host politeness
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    changed: Notify,
    politeness_delay: Duration,
    segment_repeat_limit: usize,
}

impl Frontier {
    pub fn new(politeness_delay: Duration) -> Self {
        Self::with_segment_repeat_limit(politeness_delay, DEFAULT_SEGMENT_REPEAT_LIMIT)
    }

    pub fn with_segment_repeat_limit(politeness_delay: Duration, segment_repeat_limit: usize) -> Self {
        Self {
            inner: Mutex::new(FrontierInner::default()),
            changed: Notify::new(),
            politeness_delay,
            segment_repeat_limit,
        }
    }

    /// Queue `url` if it is crawlable and has never been seen.
    /// Returns whether it was newly added.
    pub async fn add_url(&self, url: &Url) -> bool {
        if !is_valid_with_limit(url.as_str(), self.segment_repeat_limit) {
            debug!("Rejected invalid url {}", url);
            return false;
        }
        let mut inner = self.inner.lock().await;
        if inner.entries.contains_key(url.as_str()) {
            return false;
        }
        inner.entries.insert(url.to_string(), EntryState::Pending);
        inner.push(url.clone(), self.politeness_delay, Instant::now());
        drop(inner);
        self.changed.notify_waiters();
        true
    }

    /// Next URL to crawl, waiting for politeness delays and for in-progress
    /// pages to finish. `None` means the crawl is over.
    pub async fn get_tbd_url(&self) -> Option<Url> {
        loop {
            // Registered before the state check so a wake-up between the
            // check and the wait is not lost
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let dispatch = {
                let mut inner = self.inner.lock().await;
                inner.next_ready(self.politeness_delay, Instant::now())
            };

            match dispatch {
                Dispatch::Ready(url) => return Some(url),
                Dispatch::Exhausted => {
                    self.changed.notify_waiters();
                    return None;
                }
                Dispatch::Wait(wait) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = sleep(wait) => {}
                    }
                }
                Dispatch::Idle => notified.await,
            }
        }
    }

    /// Mark `url` as done. Unknown or already completed URLs are ignored.
    pub async fn mark_url_complete(&self, url: &Url) {
        let mut inner = self.inner.lock().await;
        let key = url.as_str();
        match inner.entries.get(key).copied() {
            Some(EntryState::InProgress) => {
                inner.in_progress = inner.in_progress.saturating_sub(1);
            }
            Some(EntryState::Pending) => inner.remove_pending(url),
            Some(EntryState::Complete) | None => return,
        }
        inner.entries.insert(key.to_string(), EntryState::Complete);
        drop(inner);
        self.changed.notify_waiters();
    }

    pub async fn state(&self, url: &Url) -> Option<EntryState> {
        self.inner.lock().await.entries.get(url.as_str()).copied()
    }

    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.pending
    }

    pub async fn in_progress_count(&self) -> usize {
        self.inner.lock().await.in_progress
    }

    /// Number of URLs ever accepted
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }
}
