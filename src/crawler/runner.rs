use std::sync::Arc;
use anyhow::Result;
use log2::*;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use url::Url;

use super::config::{CrawlerConfig, CrawlerConfigRef};
use super::fetch::Fetcher;
use super::scrape::{ExtractError, extract_page};
use super::state::CrawlerStateRef;
use super::validate::is_in_scope;

/// Why a dequeued URL produced no links
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch failed with status {status}: {}", .error.as_deref().unwrap_or("no content"))]
    FetchFailed { status: u16, error: Option<String> },
    #[error("redirected outside the crawl scope to {0}")]
    RedirectOutOfScope(Url),
    #[error("more than {0} redirects")]
    RedirectLimit(usize),
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("near-duplicate of an already crawled page")]
    NearDuplicate,
}

/// Result of one worker iteration
#[derive(Debug)]
pub enum PageOutcome {
    Crawled {
        /// Effective URL after redirects
        url: Url,
        links_found: usize,
        links_added: usize,
    },
    Skipped(SkipReason),
}

/// Run `config.worker_count` workers until the frontier is exhausted.
/// Seed the frontier through `CrawlerState::seed` first.
pub async fn crawl<F: Fetcher>(
    crawler_state_ref: CrawlerStateRef,
    crawler_cfg_ref: CrawlerConfigRef,
    fetcher: Arc<F>,
) -> Result<()> {
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    for worker_id in 0..crawler_cfg_ref.worker_count {
        let state = Arc::clone(&crawler_state_ref);
        let config = Arc::clone(&crawler_cfg_ref);
        let fetcher = Arc::clone(&fetcher);

        let handle = tokio::spawn(async move {
            info!("Worker {} started", worker_id);

            while let Some(url) = state.frontier.get_tbd_url().await {
                let outcome = process_url(&state, &config, fetcher.as_ref(), &url).await;
                log_outcome(worker_id, &url, &outcome);
                state.frontier.mark_url_complete(&url).await;

                if config.request_delay_ms > 0 {
                    sleep(config.request_delay()).await;
                }
            }

            info!("Worker {}: Frontier is empty. Stopping crawler.", worker_id);
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.await?;
    }

    Ok(())
}

/// Fetch, follow redirects, extract and enqueue children for one URL.
/// Never marks `url` complete, the caller does that on every outcome.
pub async fn process_url<F: Fetcher>(
    state: &CrawlerStateRef,
    config: &CrawlerConfig,
    fetcher: &F,
    url: &Url,
) -> PageOutcome {
    let mut response = fetcher.fetch(url).await;
    info!(
        "Downloaded {}, status <{}>, using cache {}.",
        url,
        response.status,
        config.cache_label()
    );

    let mut hops = 0;
    let mut current = url.clone();
    while response.is_redirect() {
        if hops >= config.redirect_limit {
            error!("Max redirects exceeded for URL: {}", url);
            return PageOutcome::Skipped(SkipReason::RedirectLimit(config.redirect_limit));
        }
        let target = response.url.clone();
        if !is_in_scope(&target) {
            return PageOutcome::Skipped(SkipReason::RedirectOutOfScope(target));
        }
        state.stats.add_redirect(&current, &target);
        response = fetcher.fetch(&target).await;
        info!(
            "Downloaded {}, status <{}>, using cache {}.",
            target,
            response.status,
            config.cache_label()
        );
        current = target;
        hops += 1;
    }

    let Some(body) = response.content() else {
        state.stats.increment_failed_url_count();
        return PageOutcome::Skipped(SkipReason::FetchFailed {
            status: response.status,
            error: response.error.clone(),
        });
    };
    let page_url = response.url.clone();

    let page = match extract_page(body, &page_url) {
        Ok(page) => page,
        Err(e) => {
            state.stats.increment_failed_url_count();
            return PageOutcome::Skipped(e.into());
        }
    };

    let is_new = {
        let mut fingerprints = state.fingerprints.lock().await;
        fingerprints.check_and_register(page_url.as_str(), &page.text, config.similarity_threshold)
    };
    if !is_new {
        return PageOutcome::Skipped(SkipReason::NearDuplicate);
    }

    state.record_visit(&page_url).await;
    if !state.stats.record_page(&page_url, &page.words) {
        debug!("{} was already counted", page_url);
    }

    let links_found = page.links.len();
    let mut links_added = 0;
    for link in state.under_visit_cap(page.links).await {
        if state.frontier.add_url(&link).await {
            links_added += 1;
        }
    }

    PageOutcome::Crawled {
        url: page_url,
        links_found,
        links_added,
    }
}

fn log_outcome(worker_id: usize, url: &Url, outcome: &PageOutcome) {
    match outcome {
        PageOutcome::Crawled {
            url: page_url,
            links_found,
            links_added,
        } => info!(
            "Worker {}: crawled {} ({} links, {} new)",
            worker_id, page_url, links_found, links_added
        ),
        PageOutcome::Skipped(reason @ (SkipReason::NearDuplicate | SkipReason::Extract(_))) => {
            warn!("Worker {}: skipped {}: {}", worker_id, url, reason)
        }
        // already logged as an error when it happened
        PageOutcome::Skipped(SkipReason::RedirectLimit(_)) => {}
        PageOutcome::Skipped(reason) => debug!("Worker {}: skipped {}: {}", worker_id, url, reason),
    }
}
