use anyhow::Result;
use log2::*;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use uci_crawler::config;
use uci_crawler::crawler::{self, CrawlerConfig, CrawlerState, HttpFetcher, Report};

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = *START_TIME;
    let cfg = config::Config::new();
    cfg.validate()?;
    let _log2 = stdout()
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        .module_filter(|module| module.starts_with("uci_crawler")) // include only modules having this pattern
        .compress(false) // compress output
        .level(cfg.log_level.to_string()) // level of logging (trace -
        .start();

    let seed_urls = cfg
        .seed_urls
        .iter()
        .map(|seed| Url::parse(seed))
        .collect::<Result<Vec<_>, _>>()?;

    let crawler_config = Arc::new(
        CrawlerConfig::new(seed_urls)
            .with_user_agent(cfg.user_agent.clone())
            .with_cache_server(cfg.cache_server.clone())
            .with_worker_count(cfg.worker_count)
            .with_request_delay(cfg.request_delay)
            .with_politeness_delay(cfg.politeness_delay)
            .with_visit_cap(cfg.visit_cap)
            .with_redirect_limit(cfg.redirect_limit)
            .with_similarity_threshold(cfg.similarity_threshold)
            .with_segment_repeat_limit(cfg.segment_repeat_limit)
            .with_request_timeout(cfg.request_timeout),
    );

    let state = Arc::new(CrawlerState::new(&crawler_config));
    let accepted = state.seed(&crawler_config.seed_urls).await;
    if accepted == 0 {
        anyhow::bail!("none of the seed urls is inside the crawl scope");
    }
    info!("Starting crawl from {} seed urls with {} workers", accepted, crawler_config.worker_count);

    let fetcher = Arc::new(HttpFetcher::new(&crawler_config)?);

    // state is cloned because the report reads it afterwards
    match crawler::crawl(state.clone(), crawler_config, fetcher).await {
        Ok(_) => {
            let statistics = state.stats.snapshot();
            info!(
                "Crawling completed in {:?}. Unique pages: {}",
                START_TIME.elapsed(),
                statistics.unique_page_count
            );
            print!("{}", Report::from_statistics(&statistics, cfg.top_words));
        }
        Err(e) => {
            error!("Crawling failed: {}", e);
        }
    }

    Ok(())
}
