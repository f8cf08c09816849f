use std::future::Future;
use std::sync::Arc;
use url::Url;
use uci_crawler::crawler::{
    self, CrawlerConfig, CrawlerState, EntryState, FetchResponse, Fetcher, HttpFetcher, Report,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sends every request for `www.ics.uci.edu` to the mock server and maps
/// response URLs back, so the real HTTP client runs against in-scope URLs
struct MockSiteFetcher {
    inner: HttpFetcher,
    server: Url,
}

impl MockSiteFetcher {
    fn to_server(&self, url: &Url) -> Url {
        let mut target = self.server.join(url.path()).unwrap();
        target.set_query(url.query());
        target
    }

    fn to_site(&self, url: &Url) -> Url {
        if url.host_str() != self.server.host_str() || url.port() != self.server.port() {
            return url.clone();
        }
        let mut site = Url::parse("https://www.ics.uci.edu/").unwrap().join(url.path()).unwrap();
        site.set_query(url.query());
        site
    }
}

impl Fetcher for MockSiteFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchResponse> + Send {
        async move {
            let mut response = self.inner.fetch(&self.to_server(url)).await;
            response.url = self.to_site(&response.url);
            response
        }
    }
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_mock_site_and_report() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <p>Welcome to the Donald Bren school of information and computer sciences</p>
            <a href="/research">Research</a>
            <a href="/old-news">News</a>
            <a href="/research#labs">Labs</a>
            <a href="https://www.example.com/">Elsewhere</a>
            <a href="/brochure.pdf">Brochure</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/research",
        r#"<html><body>
            <p>Research in machine learning, machine vision and software engineering</p>
            <a href="/">Home</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/news",
        r#"<html><body><p>News: graduate students win best paper award</p></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old-news"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/news"))
        .mount(&server)
        .await;

    let seed = Url::parse("https://www.ics.uci.edu/")?;
    let config = Arc::new(
        CrawlerConfig::new(vec![seed.clone()])
            .with_worker_count(2)
            .with_request_delay(0)
            .with_politeness_delay(10)
            .with_request_timeout(5),
    );
    let fetcher = Arc::new(MockSiteFetcher {
        inner: HttpFetcher::new(&config)?,
        server: Url::parse(&server.uri())?,
    });

    let state = Arc::new(CrawlerState::new(&config));
    assert_eq!(state.seed(&config.seed_urls).await, 1);

    crawler::crawl(state.clone(), config, fetcher).await?;

    let statistics = state.stats.snapshot();
    assert_eq!(statistics.unique_page_count, 3);
    assert_eq!(statistics.word_frequency["machine"], 2);
    assert_eq!(statistics.subdomain_page_count["https://www.ics.uci.edu"], 3);
    assert_eq!(statistics.max_words_url, "https://www.ics.uci.edu/");
    assert_eq!(
        statistics.redirected_urls["https://www.ics.uci.edu/old-news"],
        "https://www.ics.uci.edu/news"
    );
    assert_eq!(
        state.frontier.state(&Url::parse("https://www.ics.uci.edu/old-news")?).await,
        Some(EntryState::Complete)
    );

    let report = Report::from_statistics(&statistics, 1);
    assert_eq!(report.top_words, vec![("machine".to_string(), 2)]);
    assert!(report.to_string().contains("https://www.ics.uci.edu, 3"));

    Ok(())
}
