use log2::debug;
use reqwest::header::LOCATION;
use reqwest::{Client, redirect};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::config::CrawlerConfig;

/// Result of downloading one URL
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// HTTP status, 0 when no response arrived
    pub status: u16,
    /// Effective URL, or the redirect target for 3xx responses
    pub url: Url,
    pub body: Option<Vec<u8>>,
    pub error: Option<String>,
}

impl FetchResponse {
    pub fn ok(url: Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            url,
            body: Some(body.into()),
            error: None,
        }
    }

    pub fn redirect(status: u16, target: Url) -> Self {
        Self {
            status,
            url: target,
            body: None,
            error: None,
        }
    }

    pub fn failed(status: u16, url: Url, error: impl Into<String>) -> Self {
        Self {
            status,
            url,
            body: None,
            error: Some(error.into()),
        }
    }

    pub fn is_redirect(&self) -> bool {
        (301..=308).contains(&self.status)
    }

    /// Body bytes when the fetch succeeded with content
    pub fn content(&self) -> Option<&[u8]> {
        match (&self.status, &self.body) {
            (200, Some(body)) if !body.is_empty() => Some(body.as_slice()),
            _ => None,
        }
    }
}

/// Anything that can download a page. Timeouts are the fetcher's job.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchResponse> + Send;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid cache server {0}: {1}")]
    CacheServer(String, #[source] url::ParseError),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// `reqwest` based fetcher. Redirects are reported, not followed, so the
/// crawler can bound and scope them itself.
///
/// With a cache server configured every page, `http` or `https`, is requested
/// as `http://<cache>/?q=<url>&u=<user agent>` and the cache fetches it.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    cache: Option<Url>,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let cache = config
            .cache_server
            .as_ref()
            .map(|cache| {
                Url::parse(&format!("http://{}/", cache))
                    .map_err(|e| FetchError::CacheServer(cache.clone(), e))
            })
            .transpose()?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_sec))
            .redirect(redirect::Policy::none())
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            cache,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Where the request for `url` is actually sent
    fn request_url(&self, url: &Url) -> Url {
        let Some(cache) = &self.cache else {
            return url.clone();
        };
        let mut request = cache.clone();
        request
            .query_pairs_mut()
            .append_pair("q", url.as_str())
            .append_pair("u", &self.user_agent);
        request
    }

    async fn download(&self, url: &Url) -> Result<FetchResponse, reqwest::Error> {
        let response = self.client.get(self.request_url(url)).send().await?;
        let status = response.status().as_u16();

        if response.status().is_redirection() {
            let target = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| url.join(location).ok());
            return Ok(match target {
                Some(target) => FetchResponse::redirect(status, target),
                None => FetchResponse::failed(status, url.clone(), "redirect without location"),
            });
        }

        // redirects are never followed, so the page is still `url`
        let final_url = url.clone();
        if !response.status().is_success() {
            return Ok(FetchResponse::failed(
                status,
                final_url,
                format!("Failed to fetch page: {}", response.status()),
            ));
        }

        let body = response.bytes().await?;
        Ok(FetchResponse {
            status,
            url: final_url,
            body: Some(body.to_vec()),
            error: None,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchResponse> + Send {
        async move {
            match self.download(url).await {
                Ok(response) => response,
                Err(e) => {
                    debug!("Request to {} failed: {}", url, e);
                    FetchResponse::failed(0, url.clone(), e.to_string())
                }
            }
        }
    }
}
