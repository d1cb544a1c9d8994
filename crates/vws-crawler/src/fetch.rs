use std::time::Duration;

use futures::future::BoxFuture;
use lazy_static::lazy_static;
use reqwest::header::USER_AGENT;
use thiserror::Error;

lazy_static! {
    static ref HTTP_CLI: reqwest::Client = reqwest::ClientBuilder::new()
        .gzip(true)
        .deflate(true)
        .build()
        .unwrap();
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
    #[error("{url} is unavailable: {reason}")]
    Unavailable { url: String, reason: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Status { url, .. }
            | Self::Timeout { url, .. }
            | Self::Unavailable { url, .. } => url,
        }
    }
}

/// Retrieves the raw text of a page.
pub trait Fetch {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        (**self).fetch(url)
    }
}

/// Single attempt HTTP fetcher identifying itself with a user agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        Box::pin(async move {
            let request_failed = |source| FetchError::Request {
                url: url.to_string(),
                source,
            };

            let resp = HTTP_CLI
                .get(url)
                .header(USER_AGENT, &self.user_agent)
                .send()
                .await
                .map_err(request_failed)?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            resp.text().await.map_err(request_failed)
        })
    }
}
