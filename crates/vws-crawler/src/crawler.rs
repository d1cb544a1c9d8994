use std::time::Duration;

use futures::{future, stream, StreamExt};
use tokio::time::timeout;

use crate::config::CrawlerConfig;
use crate::fetch::{Fetch, FetchError};
use crate::limiter::RateLimiter;
use crate::record::{CategorySpec, EntityRecord};
use crate::scrapable::Scrapable;
use crate::walker::{Walk, WalkEnd};

/// Runs configured categories through the walker and gathers their records.
#[derive(Debug)]
pub struct Crawler<F, S> {
    pub(crate) fetcher: F,
    pub(crate) scraper: S,
    limiter: RateLimiter,
    base_url: String,
    fetch_timeout: Duration,
    concurrent_downloads: usize,
    min_records: usize,
}

impl<F, S> Crawler<F, S>
where
    F: Fetch,
    S: Scrapable,
{
    /// Builds a crawler pacing its requests as configured by `config.throttle`.
    ///
    /// A `PerSecond` throttle spawns its refill task, so this must run within a
    /// tokio runtime.
    pub fn new(config: &CrawlerConfig, fetcher: F, scraper: S) -> Self {
        Self {
            fetcher,
            scraper,
            limiter: config.throttle.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fetch_timeout: config.fetch_timeout(),
            concurrent_downloads: config.concurrent_downloads.max(1),
            min_records: config.min_records,
        }
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Crawls every category and concatenates their records in `specs` order.
    ///
    /// Categories are independent: one yielding nothing, or ending early, has no
    /// effect on the others.
    pub async fn run(&self, specs: &[CategorySpec]) -> RunReport {
        let walks = future::join_all(specs.iter().map(|spec| self.crawl_category(spec))).await;

        let mut report = RunReport {
            records: vec![],
            summaries: vec![],
            min_records: self.min_records,
        };
        for (spec, walk) in specs.iter().zip(walks) {
            log::info!(
                "Collected {} {} records from {} listing page(s)",
                walk.records.len(),
                spec.name,
                walk.pages
            );
            report.summaries.push(CategorySummary {
                category: spec.name.to_string(),
                records: walk.records.len(),
                pages: walk.pages,
                end: walk.end,
            });
            report.records.extend(walk.records);
        }

        if report.below_minimum() {
            log::warn!(
                "Only got {} records, expected at least {}",
                report.records.len(),
                report.min_records
            );
        } else {
            log::info!("Collected {} records in total", report.records.len());
        }

        report
    }

    /// Crawls one category, paginated or not.
    pub async fn crawl_category(&self, spec: &CategorySpec) -> Walk {
        let listing_url = format!("{}{}", self.base_url, spec.listing_path);
        if spec.is_paginated() {
            self.walk(&spec.name, &listing_url, spec.budget).await
        } else {
            self.scan(&spec.name, &listing_url, spec.budget).await
        }
    }

    /// Paced fetch bounded by the configured timeout.
    pub(crate) async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.limiter.acquire().await;
        match timeout(self.fetch_timeout, self.fetcher.fetch(url)).await {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                after: self.fetch_timeout,
            }),
        }
    }

    /// Fetches `urls` through the bounded download pool, results come back in
    /// the order of `urls` whatever order downloads complete in.
    pub(crate) async fn fetch_all(&self, urls: &[&str]) -> Vec<Result<String, FetchError>> {
        let mut fetched = stream::iter(urls.iter().enumerate())
            .map(|(i, url)| async move { (i, self.fetch(url).await) })
            .buffer_unordered(self.concurrent_downloads)
            .collect::<Vec<_>>()
            .await;

        fetched.sort_by_key(|(i, _)| *i);
        fetched.into_iter().map(|(_, page)| page).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: String,
    pub records: usize,
    pub pages: usize,
    pub end: WalkEnd,
}

/// Records of a whole run with per category counts.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: Vec<EntityRecord>,
    pub summaries: Vec<CategorySummary>,
    pub min_records: usize,
}

impl RunReport {
    /// Advisory only, a short run still returns everything it collected.
    pub fn below_minimum(&self) -> bool {
        self.records.len() < self.min_records
    }
}
