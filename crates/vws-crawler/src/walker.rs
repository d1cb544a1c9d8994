use std::collections::{BTreeSet, HashSet};

use crate::crawler::Crawler;
use crate::fetch::Fetch;
use crate::record::{CandidateLink, Category, CrawlBudget, EntityRecord};
use crate::scrapable::Scrapable;

/// Records gathered by one category crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    pub records: Vec<EntityRecord>,
    /// Listing pages fetched
    pub pages: usize,
    pub end: WalkEnd,
}

/// Why a walk stopped, none of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// The last listing page had no next page
    LastPage,
    /// The next listing page was already visited
    Revisit,
    MaxPages,
    MaxRecords,
    /// A listing page couldn't be fetched
    ListingFailed,
}

enum State {
    FetchListing(String),
    ExtractLinks { url: String, page: String },
    FetchEntities { links: Vec<CandidateLink>, next: Option<String> },
    FindNext(Option<String>),
    Done(WalkEnd),
}

impl<F, S> Crawler<F, S>
where
    F: Fetch,
    S: Scrapable,
{
    /// Follows a paginated listing from `listing_url`, extracting every entity it
    /// links to until one of the budget limits, a revisited page or the last page.
    pub async fn walk(&self, category: &Category, listing_url: &str, budget: CrawlBudget) -> Walk {
        let mut walker = CategoryWalker::new(self, category, budget);
        let mut state = State::FetchListing(listing_url.to_string());

        let end = loop {
            state = match state {
                State::FetchListing(url) => walker.fetch_listing(url).await,
                State::ExtractLinks { url, page } => {
                    let listing = self.scraper.listing(&page, category);
                    log::info!("Found {} {category} links on {url}", listing.links.len());
                    State::FetchEntities {
                        links: walker.retain_links(listing.links),
                        next: listing.next,
                    }
                }
                State::FetchEntities { links, next } => {
                    walker.collect_entities(&links).await;
                    State::FindNext(next)
                }
                State::FindNext(Some(url)) => State::FetchListing(url),
                State::FindNext(None) => State::Done(WalkEnd::LastPage),
                State::Done(end) => break end,
            };
        };

        log::debug!("{category} walk ended: {end:?}");
        walker.finish(end)
    }

    /// Extracts the entities linked from a single, non paginated, listing page.
    pub async fn scan(&self, category: &Category, listing_url: &str, budget: CrawlBudget) -> Walk {
        let mut walker = CategoryWalker::new(self, category, budget);
        walker.visited.insert(listing_url.to_string());
        walker.pages = 1;

        log::info!("Fetching {category} listing: {listing_url}");
        let page = match self.fetch(listing_url).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Skipping {category} listing: {e}");
                return walker.finish(WalkEnd::ListingFailed);
            }
        };

        let listing = self.scraper.listing(&page, category);
        log::info!("Found {} {category} links on {listing_url}", listing.links.len());
        let links = walker.retain_links(listing.links);
        walker.collect_entities(&links).await;
        walker.finish(WalkEnd::LastPage)
    }
}

/// Per walk state, never shared between categories.
struct CategoryWalker<'c, F, S> {
    crawler: &'c Crawler<F, S>,
    category: &'c Category,
    budget: CrawlBudget,
    visited: HashSet<String>,
    records: Vec<EntityRecord>,
    pages: usize,
}

impl<'c, F, S> CategoryWalker<'c, F, S>
where
    F: Fetch,
    S: Scrapable,
{
    fn new(crawler: &'c Crawler<F, S>, category: &'c Category, budget: CrawlBudget) -> Self {
        Self {
            crawler,
            category,
            budget,
            visited: HashSet::new(),
            records: vec![],
            pages: 0,
        }
    }

    fn budget_spent(&self) -> bool {
        self.records.len() >= self.budget.max_records
    }

    async fn fetch_listing(&mut self, url: String) -> State {
        if self.budget_spent() {
            return State::Done(WalkEnd::MaxRecords);
        }
        if self.pages >= self.budget.max_pages {
            return State::Done(WalkEnd::MaxPages);
        }
        if !self.visited.insert(url.clone()) {
            return State::Done(WalkEnd::Revisit);
        }
        self.pages += 1;

        log::info!("Fetching {} page {}: {url}", self.category, self.pages);
        match self.crawler.fetch(&url).await {
            Ok(page) => State::ExtractLinks { url, page },
            Err(e) => {
                log::warn!("Stopping {} walk: {e}", self.category);
                State::Done(WalkEnd::ListingFailed)
            }
        }
    }

    /// Keeps the first links in label order, within the per page budget.
    fn retain_links(&self, links: BTreeSet<CandidateLink>) -> Vec<CandidateLink> {
        links
            .into_iter()
            .take(self.budget.max_links_per_page)
            .collect()
    }

    /// Fetches and extracts entities in link order until the links or the record
    /// budget run out.
    ///
    /// Downloads are dispatched in batches no larger than the remaining budget,
    /// a failed entity leaves its slot to the next link.
    async fn collect_entities(&mut self, links: &[CandidateLink]) {
        let mut pending = links.iter();
        loop {
            let room = self.budget.max_records.saturating_sub(self.records.len());
            if room == 0 {
                break;
            }

            let mut batch = Vec::with_capacity(room);
            for link in pending.by_ref() {
                if self.visited.insert(link.url.clone()) {
                    batch.push(link);
                    if batch.len() == room {
                        break;
                    }
                } else {
                    log::debug!("Skipping already visited {}", link.url);
                }
            }
            if batch.is_empty() {
                break;
            }

            let urls: Vec<&str> = batch.iter().map(|link| link.url.as_str()).collect();
            let pages = self.crawler.fetch_all(&urls).await;

            for (link, page) in batch.into_iter().zip(pages) {
                match page {
                    Ok(page) => {
                        log::debug!("Extracting {} {}", self.category, link.label);
                        let record = self
                            .crawler
                            .scraper
                            .entity(&page, &link.label, self.category);
                        if record.is_complete() {
                            self.records.push(record);
                        } else {
                            log::warn!("Dropping incomplete record from {}", link.url);
                        }
                    }
                    Err(e) => log::warn!("Skipping {}: {e}", link.label),
                }
            }
        }
    }

    fn finish(self, end: WalkEnd) -> Walk {
        Walk {
            records: self.records,
            pages: self.pages,
            end,
        }
    }
}
