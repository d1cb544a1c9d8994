mod config;
mod crawler;
mod fetch;
mod limiter;
mod record;
mod scrapable;
mod walker;

pub use config::{ConfigError, CrawlerConfig, Throttle};
pub use crawler::{CategorySummary, Crawler, RunReport};
pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use limiter::RateLimiter;
pub use record::{CandidateLink, Category, CategorySpec, CrawlBudget, EntityRecord};
pub use scrapable::{Listing, Scrapable};
pub use walker::{Walk, WalkEnd};
