use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Category, CategorySpec, CrawlBudget};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_throttle")]
    pub throttle: Option<Throttle>,

    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,

    /// Seconds before a single fetch is abandoned
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: f32,

    #[serde(default = "default_min_records")]
    pub min_records: usize,

    #[serde(default = "default_categories")]
    pub categories: Vec<CategorySpec>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            base_url: default_base_url(),
            namespace: default_namespace(),
            throttle: default_throttle(),
            concurrent_downloads: default_concurrent_downloads(),
            fetch_timeout: default_fetch_timeout(),
            min_records: default_min_records(),
            categories: default_categories(),
        }
    }
}

/// A configuration value the crawler can't run with.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a non negative number of seconds, got {value}")]
    InvalidSeconds { field: &'static str, value: f32 },
}

/// Seconds as a `Duration`, `None` when negative, NaN or too large.
pub(crate) fn seconds(secs: f32) -> Option<Duration> {
    Duration::try_from_secs_f32(secs).ok()
}

impl CrawlerConfig {
    /// Checks the values serde can't, such as out of range durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if seconds(self.fetch_timeout).is_none() {
            return Err(ConfigError::InvalidSeconds {
                field: "fetchTimeout",
                value: self.fetch_timeout,
            });
        }
        if let Some(Throttle::Delay(delay)) = self.throttle {
            if seconds(delay).is_none() {
                return Err(ConfigError::InvalidSeconds {
                    field: "throttle delay",
                    value: delay,
                });
            }
        }
        Ok(())
    }

    /// Unvalidated values never time out.
    pub fn fetch_timeout(&self) -> Duration {
        seconds(self.fetch_timeout).unwrap_or(Duration::MAX)
    }

    /// Absolute URL of a wiki path such as a category listing.
    pub fn url_of(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn default_user_agent() -> String {
    String::from("VWSbot")
}

fn default_base_url() -> String {
    String::from("https://liquipedia.net")
}

fn default_namespace() -> String {
    String::from("/valorant/")
}

fn default_throttle() -> Option<Throttle> {
    Some(Throttle::Delay(0.5))
}

fn default_concurrent_downloads() -> usize {
    4
}

fn default_fetch_timeout() -> f32 {
    30.0
}

fn default_min_records() -> usize {
    200
}

fn default_categories() -> Vec<CategorySpec> {
    let roster = CrawlBudget {
        max_records: 80,
        max_pages: 3,
        max_links_per_page: 20,
    };
    let single = CrawlBudget {
        max_records: 20,
        max_pages: 1,
        max_links_per_page: 20,
    };
    vec![
        CategorySpec::new(Category::Players, "/valorant/Category:Players", roster),
        CategorySpec::new(Category::Teams, "/valorant/Category:Teams", roster),
        CategorySpec::new(Category::Agents, "/valorant/Agents", single),
        CategorySpec::new(Category::Tournaments, "/valorant/Portal:Tournaments", single),
        CategorySpec::new(Category::Maps, "/valorant/Maps", single),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Throttle {
    /// The number of requests per second
    PerSecond(NonZeroUsize),
    /// The delay in seconds between requests
    Delay(f32),
}
