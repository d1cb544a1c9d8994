use sws_scraper::Html;
use vws_crawler::{Category, CrawlerConfig, EntityRecord, Listing, Scrapable};

use crate::fields::extract_fields;
use crate::links::{extract_links, find_next};

/// Location of the wiki and of its entity pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiSite {
    pub base_url: String,
    /// Path prefix of entity pages, e.g. `/valorant/`
    pub namespace: String,
}

impl WikiSite {
    pub fn new(base_url: &str, namespace: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
        }
    }

    /// Resolves an `href` found on one of the wiki pages.
    pub fn url_of(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

impl From<&CrawlerConfig> for WikiSite {
    fn from(config: &CrawlerConfig) -> Self {
        Self::new(&config.base_url, &config.namespace)
    }
}

#[derive(Debug, Clone)]
pub struct WikiScraper {
    site: WikiSite,
}

impl WikiScraper {
    pub fn new(site: WikiSite) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &WikiSite {
        &self.site
    }
}

impl From<&CrawlerConfig> for WikiScraper {
    fn from(config: &CrawlerConfig) -> Self {
        Self::new(config.into())
    }
}

impl Scrapable for WikiScraper {
    fn listing(&self, page: &str, category: &Category) -> Listing {
        let doc = Html::parse_document(page);
        Listing {
            links: extract_links(&doc, &self.site, category),
            next: find_next(&doc, &self.site),
        }
    }

    fn entity(&self, page: &str, name: &str, category: &Category) -> EntityRecord {
        let doc = Html::parse_document(page);
        extract_fields(&doc, name, category)
    }
}
