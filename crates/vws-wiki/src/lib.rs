mod dom;
pub mod fields;
mod infobox;
pub mod links;
mod scraper;
pub mod writer;

pub use scraper::{WikiScraper, WikiSite};
pub use sws_scraper::Html;
