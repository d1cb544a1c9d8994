//! Entity link discovery on listing pages.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;
use sws_scraper::Html;
use vws_crawler::{CandidateLink, Category};

use crate::dom::{self, ANCHORS};
use crate::scraper::WikiSite;

/// Administrative namespaces, never entities.
pub const EXCLUDED_NAMESPACES: [&str; 5] = ["Category:", "Special:", "Template:", "File:", "Help:"];

/// Edit actions and links to missing pages.
pub const BROKEN_LINK_MARKERS: [&str; 2] = ["action=edit", "redlink=1"];

/// Navigation and footer labels found on every page.
pub const BOILERPLATE_LABELS: [&str; 6] = [
    "API",
    "Portal",
    "About Liquipedia VALORANT Wiki",
    "Disclaimers",
    "CC-BY-SA",
    "Notability Guidelines",
];

lazy_static! {
    /// Whole word only, entity labels such as "NextGen" are not pagination.
    static ref NEXT_PAGE: Regex = Regex::new(r"(?i)\bnext\b").unwrap();
}

/// Entity links of a listing page, deduplicated on `(url, label)`.
///
/// The set iterates by label then URL. `_category` is accepted for category
/// specific filtering, the current rules apply to every category.
pub fn extract_links(doc: &Html, site: &WikiSite, _category: &Category) -> BTreeSet<CandidateLink> {
    doc.select(ANCHORS.clone())
        .filter_map(|anchor| {
            let href = dom::attr_of(&anchor, "href")?;
            let label = dom::text_of(&anchor);
            (is_entity_href(&href, &site.namespace) && is_entity_label(&label))
                .then(|| CandidateLink::new(site.url_of(&href), label))
        })
        .collect()
}

pub fn is_entity_href(href: &str, namespace: &str) -> bool {
    href.starts_with(namespace)
        && href != namespace
        && !EXCLUDED_NAMESPACES.iter().any(|ns| href.contains(ns))
        && !BROKEN_LINK_MARKERS.iter().any(|marker| href.contains(marker))
}

/// Rejects boilerplate and footnote markers such as `[1]`.
pub fn is_entity_label(label: &str) -> bool {
    !label.is_empty()
        && !BOILERPLATE_LABELS.contains(&label)
        && !label.starts_with('[')
        && label.chars().count() >= 2
}

/// Absolute URL of the first "next page" link, if it has a destination.
pub fn find_next(doc: &Html, site: &WikiSite) -> Option<String> {
    doc.select(dom::LINKS.clone())
        .find(|anchor| NEXT_PAGE.is_match(&anchor.inner_text()))
        .and_then(|anchor| dom::attr_of(&anchor, "href"))
        .filter(|href| !href.trim().is_empty())
        .map(|href| site.url_of(&href))
}
