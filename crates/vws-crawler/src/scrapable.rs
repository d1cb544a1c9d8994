use std::collections::BTreeSet;

use crate::record::{CandidateLink, Category, EntityRecord};

/// Page level parsing logic plugged into the crawler.
///
/// Implementations never fail: a page lacking the expected structure yields no
/// links or a record with fewer fields.
pub trait Scrapable {
    /// Entity links and the next listing page of a listing page.
    fn listing(&self, page: &str, category: &Category) -> Listing;

    /// The record of an entity page.
    fn entity(&self, page: &str, name: &str, category: &Category) -> EntityRecord;
}

impl<T: Scrapable + ?Sized> Scrapable for &T {
    fn listing(&self, page: &str, category: &Category) -> Listing {
        (**self).listing(page, category)
    }

    fn entity(&self, page: &str, name: &str, category: &Category) -> EntityRecord {
        (**self).entity(page, name, category)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub links: BTreeSet<CandidateLink>,
    /// Absolute URL of the next listing page
    pub next: Option<String>,
}
