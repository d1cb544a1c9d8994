use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::{self, BoxFuture};
use vws_crawler::{
    CandidateLink, Category, CategorySpec, CrawlBudget, Crawler, CrawlerConfig, EntityRecord,
    Fetch, FetchError, Listing, Scrapable, WalkEnd,
};

const BASE: &str = "https://wiki.test";

/// Serves canned pages, unknown URLs fail.
#[derive(Default)]
struct FakeFetcher {
    pages: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    stalled: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn page(mut self, path: &str, body: &str) -> Self {
        self.pages.insert(url(path), body.to_string());
        self
    }

    fn delayed(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(url(path), delay);
        self
    }

    fn stalled(mut self, path: &str) -> Self {
        self.stalled.insert(url(path));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    fn times_requested(&self, path: &str) -> usize {
        let target = url(path);
        self.requested().iter().filter(|u| **u == target).count()
    }
}

impl Fetch for FakeFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.stalled.contains(url) {
            return Box::pin(future::pending::<Result<String, FetchError>>());
        }
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Unavailable {
                url: url.to_string(),
                reason: "no such page".into(),
            });
        let delay = self.delays.get(url).copied();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            page
        })
    }
}

/// Line based pages: `link <path> <label>` and `next <path>` for listings,
/// anything else is an entity page whose text ends up in the `body` field.
struct LineScraper;

impl Scrapable for LineScraper {
    fn listing(&self, page: &str, _category: &Category) -> Listing {
        let mut links = BTreeSet::new();
        let mut next = None;
        for line in page.lines() {
            let parts: Vec<_> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["link", path, label] => {
                    links.insert(CandidateLink::new(url(path), *label));
                }
                ["next", path] => next = Some(url(path)),
                _ => (),
            }
        }
        Listing { links, next }
    }

    fn entity(&self, page: &str, name: &str, category: &Category) -> EntityRecord {
        let name = if page == "nameless" { "" } else { name };
        let mut record = EntityRecord::new(category, name);
        record.set("body", page.trim());
        record
    }
}

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

fn crawler(fetcher: &FakeFetcher) -> Crawler<&FakeFetcher, LineScraper> {
    let config = CrawlerConfig {
        base_url: BASE.into(),
        throttle: None,
        fetch_timeout: 5.0,
        min_records: 3,
        ..Default::default()
    };
    Crawler::new(&config, fetcher, LineScraper)
}

fn budget(max_records: usize, max_pages: usize, max_links_per_page: usize) -> CrawlBudget {
    CrawlBudget {
        max_records,
        max_pages,
        max_links_per_page,
    }
}

fn names(records: &[EntityRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn walks_pages_in_label_order() {
    let fetcher = FakeFetcher::default()
        .page("/w/list1", "link /w/b Bravo\nlink /w/a Alpha\nnext /w/list2")
        .page("/w/list2", "link /w/c Charlie")
        .page("/w/a", "a")
        .page("/w/b", "b")
        .page("/w/c", "c");

    let walk = crawler(&fetcher)
        .walk(&Category::Players, &url("/w/list1"), budget(10, 5, 10))
        .await;

    assert_eq!(names(&walk.records), ["Alpha", "Bravo", "Charlie"]);
    assert_eq!(walk.records[0].get("body"), Some("a"));
    assert_eq!(walk.records[0].category, "Players");
    assert_eq!(walk.pages, 2);
    assert_eq!(walk.end, WalkEnd::LastPage);
}

#[tokio::test]
async fn revisited_listing_ends_walk() {
    let fetcher = FakeFetcher::default()
        .page("/w/list1", "link /w/a Alpha\nnext /w/list1")
        .page("/w/a", "a");

    let walk = crawler(&fetcher)
        .walk(&Category::Teams, &url("/w/list1"), budget(10, 100, 10))
        .await;

    assert_eq!(names(&walk.records), ["Alpha"]);
    assert_eq!(walk.pages, 1);
    assert_eq!(walk.end, WalkEnd::Revisit);
    assert_eq!(fetcher.times_requested("/w/list1"), 1);
}

#[tokio::test]
async fn max_pages_bounds_listing_fetches() {
    let mut fetcher = FakeFetcher::default();
    for i in 1..=5 {
        fetcher = fetcher
            .page(
                &format!("/w/list{i}"),
                &format!("link /w/e{i} Entity{i}\nnext /w/list{}", i + 1),
            )
            .page(&format!("/w/e{i}"), "entity");
    }

    let walk = crawler(&fetcher)
        .walk(&Category::Players, &url("/w/list1"), budget(100, 2, 10))
        .await;

    assert_eq!(names(&walk.records), ["Entity1", "Entity2"]);
    assert_eq!(walk.pages, 2);
    assert_eq!(walk.end, WalkEnd::MaxPages);
    assert_eq!(fetcher.times_requested("/w/list3"), 0);
}

#[tokio::test]
async fn record_budget_skips_failed_entities() {
    let fetcher = FakeFetcher::default()
        .page(
            "/w/list1",
            "link /w/a Alpha\nlink /w/b Bravo\nlink /w/c Charlie\nlink /w/d Delta\nnext /w/list2",
        )
        .page("/w/list2", "link /w/e Echo")
        .page("/w/b", "b")
        .page("/w/c", "c")
        .page("/w/d", "d");

    let walk = crawler(&fetcher)
        .walk(&Category::Players, &url("/w/list1"), budget(2, 5, 10))
        .await;

    assert_eq!(names(&walk.records), ["Bravo", "Charlie"]);
    assert_eq!(walk.end, WalkEnd::MaxRecords);
    assert_eq!(fetcher.times_requested("/w/a"), 1);
    assert_eq!(fetcher.times_requested("/w/d"), 0);
    assert_eq!(fetcher.times_requested("/w/list2"), 0);
}

#[tokio::test]
async fn links_per_page_keeps_first_labels() {
    let fetcher = FakeFetcher::default()
        .page("/w/list1", "link /w/c Charlie\nlink /w/a Alpha\nlink /w/b Bravo")
        .page("/w/a", "a")
        .page("/w/b", "b")
        .page("/w/c", "c");

    let walk = crawler(&fetcher)
        .walk(&Category::Players, &url("/w/list1"), budget(10, 1, 2))
        .await;

    assert_eq!(names(&walk.records), ["Alpha", "Bravo"]);
    assert_eq!(fetcher.times_requested("/w/c"), 0);
}

#[tokio::test]
async fn listing_failure_keeps_partial_records() {
    let fetcher = FakeFetcher::default()
        .page("/w/list1", "link /w/a Alpha\nnext /w/list2")
        .page("/w/a", "a");

    let walk = crawler(&fetcher)
        .walk(&Category::Players, &url("/w/list1"), budget(10, 5, 10))
        .await;

    assert_eq!(names(&walk.records), ["Alpha"]);
    assert_eq!(walk.pages, 2);
    assert_eq!(walk.end, WalkEnd::ListingFailed);
}

#[tokio::test]
async fn duplicate_urls_yield_one_record() {
    let fetcher = FakeFetcher::default()
        .page("/w/list1", "link /w/a Alpha\nlink /w/a Ace\nnext /w/list2")
        .page("/w/list2", "link /w/a Alpha\nlink /w/b Bravo")
        .page("/w/a", "a")
        .page("/w/b", "b");

    let walk = crawler(&fetcher)
        .walk(&Category::Players, &url("/w/list1"), budget(10, 5, 10))
        .await;

    assert_eq!(names(&walk.records), ["Ace", "Bravo"]);
    assert_eq!(fetcher.times_requested("/w/a"), 1);
}

#[tokio::test]
async fn incomplete_records_are_dropped() {
    let fetcher = FakeFetcher::default()
        .page("/w/list1", "link /w/a Alpha\nlink /w/b Bravo")
        .page("/w/a", "nameless")
        .page("/w/b", "b");

    let walk = crawler(&fetcher)
        .walk(&Category::Maps, &url("/w/list1"), budget(10, 1, 10))
        .await;

    assert_eq!(names(&walk.records), ["Bravo"]);
}

#[tokio::test(start_paused = true)]
async fn stalled_fetch_counts_as_failure() {
    let fetcher = FakeFetcher::default()
        .page("/w/list1", "link /w/a Alpha\nlink /w/b Bravo")
        .stalled("/w/a")
        .page("/w/b", "b");

    let walk = crawler(&fetcher)
        .walk(&Category::Agents, &url("/w/list1"), budget(10, 1, 10))
        .await;

    assert_eq!(names(&walk.records), ["Bravo"]);
    assert_eq!(walk.end, WalkEnd::LastPage);
}

#[tokio::test(start_paused = true)]
async fn concurrent_downloads_keep_link_order() {
    let fetcher = FakeFetcher::default()
        .page("/w/list1", "link /w/a Alpha\nlink /w/b Bravo\nlink /w/c Charlie")
        .page("/w/a", "a")
        .page("/w/b", "b")
        .page("/w/c", "c")
        .delayed("/w/a", Duration::from_secs(3))
        .delayed("/w/b", Duration::from_secs(2));

    let walk = crawler(&fetcher)
        .walk(&Category::Players, &url("/w/list1"), budget(10, 1, 10))
        .await;

    assert_eq!(names(&walk.records), ["Alpha", "Bravo", "Charlie"]);
}

#[tokio::test]
async fn run_concatenates_categories_in_order() {
    let fetcher = FakeFetcher::default()
        .page("/w/Category:Players", "link /w/p1 Tenz\nnext /w/Category:Players2")
        .page("/w/Category:Players2", "link /w/p2 Aspas")
        .page("/w/p1", "p1")
        .page("/w/p2", "p2")
        .page("/w/Maps", "link /w/m1 Ascent\nnext /w/Maps2")
        .page("/w/Maps2", "link /w/m2 Bind")
        .page("/w/m1", "m1")
        .page("/w/m2", "m2");

    let specs = [
        CategorySpec::new(Category::Players, "/w/Category:Players", budget(10, 3, 10)),
        CategorySpec::new(Category::Maps, "/w/Maps", budget(10, 3, 10)),
    ];
    let report = crawler(&fetcher).run(&specs).await;

    assert_eq!(names(&report.records), ["Tenz", "Aspas", "Ascent"]);
    assert_eq!(report.summaries.len(), 2);
    assert_eq!(report.summaries[0].records, 2);
    assert_eq!(report.summaries[0].pages, 2);
    assert_eq!(report.summaries[1].category, "Maps");
    assert_eq!(report.summaries[1].records, 1);
    assert_eq!(fetcher.times_requested("/w/Maps2"), 0);
    assert!(!report.below_minimum());
}

#[tokio::test]
async fn empty_category_does_not_stop_run() {
    let fetcher = FakeFetcher::default()
        .page("/w/Agents", "link /w/a1 Jett")
        .page("/w/a1", "a1");

    let specs = [
        CategorySpec::new(Category::Teams, "/w/Category:Teams", budget(10, 3, 10)),
        CategorySpec::new(Category::Agents, "/w/Agents", budget(10, 1, 10)),
    ];
    let report = crawler(&fetcher).run(&specs).await;

    assert_eq!(names(&report.records), ["Jett"]);
    assert_eq!(report.summaries[0].records, 0);
    assert_eq!(report.summaries[0].end, WalkEnd::ListingFailed);
    assert!(report.below_minimum());
}

#[tokio::test]
async fn single_listing_failure_keeps_other_categories() {
    let fetcher = FakeFetcher::default()
        .page("/w/Category:Players", "link /w/p1 Tenz")
        .page("/w/p1", "p1");

    let specs = [
        CategorySpec::new(Category::Maps, "/w/Maps", budget(10, 1, 10)),
        CategorySpec::new(Category::Players, "/w/Category:Players", budget(10, 3, 10)),
    ];
    let report = crawler(&fetcher).run(&specs).await;

    assert_eq!(names(&report.records), ["Tenz"]);
    assert_eq!(report.summaries[0].category, "Maps");
    assert_eq!(report.summaries[0].records, 0);
    assert_eq!(report.summaries[0].pages, 1);
    assert_eq!(report.summaries[0].end, WalkEnd::ListingFailed);
    assert_eq!(fetcher.times_requested("/w/Maps"), 1);
}
