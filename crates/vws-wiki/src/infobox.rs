use lazy_static::lazy_static;
use sws_scraper::{ElementRef, Html, Selector};
use vws_crawler::EntityRecord;

use crate::dom::{self, CELLS, ROWS};

lazy_static! {
    static ref INFOBOX: Selector = Selector::parse("table.infobox").unwrap();
    static ref CONTENT: Selector = Selector::parse("div.mw-parser-output").unwrap();
    static ref TOP_LEVEL_PARAGRAPHS: Selector = Selector::parse(":scope > p").unwrap();
}

/// Paragraphs this short are usually captions or stray markup.
const MIN_DESCRIPTION_CHARS: usize = 20;

/// Maps infobox keys containing any of `patterns` to `field`.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub patterns: &'static [&'static str],
    pub field: &'static str,
}

impl FieldRule {
    pub const fn new(patterns: &'static [&'static str], field: &'static str) -> Self {
        Self { patterns, field }
    }

    fn matches(&self, key: &str) -> bool {
        self.patterns.iter().any(|pattern| key.contains(pattern))
    }
}

/// Copies the rows of the first infobox matched by `rules` into `record`.
///
/// Keys are the lower-cased first cell of a row, values its second cell. Each
/// row satisfies at most the first rule it matches. Returns how many rows
/// matched a rule, empty values included, a page without infobox yields 0.
pub fn scan_infobox(doc: &Html, rules: &[FieldRule], record: &mut EntityRecord) -> usize {
    let infobox = match dom::first(doc, &INFOBOX) {
        Some(infobox) => infobox,
        None => return 0,
    };

    let mut found = 0;
    for row in infobox.select(ROWS.clone()) {
        let (key, value) = match key_value(&row) {
            Some(pair) => pair,
            None => continue,
        };
        if let Some(rule) = rules.iter().find(|rule| rule.matches(&key)) {
            record.set(rule.field, &value);
            found += 1;
        }
    }
    found
}

fn key_value(row: &ElementRef) -> Option<(String, String)> {
    let mut cells = row.select(CELLS.clone());
    let key = dom::text_of(&cells.next()?).to_lowercase();
    let value = dom::text_of(&cells.next()?);
    Some((key, value))
}

/// First top level paragraph of the main content with some substance.
pub fn description(doc: &Html) -> Option<String> {
    dom::first(doc, &CONTENT)?
        .select(TOP_LEVEL_PARAGRAPHS.clone())
        .map(|p| dom::text_of(&p))
        .find(|text| text.chars().count() > MIN_DESCRIPTION_CHARS)
}
