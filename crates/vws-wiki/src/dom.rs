//! Small queries over parsed pages.

use lazy_static::lazy_static;
use regex::Regex;
use sws_scraper::{ElementRef, Html, Selector};

lazy_static! {
    pub static ref ANCHORS: Selector = Selector::parse("a[href]").unwrap();
    pub static ref LINKS: Selector = Selector::parse("a").unwrap();
    pub static ref ROWS: Selector = Selector::parse("tr").unwrap();
    pub static ref CELLS: Selector = Selector::parse("th, td").unwrap();
    static ref SPANS_WITH_ID: Selector = Selector::parse("span[id]").unwrap();
}

/// Whitespace trimmed text content.
pub fn text_of(elem: &ElementRef) -> String {
    elem.inner_text().trim().to_string()
}

pub fn attr_of(elem: &ElementRef, name: &str) -> Option<String> {
    elem.map_value(|el| el.attr(name).map(String::from))
        .flatten()
}

pub fn is_tag(elem: &ElementRef, tag: &str) -> bool {
    elem.map_value(|el| el.name() == tag).unwrap_or(false)
}

pub fn first(doc: &Html, selector: &Selector) -> Option<ElementRef> {
    doc.select(selector.clone()).next()
}

/// Section marker spans whose id matches `pattern`, in document order.
pub fn marker_spans<'p>(doc: &Html, pattern: &'p Regex) -> impl Iterator<Item = ElementRef> + 'p {
    doc.select(SPANS_WITH_ID.clone()).filter(move |span| {
        attr_of(span, "id")
            .map(|id| pattern.is_match(&id))
            .unwrap_or(false)
    })
}

/// First `tag` element among the siblings following the parent of `elem`.
///
/// Section titles wrap their marker span in a heading, the section content
/// comes after that heading.
pub fn next_after_parent(elem: &ElementRef, tag: &str) -> Option<ElementRef> {
    elem.parent()?
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| is_tag(sibling, tag))
}
