//! Field Extractor Dispatch: one extraction strategy per category.
//!
//! Every strategy starts from a record holding only the category and entity
//! name, missing page structure leaves the record partial but never fails.

use lazy_static::lazy_static;
use regex::Regex;
use sws_scraper::Html;
use vws_crawler::{Category, EntityRecord};

use crate::dom::{self, CELLS, LINKS, ROWS};
use crate::infobox::{description, scan_infobox, FieldRule};

const ROSTER_SIZE: usize = 5;
const MAX_ABILITIES: usize = 4;
/// Longer marker texts are headings caught by the ability pattern.
const MAX_ABILITY_CHARS: usize = 30;

const PLAYER_RULES: &[FieldRule] = &[
    FieldRule::new(&["real name", "name"], "real_name"),
    FieldRule::new(&["team", "current team"], "current_team"),
    FieldRule::new(&["role"], "role"),
    FieldRule::new(&["country", "nationality"], "country"),
    FieldRule::new(&["age"], "age"),
    FieldRule::new(&["earnings"], "earnings"),
];

const TEAM_RULES: &[FieldRule] = &[
    FieldRule::new(&["region", "country"], "region"),
    FieldRule::new(&["founded", "created"], "founded"),
    FieldRule::new(&["coach"], "coach"),
    FieldRule::new(&["captain"], "captain"),
];

const AGENT_RULES: &[FieldRule] = &[
    FieldRule::new(&["role", "type"], "role"),
    FieldRule::new(&["origin", "country"], "origin"),
    FieldRule::new(&["release"], "release_date"),
];

const TOURNAMENT_RULES: &[FieldRule] = &[
    FieldRule::new(&["prize"], "prize_pool"),
    FieldRule::new(&["location"], "location"),
    FieldRule::new(&["start", "date"], "start_date"),
    FieldRule::new(&["end"], "end_date"),
    FieldRule::new(&["organizer"], "organizer"),
];

const MAP_RULES: &[FieldRule] = &[
    FieldRule::new(&["type"], "type"),
    FieldRule::new(&["sites", "site"], "sites"),
    FieldRule::new(&["release"], "release_date"),
    FieldRule::new(&["layout"], "layout"),
];

lazy_static! {
    static ref ROSTER_MARKER: Regex = Regex::new(r"(?i)(current_)?roster").unwrap();
    static ref ABILITY_MARKER: Regex = Regex::new(r"(?i)ability").unwrap();
}

/// Adds the category specific fields of an entity page to `record`.
pub trait FieldExtractor {
    fn extract(&self, doc: &Html, record: &mut EntityRecord);
}

pub struct PlayerFields;
pub struct TeamFields;
pub struct AgentFields;
pub struct TournamentFields;
pub struct MapFields;
/// Categories without known page structure
pub struct NoFields;

impl FieldExtractor for PlayerFields {
    fn extract(&self, doc: &Html, record: &mut EntityRecord) {
        scan_infobox(doc, PLAYER_RULES, record);
    }
}

impl FieldExtractor for TeamFields {
    fn extract(&self, doc: &Html, record: &mut EntityRecord) {
        scan_infobox(doc, TEAM_RULES, record);
        if let Some(players) = roster(doc) {
            record.set("current_players", players);
        }
    }
}

impl FieldExtractor for AgentFields {
    fn extract(&self, doc: &Html, record: &mut EntityRecord) {
        scan_infobox(doc, AGENT_RULES, record);
        let abilities: Vec<String> = dom::marker_spans(doc, &ABILITY_MARKER)
            .map(|span| dom::text_of(&span))
            .filter(|text| !text.is_empty() && text.chars().count() < MAX_ABILITY_CHARS)
            .take(MAX_ABILITIES)
            .collect();
        record.set("abilities", abilities.join(", "));
    }
}

impl FieldExtractor for TournamentFields {
    fn extract(&self, doc: &Html, record: &mut EntityRecord) {
        if scan_infobox(doc, TOURNAMENT_RULES, record) == 0 {
            if let Some(text) = description(doc) {
                record.set("description", text);
            }
        }
    }
}

impl FieldExtractor for MapFields {
    fn extract(&self, doc: &Html, record: &mut EntityRecord) {
        scan_infobox(doc, MAP_RULES, record);
    }
}

impl FieldExtractor for NoFields {
    fn extract(&self, _doc: &Html, _record: &mut EntityRecord) {}
}

/// Player names of the first rows of the roster table, comma separated.
fn roster(doc: &Html) -> Option<String> {
    let table = dom::marker_spans(doc, &ROSTER_MARKER)
        .find_map(|span| dom::next_after_parent(&span, "table"))?;

    let players: Vec<String> = table
        .select(ROWS.clone())
        .skip(1)
        .take(ROSTER_SIZE)
        .filter_map(|row| {
            let cell = row.select(CELLS.clone()).nth(1)?;
            let link = cell.select(LINKS.clone()).next()?;
            Some(dom::text_of(&link)).filter(|name| !name.is_empty())
        })
        .collect();

    (!players.is_empty()).then(|| players.join(", "))
}

pub fn extractor_for(category: &Category) -> &'static dyn FieldExtractor {
    match category {
        Category::Players => &PlayerFields,
        Category::Teams => &TeamFields,
        Category::Agents => &AgentFields,
        Category::Tournaments => &TournamentFields,
        Category::Maps => &MapFields,
        Category::Other(_) => &NoFields,
    }
}

/// Builds the record of one entity page.
pub fn extract_fields(doc: &Html, name: &str, category: &Category) -> EntityRecord {
    let mut record = EntityRecord::new(category, name);
    extractor_for(category).extract(doc, &mut record);
    record
}
