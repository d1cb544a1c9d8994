use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Content category of a wiki entity.
///
/// Names outside of the known set are kept verbatim in `Other`, their pages only
/// yield the minimal `{category, name}` record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Players,
    Teams,
    Agents,
    Tournaments,
    Maps,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Players => "Players",
            Self::Teams => "Teams",
            Self::Agents => "Agents",
            Self::Tournaments => "Tournaments",
            Self::Maps => "Maps",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        match name {
            "Players" => Self::Players,
            "Teams" => Self::Teams,
            "Agents" => Self::Agents,
            "Tournaments" => Self::Tournaments,
            "Maps" => Self::Maps,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits of a single category crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlBudget {
    pub max_records: usize,
    pub max_pages: usize,
    pub max_links_per_page: usize,
}

impl Default for CrawlBudget {
    fn default() -> Self {
        Self {
            max_records: 20,
            max_pages: 3,
            max_links_per_page: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpec {
    pub name: Category,
    pub listing_path: String,
    #[serde(default)]
    pub paginated: Option<bool>,
    #[serde(default)]
    pub budget: CrawlBudget,
}

impl CategorySpec {
    pub fn new(name: Category, listing_path: &str, budget: CrawlBudget) -> Self {
        Self {
            name,
            listing_path: listing_path.to_string(),
            paginated: None,
            budget,
        }
    }

    /// Category listings (`Category:` pages) are paginated, portals and overview
    /// pages are single listings unless configured otherwise.
    pub fn is_paginated(&self) -> bool {
        self.paginated
            .unwrap_or_else(|| self.listing_path.contains("Category:"))
    }
}

/// An entity link found on a listing page.
///
/// Field order matters: the derived ordering sorts by label, then URL, which is
/// the order walkers slice links in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateLink {
    pub label: String,
    pub url: String,
}

impl CandidateLink {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Flat metadata of one entity page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub category: String,
    pub name: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl EntityRecord {
    pub const CATEGORY: &'static str = "category";
    pub const NAME: &'static str = "name";

    pub fn new(category: &Category, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets a category specific field, empty values and the reserved
    /// `category`/`name` keys are ignored.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() || field == Self::CATEGORY || field == Self::NAME {
            return false;
        }
        self.fields.insert(field.to_string(), value);
        true
    }

    /// Value of any column, including `category` and `name`.
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            Self::CATEGORY => Some(&self.category),
            Self::NAME => Some(&self.name),
            field => self.fields.get(field).map(String::as_str),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.category.trim().is_empty() && !self.name.trim().is_empty()
    }
}
