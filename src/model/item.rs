use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Opaque unique id, assigned when the item is created
    pub id: String,
    /// Sanitized, non-empty title text
    pub title: String,
    pub completed: bool,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: i64) -> Self {
        Item {
            id: id.into(),
            title: title.into(),
            completed: false,
            created_at,
        }
    }

    /// Apply the set fields of a patch in place
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Partial update of an item: only the `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ItemPatch {
    pub fn title(title: impl Into<String>) -> Self {
        ItemPatch {
            title: Some(title.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        ItemPatch {
            title: None,
            completed: Some(completed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

/// Which subset of the list is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    /// Whether an item is visible under this filter
    pub fn matches(self, item: &Item) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !item.completed,
            Filter::Completed => item.completed,
        }
    }

    /// Tab label
    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    /// The next filter in tab order, wrapping around
    pub fn next(self) -> Filter {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Active => write!(f, "active"),
            Filter::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" | "done" => Ok(Filter::Completed),
            other => Err(format!(
                "unknown filter '{}' (expected all, active, or completed)",
                other
            )),
        }
    }
}
