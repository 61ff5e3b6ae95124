use chrono::{DateTime, Local};
use serde::Serialize;

use crate::model::item::{Filter, Item};
use crate::view::ListView;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemJson {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: i64,
    /// `created_at` as RFC 3339, when representable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJson {
    pub filter: Filter,
    pub active_count: usize,
    pub total: usize,
    pub items: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct ClearedJson {
    pub removed: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn item_to_json(item: &Item) -> ItemJson {
    ItemJson {
        id: item.id.clone(),
        title: item.title.clone(),
        completed: item.completed,
        created_at: item.created_at,
        created: DateTime::from_timestamp_millis(item.created_at).map(|t| t.to_rfc3339()),
    }
}

pub fn list_to_json(items: &[Item], view: &ListView) -> ListJson {
    ListJson {
        filter: view.filter,
        active_count: view.active_count,
        total: view.total,
        items: view
            .rows
            .iter()
            .filter_map(|row| items.iter().find(|i| i.id == row.id))
            .map(item_to_json)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// First `chars` characters of `id`. Ids are opaque and may be non-ASCII.
pub fn id_prefix(id: &str, chars: usize) -> &str {
    id.char_indices().nth(chars).map_or(id, |(i, _)| &id[..i])
}

/// Shortest prefix length in chars (at least `min`) that keeps every id distinct
pub fn unique_prefix_len(ids: &[&str], min: usize) -> usize {
    let longest = ids.iter().map(|id| id.chars().count()).max().unwrap_or(0);
    (min..longest)
        .find(|&n| {
            let mut prefixes: Vec<&str> = ids.iter().map(|id| id_prefix(id, n)).collect();
            prefixes.sort_unstable();
            prefixes.windows(2).all(|w| w[0] != w[1])
        })
        .unwrap_or(longest)
}

/// Local creation time, minute precision
pub fn format_created(created_at: i64) -> String {
    DateTime::from_timestamp_millis(created_at)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// `[x] 1700000000 Buy milk  2023-11-14 22:13`
pub fn format_item_line(item: &Item, id_width: usize) -> String {
    let check = if item.completed { 'x' } else { ' ' };
    let id = id_prefix(&item.id, id_width);
    format!(
        "[{}] {:<w$} {}  {}",
        check,
        id,
        item.title,
        format_created(item.created_at),
        w = id_width
    )
}

/// Every visible row, then the count line
pub fn format_listing(items: &[Item], view: &ListView) -> Vec<String> {
    let visible: Vec<&Item> = view
        .rows
        .iter()
        .filter_map(|row| items.iter().find(|i| i.id == row.id))
        .collect();
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    let width = unique_prefix_len(&ids, 8);

    let mut lines: Vec<String> = visible
        .iter()
        .map(|item| format_item_line(item, width))
        .collect();
    if visible.is_empty() {
        lines.push(match view.filter {
            Filter::All => "(no items)".to_string(),
            other => format!("(no {} items)", other),
        });
    }
    lines.push(String::new());
    lines.push(view.items_left_label());
    lines
}
