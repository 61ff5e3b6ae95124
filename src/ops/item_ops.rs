use crate::model::item::Item;

/// Strip ASCII control characters (U+0000..U+001F, U+007F) and trim
/// surrounding whitespace.
pub fn sanitize(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !is_stripped_control(*c)).collect();
    stripped.trim().to_string()
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}')
}

/// Sanitize and reject titles that end up empty
pub fn sanitize_title(raw: &str) -> Option<String> {
    let title = sanitize(raw);
    if title.is_empty() { None } else { Some(title) }
}

/// Stable sort, newest `created_at` first. Ties keep their arrival order.
pub fn sort_newest_first(items: &mut [Item]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an item id: the creation time followed by six random characters.
/// Ids generated later sort after earlier ones when the clock moves forward.
pub fn new_item_id(now: i64) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", now, &random[..6])
}

/// Error resolving a user-supplied id or id prefix
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no item matches '{0}'")]
    NotFound(String),
    #[error("'{prefix}' is ambiguous ({count} items match)")]
    Ambiguous { prefix: String, count: usize },
}

/// Resolve an exact id or a unique id prefix to a full id
pub fn resolve_id<'a>(items: &'a [Item], query: &str) -> Result<&'a str, ResolveError> {
    if let Some(item) = items.iter().find(|i| i.id == query) {
        return Ok(&item.id);
    }
    let matches: Vec<&Item> = items.iter().filter(|i| i.id.starts_with(query)).collect();
    match matches.as_slice() {
        [only] if !query.is_empty() => Ok(&only.id),
        [] => Err(ResolveError::NotFound(query.to_string())),
        _ if query.is_empty() => Err(ResolveError::NotFound(query.to_string())),
        many => Err(ResolveError::Ambiguous {
            prefix: query.to_string(),
            count: many.len(),
        }),
    }
}
