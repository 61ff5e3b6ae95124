//! Pure projection of controller state into what a screen shows.

pub mod edit;

pub use edit::{RowEdit, TextInput};

use crate::model::item::{Filter, Item};

/// Items matching `filter`, in their current order
pub fn visible_items(items: &[Item], filter: Filter) -> Vec<&Item> {
    items.iter().filter(|i| filter.matches(i)).collect()
}

/// Number of not-completed items in the whole list, whatever the filter
pub fn active_count(items: &[Item]) -> usize {
    items.iter().filter(|i| !i.completed).count()
}

/// One displayed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// Everything a renderer needs for one frame of the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub rows: Vec<Row>,
    pub filter: Filter,
    pub active_count: usize,
    pub total: usize,
}

impl ListView {
    pub fn project(items: &[Item], filter: Filter) -> Self {
        ListView {
            rows: visible_items(items, filter)
                .into_iter()
                .map(|i| Row {
                    id: i.id.clone(),
                    title: i.title.clone(),
                    completed: i.completed,
                })
                .collect(),
            filter,
            active_count: active_count(items),
            total: items.len(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.total - self.active_count
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// "1 item left", "3 items left"
    pub fn items_left_label(&self) -> String {
        let noun = if self.active_count == 1 { "item" } else { "items" };
        format!("{} {} left", self.active_count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Item> {
        vec![
            Item::new("c", "Walk dog", 3),
            Item {
                completed: true,
                ..Item::new("b", "Buy milk", 2)
            },
            Item::new("a", "Call mom", 1),
        ]
    }

    fn ids(items: Vec<&Item>) -> Vec<&str> {
        items.into_iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn filters_preserve_order() {
        let items = sample();
        assert_eq!(ids(visible_items(&items, Filter::All)), vec!["c", "b", "a"]);
        assert_eq!(ids(visible_items(&items, Filter::Active)), vec!["c", "a"]);
        assert_eq!(ids(visible_items(&items, Filter::Completed)), vec!["b"]);
    }

    #[test]
    fn active_and_completed_partition_all() {
        let items = sample();
        let active = visible_items(&items, Filter::Active);
        let completed = visible_items(&items, Filter::Completed);
        assert_eq!(active.len() + completed.len(), items.len());
        assert!(active.iter().all(|a| !completed.iter().any(|c| c.id == a.id)));
    }

    #[test]
    fn active_count_ignores_filter() {
        let items = sample();
        for filter in Filter::ALL {
            let view = ListView::project(&items, filter);
            assert_eq!(view.active_count, 2);
            assert_eq!(view.total, 3);
            assert_eq!(view.completed_count(), 1);
        }
        assert_eq!(ListView::project(&items, Filter::Completed).rows.len(), 1);
    }

    #[test]
    fn projection_is_deterministic() {
        let items = sample();
        assert_eq!(
            ListView::project(&items, Filter::Active),
            ListView::project(&items, Filter::Active)
        );
    }

    #[test]
    fn labels_and_positions() {
        let view = ListView::project(&sample(), Filter::All);
        assert_eq!(view.items_left_label(), "2 items left");
        assert_eq!(view.position("a"), Some(2));
        assert_eq!(view.position("zz"), None);

        let one = ListView::project(&[Item::new("x", "x", 1)], Filter::All);
        assert_eq!(one.items_left_label(), "1 item left");
    }
}
