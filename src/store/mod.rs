//! Persistence backends behind one contract.
//!
//! A [`Store`] is either pull-delivery ([`LocalStore`]: the caller asks for a
//! fresh snapshot after each mutation via [`Store::resync`]) or push-delivery
//! ([`RemoteStore`]: snapshots arrive on their own from [`Store::poll`]).
//! Every delivery is the complete item list, never a delta.

pub mod database;
pub mod local;
pub mod remote;
#[cfg(test)]
pub(crate) mod testing;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::io::recovery::RecoveryLog;
use crate::model::config::Backend;
use crate::model::item::{Item, ItemPatch};
use crate::model::workspace::Workspace;
use crate::ops::item_ops;

pub use database::{Database, DbError, FileDatabase};
pub use local::{FileKeyValue, KeyValue, LocalStore};
pub use remote::RemoteStore;

/// Snapshot callback registered with [`Store::subscribe`]
pub type ChangeFn = Box<dyn FnMut(Vec<Item>)>;

/// Source of creation timestamps, in milliseconds since the epoch
pub type Clock = Box<dyn Fn() -> i64>;

/// How a store delivers changes to its subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Snapshots only on subscribe and on `resync`
    Pull,
    /// Snapshots arrive from `poll` whenever the data changes, own writes included
    Push,
}

/// Identifies one subscription for `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// The persistence contract shared by both backends.
///
/// Mutations never fail from the caller's point of view: backend errors are
/// written to the recovery log and otherwise dropped.
pub trait Store {
    fn delivery(&self) -> Delivery;

    /// Register a snapshot callback. Pull stores call it immediately with the
    /// persisted list; push stores deliver the first snapshot on the next `poll`.
    fn subscribe(&mut self, on_change: ChangeFn) -> SubscriptionHandle;

    fn unsubscribe(&mut self, handle: SubscriptionHandle);

    /// Persist a new, not-completed item with a fresh id and timestamp
    fn create(&mut self, title: &str);

    /// Persist only the fields set in `fields`; empty patches do nothing
    fn patch(&mut self, id: &str, fields: &ItemPatch);

    /// Removing an id that does not exist is a no-op
    fn remove_one(&mut self, id: &str);

    fn remove_many(&mut self, ids: &[String]);

    fn remove_all(&mut self);

    /// Re-deliver the current snapshot to subscribers (pull stores only)
    fn resync(&mut self) {}

    /// Deliver pending change notifications (push stores only)
    fn poll(&mut self) {}
}

/// Subscriber registry, invoked in registration order
#[derive(Default)]
pub(crate) struct Subscribers {
    next: u64,
    callbacks: IndexMap<SubscriptionHandle, ChangeFn>,
}

impl Subscribers {
    pub fn add(&mut self, on_change: ChangeFn) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next);
        self.next += 1;
        self.callbacks.insert(handle, on_change);
        handle
    }

    pub fn remove(&mut self, handle: SubscriptionHandle) {
        self.callbacks.shift_remove(&handle);
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn notify(&mut self, items: &[Item]) {
        for callback in self.callbacks.values_mut() {
            callback(items.to_vec());
        }
    }

    pub fn notify_one(&mut self, handle: SubscriptionHandle, items: &[Item]) {
        if let Some(callback) = self.callbacks.get_mut(&handle) {
            callback(items.to_vec());
        }
    }
}

/// Build an item from stored fields, or None if the shape is wrong.
///
/// Requires `title` (string), `completed` (bool) and `createdAt` (number).
/// The title is sanitized; entries left with an empty title are rejected.
pub(crate) fn item_from_fields(id: &str, fields: &Map<String, Value>) -> Option<Item> {
    let title = fields.get("title")?.as_str()?;
    let completed = fields.get("completed")?.as_bool()?;
    let created_at = timestamp(fields.get("createdAt")?)?;
    let title = item_ops::sanitize_title(title)?;
    if id.is_empty() {
        return None;
    }
    Some(Item {
        id: id.to_string(),
        title,
        completed,
        created_at,
    })
}

/// Stored timestamps are plain JSON numbers; fractional values are truncated.
fn timestamp(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Open the backend selected for this workspace.
pub fn open(workspace: &Workspace, backend: Backend) -> Result<Box<dyn Store>, DbError> {
    let log = RecoveryLog::in_dir(&workspace.chore_dir);
    match backend {
        Backend::Local => {
            let kv = FileKeyValue::new(&workspace.chore_dir);
            Ok(Box::new(LocalStore::open(
                Box::new(kv),
                &workspace.config.local.key,
                log,
            )))
        }
        Backend::Remote => {
            let db = FileDatabase::open(&workspace.database_path())?;
            Ok(Box::new(RemoteStore::new(
                Box::new(db),
                &workspace.config.remote.collection,
                log,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn item_from_valid_fields() {
        let item = item_from_fields(
            "k1",
            &fields(json!({"title": " Buy milk ", "completed": true, "createdAt": 5})),
        )
        .unwrap();
        assert_eq!(item.id, "k1");
        assert_eq!(item.title, "Buy milk");
        assert!(item.completed);
        assert_eq!(item.created_at, 5);
    }

    #[test]
    fn item_from_fields_rejects_bad_shapes() {
        let cases = [
            json!({"completed": false, "createdAt": 1}),
            json!({"title": 3, "completed": false, "createdAt": 1}),
            json!({"title": "x", "completed": "no", "createdAt": 1}),
            json!({"title": "x", "completed": false}),
            json!({"title": "x", "completed": false, "createdAt": "yesterday"}),
            json!({"title": " \u{0001} ", "completed": false, "createdAt": 1}),
        ];
        for case in cases {
            assert!(item_from_fields("k", &fields(case.clone())).is_none(), "{}", case);
        }
        assert!(
            item_from_fields("", &fields(json!({"title": "x", "completed": false, "createdAt": 1})))
                .is_none()
        );
    }

    #[test]
    fn fractional_timestamps_truncate() {
        let item = item_from_fields(
            "k",
            &fields(json!({"title": "x", "completed": false, "createdAt": 1700000000000.7})),
        )
        .unwrap();
        assert_eq!(item.created_at, 1700000000000);
    }

    #[test]
    fn subscribers_notify_in_order_and_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Subscribers::default();
        let a = {
            let seen = seen.clone();
            subs.add(Box::new(move |items| seen.borrow_mut().push(("a", items.len()))))
        };
        {
            let seen = seen.clone();
            subs.add(Box::new(move |items| seen.borrow_mut().push(("b", items.len()))));
        }

        subs.notify(&[Item::new("1", "x", 1)]);
        subs.remove(a);
        subs.notify(&[]);

        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("b", 0)]);
    }
}
