use serde_json::{Map, Value, json};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, RecoveryLog};
use crate::model::item::{Item, ItemPatch};
use crate::ops::item_ops;

use super::database::{Database, DbError, is_valid_key};
use super::{ChangeFn, Clock, Delivery, Store, Subscribers, SubscriptionHandle, item_from_fields};

/// Push-delivery store over one collection node of a realtime database.
///
/// Keeps no cache. Writes go straight to the database and come back as a
/// full snapshot on a later [`Store::poll`], like any other client's writes.
pub struct RemoteStore {
    db: Box<dyn Database>,
    collection: String,
    subscribers: Subscribers,
    log: RecoveryLog,
    clock: Clock,
    initial_read: bool,
}

impl RemoteStore {
    pub fn new(db: Box<dyn Database>, collection: &str, log: RecoveryLog) -> Self {
        RemoteStore {
            db,
            collection: collection.trim_matches('/').to_string(),
            subscribers: Subscribers::default(),
            log,
            clock: Box::new(item_ops::now_millis),
            initial_read: false,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn child_path(&self, id: &str) -> Option<String> {
        if is_valid_key(id) {
            Some(format!("{}/{}", self.collection, id))
        } else {
            self.log.log(
                RecoveryEntry::new(RecoveryCategory::Remote, "refused invalid item id")
                    .field("collection", &self.collection)
                    .field("id", id),
            );
            None
        }
    }

    fn report(&self, action: &str, path: &str, err: DbError, body: Option<String>) {
        let mut entry = RecoveryEntry::new(RecoveryCategory::Remote, format!("{} failed", action))
            .field("path", path)
            .field("error", err.to_string());
        if let Some(body) = body {
            entry = entry.body(body);
        }
        self.log.log(entry);
    }

    /// Read the whole collection. Children without a valid shape are skipped.
    fn snapshot(&mut self) -> Result<Vec<Item>, DbError> {
        let node = self.db.read(&self.collection)?;
        Ok(match node {
            Value::Object(children) => children
                .iter()
                .filter_map(|(id, child)| item_from_fields(id, child.as_object()?))
                .collect(),
            _ => Vec::new(),
        })
    }
}

impl Store for RemoteStore {
    fn delivery(&self) -> Delivery {
        Delivery::Push
    }

    fn subscribe(&mut self, on_change: ChangeFn) -> SubscriptionHandle {
        self.initial_read = true;
        self.subscribers.add(on_change)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        self.subscribers.remove(handle);
    }

    fn create(&mut self, title: &str) {
        let value = json!({
            "title": title,
            "completed": false,
            "createdAt": (self.clock)(),
        });
        let body = value.to_string();
        if let Err(e) = self.db.push(&self.collection, value) {
            self.report("create", &self.collection, e, Some(body));
        }
    }

    fn patch(&mut self, id: &str, fields: &ItemPatch) {
        if fields.is_empty() {
            return;
        }
        let Some(path) = self.child_path(id) else {
            return;
        };
        let mut update = Map::new();
        if let Some(title) = &fields.title {
            update.insert("title".to_string(), Value::String(title.clone()));
        }
        if let Some(completed) = fields.completed {
            update.insert("completed".to_string(), Value::Bool(completed));
        }
        let body = Value::Object(update.clone()).to_string();
        if let Err(e) = self.db.update(&path, update) {
            self.report("patch", &path, e, Some(body));
        }
    }

    fn remove_one(&mut self, id: &str) {
        let Some(path) = self.child_path(id) else {
            return;
        };
        if let Err(e) = self.db.remove(&path) {
            self.report("remove", &path, e, None);
        }
    }

    fn remove_many(&mut self, ids: &[String]) {
        for id in ids {
            self.remove_one(id);
        }
    }

    fn remove_all(&mut self) {
        let path = self.collection.clone();
        if let Err(e) = self.db.remove(&path) {
            self.report("remove all", &path, e, None);
        }
    }

    fn poll(&mut self) {
        let changed = self.db.take_changed();
        if self.subscribers.is_empty() || !(changed || self.initial_read) {
            return;
        }
        self.initial_read = false;
        match self.snapshot() {
            Ok(items) => self.subscribers.notify(&items),
            Err(e) => {
                let path = self.collection.clone();
                self.report("read", &path, e, None);
            }
        }
    }
}
