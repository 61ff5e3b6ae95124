use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, RecoveryLog, atomic_write};
use crate::model::item::{Item, ItemPatch};
use crate::ops::item_ops;

use super::{ChangeFn, Clock, Delivery, Store, Subscribers, SubscriptionHandle, item_from_fields};

/// Synchronous string key-value storage
pub trait KeyValue {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// One file per key (`<key>.json`) inside a directory
pub struct FileKeyValue {
    dir: PathBuf,
}

impl FileKeyValue {
    pub fn new(dir: &Path) -> Self {
        FileKeyValue {
            dir: dir.to_path_buf(),
        }
    }

    fn key_path(&self, key: &str) -> io::Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key '{}'", key),
            ));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValue for FileKeyValue {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)?) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        atomic_write(&self.key_path(key)?, value.as_bytes())
    }
}

/// Pull-delivery store over a single key holding the whole list.
///
/// The list lives in memory and is written back in full after every
/// mutation. A failed write is logged and the in-memory list is kept, so
/// the view can run ahead of what is on disk until the next good write.
pub struct LocalStore {
    kv: Box<dyn KeyValue>,
    key: String,
    items: Vec<Item>,
    subscribers: Subscribers,
    log: RecoveryLog,
    clock: Clock,
}

impl LocalStore {
    /// Load the list stored under `key`
    pub fn open(kv: Box<dyn KeyValue>, key: &str, log: RecoveryLog) -> Self {
        let items = load_items(kv.as_ref(), key, &log);
        LocalStore {
            kv,
            key: key.to_string(),
            items,
            subscribers: Subscribers::default(),
            log,
            clock: Box::new(item_ops::now_millis),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The in-memory list, in stored order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    fn fresh_id(&self, now: i64) -> String {
        loop {
            let id = item_ops::new_item_id(now);
            if !self.items.iter().any(|i| i.id == id) {
                return id;
            }
        }
    }

    fn save(&mut self) {
        let content = match serde_json::to_string(&self.items) {
            Ok(c) => c,
            Err(e) => {
                self.log.log(
                    RecoveryEntry::new(RecoveryCategory::Write, "could not serialize list")
                        .field("key", &self.key)
                        .field("error", e.to_string()),
                );
                return;
            }
        };
        if let Err(e) = self.kv.set(&self.key, &content) {
            self.log.log(
                RecoveryEntry::new(RecoveryCategory::Write, "could not save list")
                    .field("key", &self.key)
                    .field("error", e.to_string())
                    .body(content),
            );
        }
    }
}

impl Store for LocalStore {
    fn delivery(&self) -> Delivery {
        Delivery::Pull
    }

    fn subscribe(&mut self, on_change: ChangeFn) -> SubscriptionHandle {
        let handle = self.subscribers.add(on_change);
        self.subscribers.notify_one(handle, &self.items);
        handle
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        self.subscribers.remove(handle);
    }

    fn create(&mut self, title: &str) {
        let now = (self.clock)();
        let id = self.fresh_id(now);
        self.items.insert(0, Item::new(id, title, now));
        self.save();
    }

    fn patch(&mut self, id: &str, fields: &ItemPatch) {
        if fields.is_empty() {
            return;
        }
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return;
        };
        item.apply(fields);
        self.save();
    }

    fn remove_one(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() != before {
            self.save();
        }
    }

    fn remove_many(&mut self, ids: &[String]) {
        let before = self.items.len();
        self.items.retain(|i| !ids.contains(&i.id));
        if self.items.len() != before {
            self.save();
        }
    }

    fn remove_all(&mut self) {
        self.items.clear();
        self.save();
    }

    fn resync(&mut self) {
        self.subscribers.notify(&self.items);
    }
}

/// Read and validate the stored list. Anything unreadable yields an empty
/// list and leaves the stored value alone.
fn load_items(kv: &dyn KeyValue, key: &str, log: &RecoveryLog) -> Vec<Item> {
    let text = match kv.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log.log(
                RecoveryEntry::new(RecoveryCategory::Parser, "could not read stored list")
                    .field("key", key)
                    .field("error", e.to_string()),
            );
            return Vec::new();
        }
    };

    let entries = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            log.log(
                RecoveryEntry::new(RecoveryCategory::Parser, "stored list is not an array")
                    .field("key", key)
                    .body(text),
            );
            return Vec::new();
        }
        Err(e) => {
            log.log(
                RecoveryEntry::new(RecoveryCategory::Parser, "stored list is not valid JSON")
                    .field("key", key)
                    .field("error", e.to_string())
                    .body(text),
            );
            return Vec::new();
        }
    };

    let mut items: Vec<Item> = Vec::with_capacity(entries.len());
    for entry in entries {
        let parsed = entry.as_object().and_then(|fields| {
            let id = fields.get("id")?.as_str()?;
            item_from_fields(id, fields)
        });
        match parsed {
            Some(item) if !items.iter().any(|i| i.id == item.id) => items.push(item),
            Some(item) => log.log(
                RecoveryEntry::new(RecoveryCategory::Parser, "dropped duplicate item id")
                    .field("key", key)
                    .field("id", item.id)
                    .body(entry.to_string()),
            ),
            None => log.log(
                RecoveryEntry::new(RecoveryCategory::Parser, "dropped malformed item")
                    .field("key", key)
                    .body(entry.to_string()),
            ),
        }
    }
    items
}
