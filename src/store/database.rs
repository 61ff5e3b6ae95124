//! The realtime database behind the remote backend.
//!
//! Data is one JSON tree addressed by slash-separated paths. Writes follow
//! realtime-database semantics: `update` merges into (and creates) a node,
//! `null` values delete keys, empty nodes disappear, and removing an absent
//! path succeeds.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::io::lock::{DEFAULT_LOCK_TIMEOUT, DocumentLock, LockError};
use crate::io::recovery::atomic_write;
use crate::io::watcher::DocumentWatcher;
use crate::ops::item_ops;

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("invalid database path '{0}'")]
    InvalidPath(String),
    #[error("database document {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

/// A realtime JSON database with change notification.
pub trait Database {
    /// Add a child under `path` with a generated, chronologically ordered key
    fn push(&mut self, path: &str, value: Value) -> Result<String, DbError>;

    /// Merge `fields` into the node at `path`, creating it if absent
    fn update(&mut self, path: &str, fields: Map<String, Value>) -> Result<(), DbError>;

    /// Delete the node at `path`
    fn remove(&mut self, path: &str) -> Result<(), DbError>;

    /// Read the node at `path` (`Value::Null` if absent)
    fn read(&mut self, path: &str) -> Result<Value, DbError>;

    /// Whether the data changed since the last call, through this handle or any other
    fn take_changed(&mut self) -> bool;
}

/// Whether `key` is usable as a single path segment
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| matches!(c, '/' | '.' | '#' | '$' | '[' | ']') || c.is_control())
}

pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, DbError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().all(|s| is_valid_key(s)) {
        Ok(segments)
    } else {
        Err(DbError::InvalidPath(path.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tree operations
// ---------------------------------------------------------------------------

pub(crate) fn get<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, seg| node.as_object()?.get(*seg))
}

/// Walk to `segments`, turning anything that is not an object into one.
fn object_at<'a>(root: &'a mut Value, segments: &[&str]) -> &'a mut Map<String, Value> {
    let mut node = root;
    for seg in segments {
        node = force_object(node)
            .entry(seg.to_string())
            .or_insert(Value::Null);
    }
    force_object(node)
}

fn force_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

pub(crate) fn apply_set_child(root: &mut Value, segments: &[&str], key: &str, value: Value) {
    object_at(root, segments).insert(key.to_string(), value);
    prune(root);
}

pub(crate) fn apply_update(root: &mut Value, segments: &[&str], fields: Map<String, Value>) {
    let target = object_at(root, segments);
    for (key, value) in fields {
        if value.is_null() {
            target.shift_remove(&key);
        } else {
            target.insert(key, value);
        }
    }
    prune(root);
}

pub(crate) fn apply_remove(root: &mut Value, segments: &[&str]) {
    match segments.split_last() {
        None => *root = Value::Null,
        Some((last, parents)) => {
            let parent = parents
                .iter()
                .try_fold(&mut *root, |node, seg| node.as_object_mut()?.get_mut(*seg));
            if let Some(Value::Object(map)) = parent {
                map.shift_remove(*last);
            }
        }
    }
    prune(root);
}

/// Drop nulls and empty objects, bottom-up. An empty root becomes null.
fn prune(node: &mut Value) {
    if let Value::Object(map) = node {
        for child in map.values_mut() {
            prune(child);
        }
        map.retain(|_, v| !v.is_null());
        if map.is_empty() {
            *node = Value::Null;
        }
    }
}

/// Key for a pushed child: creation time first, so keys sort chronologically.
pub(crate) fn push_key() -> String {
    item_ops::new_item_id(item_ops::now_millis())
}

/// Insert `value` under a key from `next_key` that no sibling uses yet.
pub(crate) fn apply_push(
    root: &mut Value,
    segments: &[&str],
    value: Value,
    mut next_key: impl FnMut() -> String,
) -> String {
    let mut key = next_key();
    while get(root, segments).and_then(|node| node.get(&key)).is_some() {
        key = next_key();
    }
    apply_set_child(root, segments, &key, value);
    key
}

// ---------------------------------------------------------------------------
// File-backed database
// ---------------------------------------------------------------------------

/// A database kept in one JSON document on disk.
///
/// Every process that opens the same document shares the data. Writers
/// serialize through an advisory lock and replace the document atomically.
/// A filesystem watcher reports writes made by other processes; writes made
/// through this handle are reported directly.
pub struct FileDatabase {
    path: PathBuf,
    changed: bool,
    watcher: Option<DocumentWatcher>,
}

impl FileDatabase {
    /// Open (and watch) the document at `path`, creating its directory.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let mut db = Self::open_unwatched(path)?;
        // Without a watcher, only this handle's own writes are reported
        db.watcher = DocumentWatcher::start(path).ok();
        Ok(db)
    }

    /// Open without a filesystem watcher
    pub fn open_unwatched(path: &Path) -> Result<Self, DbError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| DbError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        Ok(FileDatabase {
            path: path.to_path_buf(),
            changed: false,
            watcher: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Value, DbError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Value::Null),
            Err(e) => {
                return Err(DbError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| DbError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Locked read-modify-write. Unchanged documents are not rewritten.
    fn mutate(&mut self, f: impl FnOnce(&mut Value)) -> Result<(), DbError> {
        let _lock = DocumentLock::acquire(&self.path, DEFAULT_LOCK_TIMEOUT)?;
        let before = self.load()?;
        let mut doc = before.clone();
        f(&mut doc);
        if doc == before {
            return Ok(());
        }
        let content = serde_json::to_string_pretty(&doc).map_err(|e| DbError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;
        atomic_write(&self.path, content.as_bytes()).map_err(|e| DbError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        self.changed = true;
        Ok(())
    }
}

impl Database for FileDatabase {
    fn push(&mut self, path: &str, value: Value) -> Result<String, DbError> {
        let segments = split_path(path)?;
        let mut key = String::new();
        // Chosen under the lock so a concurrent push cannot take the same key
        self.mutate(|doc| key = apply_push(doc, &segments, value, push_key))?;
        Ok(key)
    }

    fn update(&mut self, path: &str, fields: Map<String, Value>) -> Result<(), DbError> {
        let segments = split_path(path)?;
        self.mutate(|doc| apply_update(doc, &segments, fields))
    }

    fn remove(&mut self, path: &str) -> Result<(), DbError> {
        let segments = split_path(path)?;
        self.mutate(|doc| apply_remove(doc, &segments))
    }

    fn read(&mut self, path: &str) -> Result<Value, DbError> {
        let segments = split_path(path)?;
        let doc = self.load()?;
        Ok(get(&doc, &segments).cloned().unwrap_or(Value::Null))
    }

    fn take_changed(&mut self) -> bool {
        let external = self.watcher.as_ref().is_some_and(|w| w.poll());
        let changed = self.changed || external;
        self.changed = false;
        changed
    }
}
