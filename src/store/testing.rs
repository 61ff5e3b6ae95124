//! In-memory stand-ins for the storage backends.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use serde_json::{Map, Value};

use super::database::{self, Database, DbError};
use super::local::KeyValue;

#[derive(Default)]
struct KvState {
    values: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

/// Key-value map shared between clones, so a test can inspect what a store wrote.
#[derive(Clone, Default)]
pub struct MemoryKeyValue {
    state: Rc<RefCell<KvState>>,
}

impl MemoryKeyValue {
    pub fn with(key: &str, value: &str) -> Self {
        let kv = MemoryKeyValue::default();
        kv.state
            .borrow_mut()
            .values
            .insert(key.to_string(), value.to_string());
        kv
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    /// Number of `set` calls, failed ones included
    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }
}

impl KeyValue for MemoryKeyValue {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.state.borrow().values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.writes += 1;
        if state.fail_writes {
            return Err(io::Error::other("quota exceeded"));
        }
        state.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct DbState {
    doc: Value,
    generation: u64,
    offline: bool,
    calls: Vec<String>,
}

/// Shared JSON tree. Each handle from [`MemoryDatabase::connect`] sees the
/// same data and tracks which changes it has already reported.
pub struct MemoryDatabase {
    state: Rc<RefCell<DbState>>,
    seen: u64,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        MemoryDatabase {
            state: Rc::new(RefCell::new(DbState::default())),
            seen: 0,
        }
    }

    /// Another client of the same data
    pub fn connect(&self) -> Self {
        MemoryDatabase {
            state: self.state.clone(),
            seen: self.state.borrow().generation,
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    /// Write calls made by any handle, as `"<op> <path>"`
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn doc(&self) -> Value {
        self.state.borrow().doc.clone()
    }

    /// Replace the whole tree, as a foreign writer would
    pub fn set_doc(&self, doc: Value) {
        let mut state = self.state.borrow_mut();
        state.doc = doc;
        state.generation += 1;
    }

    fn write(&mut self, op: &str, path: &str, f: impl FnOnce(&mut Value)) -> Result<(), DbError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("{} {}", op, path));
        if state.offline {
            return Err(DbError::Unavailable("offline".to_string()));
        }
        let before = state.doc.clone();
        f(&mut state.doc);
        if state.doc != before {
            state.generation += 1;
        }
        Ok(())
    }
}

impl Database for MemoryDatabase {
    fn push(&mut self, path: &str, value: Value) -> Result<String, DbError> {
        let segments = database::split_path(path)?;
        let mut key = String::new();
        self.write("push", path, |doc| {
            key = database::apply_push(doc, &segments, value, database::push_key)
        })?;
        Ok(key)
    }

    fn update(&mut self, path: &str, fields: Map<String, Value>) -> Result<(), DbError> {
        let segments = database::split_path(path)?;
        self.write("update", path, |doc| {
            database::apply_update(doc, &segments, fields)
        })
    }

    fn remove(&mut self, path: &str) -> Result<(), DbError> {
        let segments = database::split_path(path)?;
        self.write("remove", path, |doc| database::apply_remove(doc, &segments))
    }

    fn read(&mut self, path: &str) -> Result<Value, DbError> {
        let segments = database::split_path(path)?;
        let state = self.state.borrow();
        if state.offline {
            return Err(DbError::Unavailable("offline".to_string()));
        }
        Ok(database::get(&state.doc, &segments)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn take_changed(&mut self) -> bool {
        let generation = self.state.borrow().generation;
        let changed = generation != self.seen;
        self.seen = generation;
        changed
    }
}
