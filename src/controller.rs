//! The list controller: owns the displayed list and turns user intents into
//! store calls.
//!
//! The controller never edits its list directly. Every change comes back
//! from the store as a complete snapshot and replaces the list wholesale in
//! [`Controller::on_store_change`].

use std::sync::mpsc::{self, Receiver};

use crate::model::item::{Filter, Item, ItemPatch};
use crate::ops::item_ops;
use crate::store::{Delivery, Store, SubscriptionHandle};
use crate::view::ListView;

/// Called with the projected list after every state change
pub type RenderFn = Box<dyn FnMut(&ListView)>;

pub struct Controller {
    store: Box<dyn Store>,
    subscription: SubscriptionHandle,
    snapshots: Receiver<Vec<Item>>,
    items: Vec<Item>,
    filter: Filter,
    on_render: Option<RenderFn>,
}

impl Controller {
    /// Subscribe to `store` and take whatever it delivers synchronously.
    pub fn new(mut store: Box<dyn Store>) -> Self {
        let (tx, rx) = mpsc::channel();
        let subscription = store.subscribe(Box::new(move |items| {
            let _ = tx.send(items);
        }));
        let mut controller = Controller {
            store,
            subscription,
            snapshots: rx,
            items: Vec::new(),
            filter: Filter::default(),
            on_render: None,
        };
        controller.drain();
        controller
    }

    /// Install the render hook and render once
    pub fn set_render_hook(&mut self, hook: RenderFn) {
        self.on_render = Some(hook);
        self.rerender();
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn delivery(&self) -> Delivery {
        self.store.delivery()
    }

    pub fn find(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn view(&self) -> ListView {
        ListView::project(&self.items, self.filter)
    }

    /// Let the store deliver pending pushes, then apply them.
    /// Returns whether the list was replaced.
    pub fn pump(&mut self) -> bool {
        self.store.poll();
        self.drain()
    }

    /// Apply the newest queued snapshot; older ones are superseded.
    fn drain(&mut self) -> bool {
        match self.snapshots.try_iter().last() {
            Some(items) => {
                self.on_store_change(items);
                true
            }
            None => false,
        }
    }

    /// Replace the list with an authoritative snapshot.
    pub fn on_store_change(&mut self, mut items: Vec<Item>) {
        item_ops::sort_newest_first(&mut items);
        self.items = items;
        self.rerender();
    }

    /// Run the render hook against the current state
    pub fn rerender(&mut self) {
        if let Some(hook) = self.on_render.as_mut() {
            hook(&ListView::project(&self.items, self.filter));
        }
    }

    fn after_mutation(&mut self) {
        self.store.resync();
        self.drain();
    }

    /// Add an item. Titles empty after sanitizing are rejected.
    pub fn submit(&mut self, raw_title: &str) -> bool {
        let Some(title) = item_ops::sanitize_title(raw_title) else {
            return false;
        };
        self.store.create(&title);
        self.after_mutation();
        true
    }

    pub fn toggle_complete(&mut self, id: &str, completed: bool) {
        self.store.patch(id, &ItemPatch::completed(completed));
        self.after_mutation();
    }

    /// Persist an edited title. An empty title discards the edit and the
    /// row goes back to showing its stored title.
    pub fn commit_edit(&mut self, id: &str, raw_title: &str) -> bool {
        let Some(title) = item_ops::sanitize_title(raw_title) else {
            self.rerender();
            return false;
        };
        self.store.patch(id, &ItemPatch::title(title));
        self.after_mutation();
        true
    }

    pub fn remove(&mut self, id: &str) {
        self.store.remove_one(id);
        self.after_mutation();
    }

    /// Remove every item completed right now. Returns how many were asked for.
    pub fn clear_completed(&mut self) -> usize {
        let ids: Vec<String> = self
            .items
            .iter()
            .filter(|i| i.completed)
            .map(|i| i.id.clone())
            .collect();
        if ids.is_empty() {
            return 0;
        }
        self.store.remove_many(&ids);
        self.after_mutation();
        ids.len()
    }

    /// Whether `clear_all` would return without asking. Only pull stores
    /// trust their snapshot enough to skip an empty clear.
    pub fn clear_all_is_noop(&self) -> bool {
        self.store.delivery() == Delivery::Pull && self.items.is_empty()
    }

    /// Remove everything once `confirm` (given the current count) says yes.
    pub fn clear_all(&mut self, confirm: impl FnOnce(usize) -> bool) -> bool {
        if self.clear_all_is_noop() || !confirm(self.items.len()) {
            return false;
        }
        self.store.remove_all();
        self.after_mutation();
        true
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.rerender();
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}
