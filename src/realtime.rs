//! Realtime change feed and locally-mirrored lists.
//!
//! Writers publish row-level [`ChangeEvent`]s to a [`ChangeFeed`]. Readers
//! keep a [`LiveList`] that applies pushed events and manual refreshes. Both
//! paths key on the row id, so a record that arrives by push and by refresh
//! is stored once.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::Hospital;

/// Buffered events per subscriber before it lags.
pub const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "record", rename_all = "snake_case")]
pub enum ChangeEvent<T> {
    Insert(T),
    Update(T),
    Delete(Uuid),
}

/// A row with a primary key.
pub trait Keyed {
    fn key(&self) -> Uuid;

    /// Rows that should drop out of live lists (soft-deleted, archived).
    fn is_retired(&self) -> bool {
        false
    }
}

impl Keyed for Hospital {
    fn key(&self) -> Uuid {
        self.id
    }

    fn is_retired(&self) -> bool {
        !self.is_active
    }
}

/// Broadcast fan-out of change events. Publishing never blocks; slow
/// subscribers observe `RecvError::Lagged` and must refresh.
#[derive(Debug, Clone)]
pub struct ChangeFeed<T: Clone> {
    sender: broadcast::Sender<ChangeEvent<T>>,
}

impl<T: Clone> ChangeFeed<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: ChangeEvent<T>) -> usize {
        // No subscribers is not an error for the writer.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent<T>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Default for ChangeFeed<T> {
    fn default() -> Self {
        Self::new(FEED_CAPACITY)
    }
}

pub type HospitalFeed = ChangeFeed<Hospital>;

/// Local mirror of a remote list, unique by key, in arrival order.
#[derive(Debug, Clone)]
pub struct LiveList<T> {
    items: Vec<T>,
}

pub type HospitalList = LiveList<Hospital>;

impl<T> Default for LiveList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed + Clone> LiveList<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, key: Uuid) -> Option<usize> {
        self.items.iter().position(|i| i.key() == key)
    }

    fn upsert(&mut self, record: T) {
        if record.is_retired() {
            self.remove(record.key());
            return;
        }
        match self.position(record.key()) {
            Some(idx) => self.items[idx] = record,
            None => self.items.push(record),
        }
    }

    fn remove(&mut self, key: Uuid) {
        self.items.retain(|i| i.key() != key);
    }

    /// Insert and update both upsert, so an insert replayed after a refresh
    /// that already returned the row does not duplicate it.
    pub fn apply(&mut self, event: ChangeEvent<T>) {
        match event {
            ChangeEvent::Insert(record) | ChangeEvent::Update(record) => self.upsert(record),
            ChangeEvent::Delete(key) => self.remove(key),
        }
    }

    /// Replace contents with a fresh fetch. Duplicate keys in the fetch keep
    /// the last occurrence at the first occurrence's position.
    pub fn refresh(&mut self, fetched: Vec<T>) {
        self.items.clear();
        for record in fetched {
            self.upsert(record);
        }
    }
}
