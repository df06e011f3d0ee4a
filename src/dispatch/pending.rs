//! Pending work list with its dedup index

use std::collections::{HashMap, VecDeque};
use tracing::debug;

use super::work_item::{Operation, Waiter, WorkItem};

/// Ordered work awaiting dispatch, at most one item per key.
///
/// `order` holds the dispatch order, `items` maps each key to its record.
/// Both always contain the same set of keys.
pub struct PendingWork<T> {
    order: VecDeque<String>,
    items: HashMap<String, WorkItem<T>>,
}

/// What `PendingWork::submit` did with a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// A new work item was appended to the tail
    New,
    /// The caller joined an item already pending or retrying for the key
    Coalesced,
}

impl<T: Clone> PendingWork<T> {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
            items: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Attaches `waiter` to the pending item for `key`, or appends a new item.
    /// When coalescing, `operation` is dropped without ever being invoked.
    pub fn submit(&mut self, key: String, operation: Operation<T>, waiter: Waiter<T>) -> Enqueued {
        if let Some(existing) = self.items.get_mut(&key) {
            existing.attach(waiter);
            debug!(
                "Coalesced submission into pending item: key={}, waiters={}",
                key,
                existing.waiters.len()
            );
            return Enqueued::Coalesced;
        }

        self.order.push_back(key.clone());
        self.items
            .insert(key.clone(), WorkItem::new(key, operation, waiter));
        Enqueued::New
    }

    /// Item at the head of the list
    pub fn head_mut(&mut self) -> Option<&mut WorkItem<T>> {
        let key = self.order.front()?;
        self.items.get_mut(key)
    }

    /// Removes the item for `key`, wherever it sits in the list.
    pub fn remove(&mut self, key: &str) -> Option<WorkItem<T>> {
        let item = self.items.remove(key)?;
        self.order.retain(|k| k != key);
        Some(item)
    }

    /// Moves the item for `key` to the tail, behind everything queued now.
    /// Returns false when the key is not pending.
    pub fn requeue(&mut self, key: &str) -> bool {
        if !self.items.contains_key(key) {
            return false;
        }
        self.order.retain(|k| k != key);
        self.order.push_back(key.to_string());
        true
    }

    #[cfg(test)]
    pub fn keys(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }
}

impl<T: Clone> Default for PendingWork<T> {
    fn default() -> Self {
        Self::new()
    }
}
