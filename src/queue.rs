//! FIFO content queue between producers and the dispatch loop
//!
//! A `VecDeque` behind a tokio mutex, with two `Notify` handles: one woken when
//! content arrives and one when space frees up in a bounded queue.

use crate::types::Content;
use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

/// Async FIFO buffer of content items
///
/// Order is preserved for producer enqueues. Requeued items are appended at the
/// tail at requeue time. No deduplication is performed.
#[derive(Debug)]
pub struct ContentQueue {
    items: Mutex<VecDeque<Content>>,
    capacity: Option<usize>,
    item_ready: Notify,
    space_ready: Notify,
}

impl ContentQueue {
    /// Create a queue; `capacity` bounds producer enqueues (None = unbounded)
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity,
            item_ready: Notify::new(),
            space_ready: Notify::new(),
        }
    }

    /// Append content at the tail
    ///
    /// Blocks while a bounded queue is full.
    pub async fn enqueue(&self, content: Content) {
        loop {
            let space = self.space_ready.notified();
            {
                let mut items = self.items.lock().await;
                if self.capacity.is_none_or(|cap| items.len() < cap) {
                    items.push_back(content);
                    drop(items);
                    self.item_ready.notify_one();
                    return;
                }
            }
            space.await;
        }
    }

    /// Append content at the tail, ignoring the capacity bound
    ///
    /// Used for retries so a requeue never waits behind producers.
    pub async fn requeue(&self, content: Content) {
        self.items.lock().await.push_back(content);
        self.item_ready.notify_one();
    }

    /// Remove the head item, waiting until one is available
    ///
    /// Cancel-safe: dropping the future never loses an item.
    pub async fn dequeue(&self) -> Content {
        loop {
            let ready = self.item_ready.notified();
            if let Some(content) = self.items.lock().await.pop_front() {
                self.space_ready.notify_one();
                return content;
            }
            ready.await;
        }
    }

    /// Remove and return every resident item without waiting for new arrivals
    pub async fn drain(&self) -> Vec<Content> {
        let drained: Vec<Content> = self.items.lock().await.drain(..).collect();
        if !drained.is_empty() {
            self.space_ready.notify_waiters();
        }
        drained
    }

    /// Number of resident items
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Whether the queue is empty
    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}
