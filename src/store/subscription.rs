// Live change feed
//
// Stores publish one `ChangeEvent` per written document after a batch
// commits. A `Subscription` only sees its own collection and stops receiving
// as soon as it is dropped or unsubscribed.

use super::Collection;
use crate::logger::{self, LogTag};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

const FEED_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub id: String,
    pub kind: ChangeKind,
}

pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No receivers is not an error
            let _ = self.sender.send(event);
        }
    }

    pub fn subscribe(&self, collection: Collection) -> Subscription {
        Subscription {
            collection,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Cancellation handle for a live feed; dropping it unsubscribes
pub struct Subscription {
    collection: Collection,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Next change in this collection; `None` once the store is gone
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.collection == self.collection => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    logger::warning(
                        LogTag::Store,
                        &format!("{} subscriber lagged, {} changes dropped", self.collection, missed),
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Already-delivered change, without waiting
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.collection == self.collection => return Some(event),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
