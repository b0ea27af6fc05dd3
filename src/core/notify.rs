//! Subscription hub delivering full-collection replace events.
//!
//! Views register a callback per collection; after every committed change
//! the callback receives the full current workspace and replaces its local
//! snapshot wholesale. No diffing, no client-side merging: last write
//! observed wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::Workspace;

/// The named collections a view can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Expenses,
    Accounts,
    Debts,
    Categories,
    Transfers,
    BudgetAllocations,
    Reports,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Expenses,
        Collection::Accounts,
        Collection::Debts,
        Collection::Categories,
        Collection::Transfers,
        Collection::BudgetAllocations,
        Collection::Reports,
    ];
}

pub type SubscriptionId = u64;

type Callback = Box<dyn Fn(&Workspace) + Send + Sync>;

/// Registry of collection observers.
#[derive(Default)]
pub struct ChangeHub {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

struct Subscriber {
    id: SubscriptionId,
    collection: Collection,
    callback: Callback,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked with the full workspace whenever the
    /// given collection changes.
    pub fn subscribe<F>(&self, collection: Collection, callback: F) -> SubscriptionId
    where
        F: Fn(&Workspace) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(Subscriber {
                id,
                collection,
                callback: Box::new(callback),
            });
        }
        id
    }

    /// Removes a subscription; unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|subscriber| subscriber.id != id);
        }
    }

    /// Pushes the current workspace to every observer of `collection`.
    pub fn notify(&self, collection: Collection, workspace: &Workspace) {
        if let Ok(subscribers) = self.subscribers.lock() {
            for subscriber in subscribers.iter() {
                if subscriber.collection == collection {
                    (subscriber.callback)(workspace);
                }
            }
        }
    }

    /// Pushes the current workspace to every observer of every collection.
    pub fn notify_all(&self, workspace: &Workspace) {
        for collection in Collection::ALL {
            self.notify(collection, workspace);
        }
    }
}
