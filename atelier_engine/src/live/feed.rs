use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::*;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::db_types::{ConversationId, Order, OrderId, UserId};

/// A scope that clients can watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Order(OrderId),
    CustomerOrders(UserId),
    MerchantOrders(UserId),
    Conversation(ConversationId),
    /// The conversation list of a user.
    Inbox(UserId),
    MerchantReviews(UserId),
    /// A merchant's public profile, including the rating aggregate.
    MerchantProfile(UserId),
    MerchantTransactions(UserId),
    CustomerTransactions(UserId),
}

impl Topic {
    /// The scopes an order write is visible in.
    pub fn for_order(order: &Order) -> Vec<Topic> {
        vec![
            Topic::Order(order.id.clone()),
            Topic::CustomerOrders(order.customer_id.clone()),
            Topic::MerchantOrders(order.merchant_id.clone()),
        ]
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Order(id) => write!(f, "order {id}"),
            Topic::CustomerOrders(id) => write!(f, "orders of customer {id}"),
            Topic::MerchantOrders(id) => write!(f, "orders of merchant {id}"),
            Topic::Conversation(id) => write!(f, "conversation {id}"),
            Topic::Inbox(id) => write!(f, "inbox of {id}"),
            Topic::MerchantReviews(id) => write!(f, "reviews of {id}"),
            Topic::MerchantProfile(id) => write!(f, "profile of {id}"),
            Topic::MerchantTransactions(id) => write!(f, "transactions of merchant {id}"),
            Topic::CustomerTransactions(id) => write!(f, "transactions of customer {id}"),
        }
    }
}

/// One committed write. `revision` increases with every write, across all topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    pub revision: u64,
    pub topics: Vec<Topic>,
}

impl ChangeNotice {
    pub fn concerns(&self, topic: &Topic) -> bool {
        self.topics.contains(topic)
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeNotice>,
    revision: Arc<AtomicU64>,
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChangeFeed(revision {}, {} receivers)", self.current_revision(), self.sender.receiver_count())
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, revision: Arc::new(AtomicU64::new(0)) }
    }

    /// Announces a committed write. Call only after the write is durable.
    pub fn publish(&self, topics: Vec<Topic>) -> u64 {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("📡️ Revision {revision} touches {} topics", topics.len());
        let notice = ChangeNotice { revision, topics };
        if self.sender.send(notice).is_err() {
            trace!("📡️ Nobody is watching revision {revision}");
        }
        revision
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.sender.subscribe()
    }

    pub fn current_revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub(crate) fn revision_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.revision)
    }

    pub fn watcher_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
