use std::fmt::Debug;

use futures_util::FutureExt;
use log::*;

use crate::{
    db_types::{ChatMessage, ConversationId, Order, OrderId, Review, Transaction, UserId, UserProfile},
    live::{ChangeFeed, LiveSubscription, SnapshotLoader, Topic},
    market_api::{chat_api::ConversationSummary, errors::MarketError, order_objects::OrderScope},
    traits::MarketplaceDatabase,
};

/// Opens live subscriptions on behalf of a viewer.
///
/// Every `watch_*` method checks that the viewer may see the scope before it subscribes, so a subscription never
/// yields data its holder could not have fetched directly.
pub struct LiveApi<B> {
    db: B,
    feed: ChangeFeed,
}

impl<B> Debug for LiveApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LiveApi ({:?})", self.feed)
    }
}

impl<B> LiveApi<B>
where B: MarketplaceDatabase + 'static
{
    pub fn new(db: B, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub async fn watch_order(
        &self,
        viewer: &UserId,
        order_id: &OrderId,
    ) -> Result<LiveSubscription<Order>, MarketError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| MarketError::NotFound(format!("Order {order_id}")))?;
        if !order.involves(viewer) {
            return Err(MarketError::PermissionDenied(format!("{viewer} may not watch order {order_id}")));
        }
        let db = self.db.clone();
        let id = order_id.clone();
        let loader: SnapshotLoader<Order> = Box::new(move || {
            let db = db.clone();
            let id = id.clone();
            async move { db.fetch_order(&id).await?.ok_or_else(|| MarketError::NotFound(format!("Order {id}"))) }
                .boxed_local()
        });
        Ok(self.open(Topic::Order(order_id.clone()), loader))
    }

    pub fn watch_orders(
        &self,
        viewer: &UserId,
        scope: OrderScope,
    ) -> Result<LiveSubscription<Vec<Order>>, MarketError> {
        check_own_scope(viewer, &scope)?;
        let db = self.db.clone();
        let topic = scope.orders_topic();
        let loader: SnapshotLoader<Vec<Order>> = Box::new(move || {
            let db = db.clone();
            let filter = scope.order_filter();
            async move { Ok::<_, MarketError>(db.search_orders(filter).await?) }.boxed_local()
        });
        Ok(self.open(topic, loader))
    }

    pub fn watch_transactions(
        &self,
        viewer: &UserId,
        scope: OrderScope,
    ) -> Result<LiveSubscription<Vec<Transaction>>, MarketError> {
        check_own_scope(viewer, &scope)?;
        let db = self.db.clone();
        let topic = scope.transactions_topic();
        let loader: SnapshotLoader<Vec<Transaction>> = Box::new(move || {
            let db = db.clone();
            let filter = scope.transaction_filter();
            async move { Ok::<_, MarketError>(db.search_transactions(filter).await?) }.boxed_local()
        });
        Ok(self.open(topic, loader))
    }

    /// The messages of a conversation, oldest first.
    pub async fn watch_conversation(
        &self,
        viewer: &UserId,
        conversation_id: &ConversationId,
    ) -> Result<LiveSubscription<Vec<ChatMessage>>, MarketError> {
        let allowed = match self.db.fetch_conversation(conversation_id).await? {
            Some(c) => c.has_participant(viewer),
            None => conversation_id.involves(viewer),
        };
        if !allowed {
            return Err(MarketError::PermissionDenied(format!(
                "{viewer} is not a participant of conversation {conversation_id}"
            )));
        }
        let db = self.db.clone();
        let id = conversation_id.clone();
        let loader: SnapshotLoader<Vec<ChatMessage>> = Box::new(move || {
            let db = db.clone();
            let id = id.clone();
            async move { Ok::<_, MarketError>(db.fetch_messages(&id).await?) }.boxed_local()
        });
        Ok(self.open(Topic::Conversation(conversation_id.clone()), loader))
    }

    /// The conversation list of `viewer`. Nobody can watch another user's inbox, so no check is needed.
    pub fn watch_inbox(&self, viewer: &UserId) -> LiveSubscription<Vec<ConversationSummary>> {
        let db = self.db.clone();
        let me = viewer.clone();
        let loader: SnapshotLoader<Vec<ConversationSummary>> = Box::new(move || {
            let db = db.clone();
            let me = me.clone();
            async move {
                let conversations = db.fetch_conversations_for(&me).await?;
                Ok::<_, MarketError>(conversations.iter().map(|c| ConversationSummary::for_viewer(c, &me)).collect())
            }
            .boxed_local()
        });
        self.open(Topic::Inbox(viewer.clone()), loader)
    }

    /// Reviews are public.
    pub fn watch_reviews(&self, merchant_id: &UserId) -> LiveSubscription<Vec<Review>> {
        let db = self.db.clone();
        let id = merchant_id.clone();
        let loader: SnapshotLoader<Vec<Review>> = Box::new(move || {
            let db = db.clone();
            let id = id.clone();
            async move { Ok::<_, MarketError>(db.fetch_reviews_for_merchant(&id).await?) }.boxed_local()
        });
        self.open(Topic::MerchantReviews(merchant_id.clone()), loader)
    }

    /// A merchant's public profile, rating aggregate included.
    pub fn watch_merchant(&self, merchant_id: &UserId) -> LiveSubscription<UserProfile> {
        let db = self.db.clone();
        let id = merchant_id.clone();
        let loader: SnapshotLoader<UserProfile> = Box::new(move || {
            let db = db.clone();
            let id = id.clone();
            async move {
                let profile = db.fetch_profile(&id).await?;
                profile.ok_or_else(|| MarketError::NotFound(format!("Merchant {id}")))
            }
            .boxed_local()
        });
        self.open(Topic::MerchantProfile(merchant_id.clone()), loader)
    }

    fn open<T>(&self, topic: Topic, loader: SnapshotLoader<T>) -> LiveSubscription<T> {
        debug!("📡️ Opening subscription to {topic}. {} watchers already", self.feed.watcher_count());
        LiveSubscription::new(topic, &self.feed, loader)
    }
}

fn check_own_scope(viewer: &UserId, scope: &OrderScope) -> Result<(), MarketError> {
    if scope.user() == viewer {
        Ok(())
    } else {
        Err(MarketError::PermissionDenied(format!("{viewer} may not watch {}", scope.orders_topic())))
    }
}
