//! `SqliteDatabase` is a concrete implementation of an Atelier marketplace backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{conversations, db_url, new_pool, orders, reviews, transactions, users};
use crate::{
    db_types::{
        store_timestamp,
        CatalogItem,
        ChatMessage,
        Conversation,
        ConversationId,
        MerchantListing,
        NewCatalogItem,
        NewMessage,
        NewOrder,
        NewReview,
        Order,
        OrderId,
        ProfileUpdate,
        Review,
        Transaction,
        UserId,
        UserProfile,
    },
    traits::{
        ConversationManagement,
        MarketplaceDatabase,
        OrderManagement,
        OrderQueryFilter,
        ProfileManagement,
        ReviewManagement,
        ReviewReceipt,
        StatusUpdate,
        StoreError,
        TransactionQueryFilter,
        TransitionOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `ATELIER_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/db/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &OrderId::random(), store_timestamp(), &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    /// In a single atomic transaction:
    /// * moves the order from `update.from` to `update.to`, together with the side fields of the edge,
    /// * appends the settlement to the ledger, if there is one.
    async fn apply_status_update(&self, update: StatusUpdate) -> Result<TransitionOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::apply_status_update(&update, store_timestamp(), &mut tx).await? {
            Some(order) => order,
            None => {
                let current = orders::fetch_order(&update.order_id, &mut tx).await?;
                return Err(match current {
                    Some(order) => {
                        debug!(
                            "🗃️ Order {} moved to {} before {} -> {} could be written",
                            order.id, order.status, update.from, update.to
                        );
                        StoreError::Conflict(format!("Order {} is no longer {}", order.id, update.from))
                    },
                    None => StoreError::NotFound(format!("Order {}", update.order_id)),
                });
            },
        };
        let transaction = match update.settlement {
            Some(settlement) => Some(transactions::insert_transaction(settlement, &mut tx).await?),
            None => None,
        };
        tx.commit().await?;
        debug!("🗃️ Order {} is now {}", order.id, order.status);
        Ok(TransitionOutcome { order, transaction })
    }

    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = transactions::search_transactions(query, &mut conn).await?;
        Ok(result)
    }
}

impl ReviewManagement for SqliteDatabase {
    async fn record_review(&self, review: NewReview) -> Result<ReviewReceipt, StoreError> {
        let now = store_timestamp();
        let mut tx = self.pool.begin().await?;
        // The first statement is a write, so the merchant aggregate read below is never a stale snapshot
        let order = orders::mark_reviewed(&review.order_id, &review.merchant_id, now, &mut tx)
            .await?
            .ok_or_else(|| StoreError::NotReviewable(review.order_id.to_string()))?;
        let merchant_id = review.merchant_id.clone();
        let previous = users::fetch_rating_aggregate(&merchant_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Merchant data for {merchant_id}")))?;
        let next = previous.fold(review.rating);
        let review = reviews::insert_review(review, now, &mut tx).await?;
        if !users::update_rating_aggregate(&merchant_id, previous, next, now, &mut tx).await? {
            return Err(StoreError::Conflict(format!("Rating aggregate for {merchant_id} changed mid-transaction")));
        }
        tx.commit().await?;
        debug!(
            "🗃️ Merchant {merchant_id} rating {:.3} ({} reviews) -> {:.3} ({} reviews)",
            previous.rating, previous.review_count, next.rating, next.review_count
        );
        Ok(ReviewReceipt { review, order, merchant_aggregate: next })
    }

    async fn fetch_reviews_for_merchant(&self, merchant_id: &UserId) -> Result<Vec<Review>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = reviews::fetch_reviews_for_merchant(merchant_id, &mut conn).await?;
        Ok(result)
    }
}

impl ConversationManagement for SqliteDatabase {
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        participants: [(UserId, String); 2],
        message: NewMessage,
    ) -> Result<(Conversation, ChatMessage), StoreError> {
        let now = store_timestamp();
        let mut tx = self.pool.begin().await?;
        let (before, seq) = conversations::reserve_message_slot(conversation_id, participants, now, &mut tx).await?;
        let timestamp = conversations::next_message_timestamp(before.last_message_at, now);
        let summary = message.summary_text();
        let message = conversations::insert_message(conversation_id, seq, message, timestamp, &mut tx).await?;
        let conversation = conversations::update_summary(conversation_id, &message, summary, &mut tx).await?;
        tx.commit().await?;
        Ok((conversation, message))
    }

    async fn fetch_conversation(&self, conversation_id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = conversations::fetch_conversation(conversation_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_conversations_for(&self, user: &UserId) -> Result<Vec<Conversation>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = conversations::fetch_conversations_for(user, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_messages(&self, conversation_id: &ConversationId) -> Result<Vec<ChatMessage>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = conversations::fetch_messages(conversation_id, &mut conn).await?;
        Ok(result)
    }
}

impl ProfileManagement for SqliteDatabase {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = users::fetch_profile(user_id, &mut conn).await?;
        Ok(result)
    }

    async fn upsert_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = users::upsert_profile(user_id, update, store_timestamp(), &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_merchants(&self) -> Result<Vec<MerchantListing>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let merchants = users::fetch_merchants(&mut conn).await?;
        let mut result = Vec::with_capacity(merchants.len());
        for profile in merchants {
            let catalog = users::fetch_catalog(&profile.id, &mut conn).await?;
            result.push(MerchantListing { profile, catalog });
        }
        Ok(result)
    }

    async fn fetch_catalog(&self, merchant_id: &UserId) -> Result<Vec<CatalogItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = users::fetch_catalog(merchant_id, &mut conn).await?;
        Ok(result)
    }

    async fn replace_catalog(
        &self,
        merchant_id: &UserId,
        items: Vec<NewCatalogItem>,
    ) -> Result<Vec<CatalogItem>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = users::replace_catalog(merchant_id, items, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}
