use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{store_timestamp, NewOrder, Order, OrderId, OrderStatusType, Transaction, UserId},
    events::{EventProducers, OrderCompletedEvent, OrderCreatedEvent, OrderStatusChangedEvent},
    live::{ChangeFeed, Topic},
    market_api::{
        errors::MarketError,
        order_objects::{MerchantStats, OrderScope},
        retry::RetryPolicy,
        transitions::{plan_transition, TransitionRequest},
    },
    traits::{OrderManagement, StoreError, TransitionOutcome},
};

/// `OrderFlowApi` is the single entry point for creating orders and moving them through their lifecycle.
///
/// Every status change goes through [`OrderFlowApi::advance`], which validates the request against the lifecycle
/// graph before anything is written, and then writes the change (and its ledger entry, if any) atomically.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    feed: ChangeFeed,
    retry: RetryPolicy,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers, feed: ChangeFeed) -> Self {
        Self { db, producers, feed, retry: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Places a new order on behalf of `actor`, who must be the order's customer.
    pub async fn create_order(&self, actor: &UserId, order: NewOrder) -> Result<Order, MarketError> {
        if &order.customer_id != actor {
            return Err(MarketError::Forbidden(format!("{actor} cannot place an order for {}", order.customer_id)));
        }
        if order.customer_id == order.merchant_id {
            return Err(MarketError::InvalidInput("A merchant cannot order from themselves".into()));
        }
        if order.merchant_id.as_str().trim().is_empty() {
            return Err(MarketError::MissingField("merchant_id"));
        }
        if order.price.is_negative() {
            return Err(MarketError::InvalidInput(format!("Price cannot be negative: {}", order.price)));
        }
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order {} placed by {} with {} for {}", order.id, order.customer_id, order.merchant_id, order.price);
        self.feed.publish(Topic::for_order(&order));
        for emitter in &self.producers.order_created_producer {
            emitter.publish_event(OrderCreatedEvent { order: order.clone() }).await;
        }
        Ok(order)
    }

    /// Fetches an order that `viewer` takes part in.
    pub async fn fetch_order(&self, viewer: &UserId, order_id: &OrderId) -> Result<Order, MarketError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| MarketError::NotFound(format!("Order {order_id}")))?;
        if !order.involves(viewer) {
            return Err(MarketError::PermissionDenied(format!("{viewer} may not read order {order_id}")));
        }
        Ok(order)
    }

    /// The orders in `scope`, newest first.
    pub async fn orders(&self, scope: &OrderScope) -> Result<Vec<Order>, MarketError> {
        let orders = self.db.search_orders(scope.order_filter()).await?;
        trace!("🔄️📦️ {} orders for {scope:?}", orders.len());
        Ok(orders)
    }

    /// The ledger entries in `scope`, newest first.
    pub async fn transactions(&self, scope: &OrderScope) -> Result<Vec<Transaction>, MarketError> {
        let transactions = self.db.search_transactions(scope.transaction_filter()).await?;
        Ok(transactions)
    }

    pub async fn merchant_stats(&self, merchant_id: &UserId) -> Result<MerchantStats, MarketError> {
        let scope = OrderScope::Merchant(merchant_id.clone());
        let orders = self.db.search_orders(scope.order_filter()).await?;
        let transactions = self.db.search_transactions(scope.transaction_filter()).await?;
        Ok(MerchantStats {
            active_orders: orders.iter().filter(|o| o.status != OrderStatusType::Cancelled).count(),
            completed_orders: orders.iter().filter(|o| o.status == OrderStatusType::Completed).count(),
            total_revenue: transactions.iter().map(|t| t.amount).sum(),
        })
    }

    /// Moves the order to `request.status` on behalf of `actor`.
    ///
    /// Fails with `InvalidTransition`, `Forbidden` or `MissingField` before writing anything if the request is not
    /// legal for the order's current status. If the order changes between validation and the write, the change is
    /// re-validated against the new status and retried, so a request that has become illegal fails with the
    /// corresponding validation error. `Conflict` is only returned once the retry budget is spent.
    pub async fn advance(
        &self,
        order_id: &OrderId,
        actor: &UserId,
        request: TransitionRequest,
    ) -> Result<Order, MarketError> {
        let mut attempt = 0;
        let (old_status, outcome) = loop {
            attempt += 1;
            let order =
                self.db.fetch_order(order_id).await?.ok_or_else(|| MarketError::NotFound(format!("Order {order_id}")))?;
            let update = plan_transition(&order, actor, &request, store_timestamp())?;
            trace!("🔄️📦️ Attempt {attempt}: {order_id} {} -> {}", update.from, update.to);
            match self.db.apply_status_update(update).await {
                Ok(outcome) => break (order.status, outcome),
                Err(StoreError::Conflict(reason)) if attempt < self.retry.max_attempts => {
                    debug!("🔄️📦️ Order {order_id} changed underneath us ({reason}). Re-validating.");
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                },
                Err(e) => return Err(e.into()),
            }
        };
        let TransitionOutcome { order, transaction } = outcome;
        info!("🔄️📦️ Order {} moved from {old_status} to {} by {actor}", order.id, order.status);
        self.notify(old_status, &order, transaction).await;
        Ok(order)
    }

    async fn notify(&self, old_status: OrderStatusType, order: &Order, transaction: Option<Transaction>) {
        let mut topics = Topic::for_order(order);
        if transaction.is_some() {
            topics.push(Topic::MerchantTransactions(order.merchant_id.clone()));
            topics.push(Topic::CustomerTransactions(order.customer_id.clone()));
        }
        self.feed.publish(topics);
        for emitter in &self.producers.order_status_changed_producer {
            emitter.publish_event(OrderStatusChangedEvent::new(old_status, order.clone())).await;
        }
        if order.status == OrderStatusType::Completed {
            for emitter in &self.producers.order_completed_producer {
                debug!("🔄️📦️ Notifying order completed hook subscribers");
                let event = OrderCompletedEvent { order: order.clone(), transaction: transaction.clone() };
                emitter.publish_event(event).await;
            }
        }
    }
}
