use crate::{
    db_types::{NewOrder, Order, OrderId, Transaction},
    traits::{OrderQueryFilter, StatusUpdate, StoreError, TransactionQueryFilter, TransitionOutcome},
};

/// Storage of orders and of the ledger entries they produce.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order in `Consultation`.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Orders matching the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError>;

    /// Applies an already-validated status change in a single atomic write.
    ///
    /// The write only succeeds if the order is still in `update.from`. If another writer moved the order in the
    /// meantime, nothing is written and [`StoreError::Conflict`] is returned. When `update.settlement` is present the
    /// ledger entry is inserted in the same transaction, so a payment can never exist without its status change.
    async fn apply_status_update(&self, update: StatusUpdate) -> Result<TransitionOutcome, StoreError>;

    /// Ledger entries matching the filter, newest first.
    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, StoreError>;
}
