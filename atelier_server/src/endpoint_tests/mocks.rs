use atelier_engine::{
    db_types::{NewOrder, NewReview, Order, OrderId, Review, Transaction, UserId},
    traits::{
        OrderManagement,
        OrderQueryFilter,
        ReviewManagement,
        ReviewReceipt,
        StatusUpdate,
        StoreError,
        TransactionQueryFilter,
        TransitionOutcome,
    },
};
use mockall::mock;

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError>;
        async fn apply_status_update(&self, update: StatusUpdate) -> Result<TransitionOutcome, StoreError>;
        async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, StoreError>;
    }
}

mock! {
    pub ReviewStore {}
    impl OrderManagement for ReviewStore {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError>;
        async fn apply_status_update(&self, update: StatusUpdate) -> Result<TransitionOutcome, StoreError>;
        async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, StoreError>;
    }
    impl ReviewManagement for ReviewStore {
        async fn record_review(&self, review: NewReview) -> Result<ReviewReceipt, StoreError>;
        async fn fetch_reviews_for_merchant(&self, merchant_id: &UserId) -> Result<Vec<Review>, StoreError>;
    }
}
