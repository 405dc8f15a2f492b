use std::fmt::Debug;

use atelier_engine::{
    db_types::Order,
    events::EventProducers,
    live::ChangeFeed,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    ChatApi,
    MarketError,
    OrderFlowApi,
    RetryPolicy,
    ReviewApi,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketSystem>,
    pub order: Option<Order>,
    pub last_error: Option<MarketError>,
}

pub struct MarketSystem {
    pub db_path: String,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub reviews: ReviewApi<SqliteDatabase>,
    pub chat: ChatApi<SqliteDatabase>,
}

impl Debug for MarketSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MarketSystem({})", self.db_path)
    }
}

impl MarketWorld {
    pub fn system(&self) -> &MarketSystem {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.system().orders.db()
    }

    pub fn order(&self) -> &Order {
        self.order.as_ref().expect("No order has been placed in this scenario")
    }

    /// Keeps the outcome of a step that is allowed to fail, so a later step can inspect it.
    pub fn record<T>(&mut self, result: Result<T, MarketError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🚀️ Step was rejected: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

impl MarketSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let feed = ChangeFeed::default();
        let producers = EventProducers::default();
        let orders = OrderFlowApi::new(db.clone(), producers.clone(), feed.clone());
        let reviews = ReviewApi::new(db.clone(), producers.clone(), feed.clone())
            .with_retry_policy(RetryPolicy::new(20, std::time::Duration::from_millis(5)));
        let chat = ChatApi::new(db, producers, feed);
        Self { db_path: url, orders, reviews, chat }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
