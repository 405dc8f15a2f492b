use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use atelier_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    live::ChangeFeed,
    traits::collaborators::{FlatRateQuoter, OfflineStylist},
    ChatApi,
    CheckoutApi,
    LiveApi,
    OrderFlowApi,
    ProfileApi,
    RetryPolicy,
    ReviewApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::IdentityMiddlewareFactory,
    routes::{
        health,
        AdvanceOrderRoute,
        ConversationMessagesRoute,
        LiveConversationRoute,
        LiveInboxRoute,
        LiveMerchantRoute,
        LiveOrderRoute,
        LiveOrdersRoute,
        LiveReviewsRoute,
        LiveTransactionsRoute,
        MerchantCatalogRoute,
        MerchantReviewsRoute,
        MerchantsRoute,
        MyConversationsRoute,
        MyOrdersRoute,
        MyProfileRoute,
        MyStatsRoute,
        MyTransactionsRoute,
        OrderByIdRoute,
        PlaceOrderRoute,
        ReplaceCatalogRoute,
        ReviewOrderRoute,
        SaveMyProfileRoute,
        SendMessageRoute,
        StyleAdviceRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 50;
const REVIEW_BACKOFF: Duration = Duration::from_millis(25);

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let feed = ChangeFeed::new(config.live_buffer);
    let srv = create_server_instance(config, db, producers, feed)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that record every marketplace event in the log. Notification side effects (email, push) plug in here.
fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_created(|ev| {
            info!("📬️ New order {} from {} for {}", ev.order.id, ev.order.customer_id, ev.order.merchant_id);
            Box::pin(async {})
        })
        .on_order_status_changed(|ev| {
            info!("📬️ Order {} moved from {} to {}", ev.order.id, ev.old_status, ev.order.status);
            Box::pin(async {})
        })
        .on_order_completed(|ev| {
            match &ev.transaction {
                Some(tx) => info!("📬️ Order {} completed. {} paid to {}", ev.order.id, tx.amount, tx.merchant_id),
                None => info!("📬️ Order {} completed", ev.order.id),
            }
            Box::pin(async {})
        })
        .on_review_submitted(|ev| {
            info!(
                "📬️ {} now rated {:.2} from {} reviews",
                ev.review.merchant_id, ev.merchant_aggregate.rating, ev.merchant_aggregate.review_count
            );
            Box::pin(async {})
        })
        .on_message_sent(|ev| {
            debug!("📬️ Message {} in {}", ev.message.id, ev.conversation.id);
            Box::pin(async {})
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    feed: ChangeFeed,
) -> Result<Server, ServerError> {
    let retry = RetryPolicy::new(config.review_max_attempts, REVIEW_BACKOFF);
    let options = ServerOptions::from_config(&config);
    let identity = config.identity.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone(), feed.clone());
        let reviews_api = ReviewApi::new(db.clone(), producers.clone(), feed.clone()).with_retry_policy(retry);
        let chat_api = ChatApi::new(db.clone(), producers.clone(), feed.clone());
        let profile_api = ProfileApi::new(db.clone(), feed.clone());
        let checkout_api = CheckoutApi::new(db.clone(), FlatRateQuoter);
        let live_api = LiveApi::new(db.clone(), feed.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("atelier::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(reviews_api))
            .app_data(web::Data::new(chat_api))
            .app_data(web::Data::new(profile_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(live_api))
            .app_data(web::Data::new(OfflineStylist));
        // Every /api route requires a verified identity
        let api_scope = web::scope("/api")
            .wrap(IdentityMiddlewareFactory::new(identity.clone(), options))
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(SaveMyProfileRoute::<SqliteDatabase>::new())
            .service(MerchantsRoute::<SqliteDatabase>::new())
            .service(MerchantCatalogRoute::<SqliteDatabase>::new())
            .service(ReplaceCatalogRoute::<SqliteDatabase>::new())
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(AdvanceOrderRoute::<SqliteDatabase>::new())
            .service(ReviewOrderRoute::<SqliteDatabase>::new())
            .service(MerchantReviewsRoute::<SqliteDatabase>::new())
            .service(MyTransactionsRoute::<SqliteDatabase>::new())
            .service(MyStatsRoute::<SqliteDatabase>::new())
            .service(MyConversationsRoute::<SqliteDatabase>::new())
            .service(ConversationMessagesRoute::<SqliteDatabase>::new())
            .service(SendMessageRoute::<SqliteDatabase>::new())
            .service(LiveOrdersRoute::<SqliteDatabase>::new())
            .service(LiveOrderRoute::<SqliteDatabase>::new())
            .service(LiveInboxRoute::<SqliteDatabase>::new())
            .service(LiveConversationRoute::<SqliteDatabase>::new())
            .service(LiveReviewsRoute::<SqliteDatabase>::new())
            .service(LiveMerchantRoute::<SqliteDatabase>::new())
            .service(LiveTransactionsRoute::<SqliteDatabase>::new())
            .service(StyleAdviceRoute::<OfflineStylist>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
