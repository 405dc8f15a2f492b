use atelier_engine::{
    db_types::{ConversationId, NewMessage, NewReview, OrderStatusType, Role, UserId},
    events::EventProducers,
    live::{ChangeFeed, LiveView},
    order_objects::OrderScope,
    test_utils::{
        prepare_env::fresh_database,
        seed::{advance_to, place_order, seed_profile},
    },
    transitions::TransitionRequest,
    ChatApi,
    LiveApi,
    MarketError,
    OrderFlowApi,
    ReviewApi,
    SqliteDatabase,
};

struct Market {
    orders: OrderFlowApi<SqliteDatabase>,
    reviews: ReviewApi<SqliteDatabase>,
    chat: ChatApi<SqliteDatabase>,
    live: LiveApi<SqliteDatabase>,
}

async fn setup() -> Market {
    let db = fresh_database().await;
    seed_profile(&db, "sari", "Sari", Role::Customer).await;
    seed_profile(&db, "rina", "Rina", Role::Merchant).await;
    let feed = ChangeFeed::new(64);
    let producers = EventProducers::default();
    Market {
        orders: OrderFlowApi::new(db.clone(), producers.clone(), feed.clone()),
        reviews: ReviewApi::new(db.clone(), producers.clone(), feed.clone()),
        chat: ChatApi::new(db.clone(), producers, feed.clone()),
        live: LiveApi::new(db, feed),
    }
}

fn sari() -> UserId {
    UserId::from("sari")
}

fn rina() -> UserId {
    UserId::from("rina")
}

#[tokio::test]
async fn order_watchers_get_a_full_snapshot_after_each_write() {
    let market = setup().await;
    let order = place_order(&market.orders, "sari", "rina", 400_000).await;
    let mut customer = market.live.watch_order(&sari(), &order.id).await.unwrap();
    let mut merchant_list = market.live.watch_orders(&rina(), OrderScope::Merchant(rina())).unwrap();

    let initial = customer.next().await.unwrap().unwrap();
    assert_eq!(initial.data.status, OrderStatusType::Consultation);
    let list = merchant_list.next().await.unwrap().unwrap();
    assert_eq!(list.data.len(), 1);

    market.orders.advance(&order.id, &rina(), TransitionRequest::to(OrderStatusType::Design)).await.unwrap();
    let pushed = customer.next().await.unwrap().unwrap();
    assert_eq!(pushed.data.status, OrderStatusType::Design);
    assert!(pushed.revision > initial.revision);
    let list = merchant_list.next().await.unwrap().unwrap();
    assert_eq!(list.data[0].status, OrderStatusType::Design);
}

#[tokio::test]
async fn optimistic_overlay_is_replaced_by_the_canonical_snapshot() {
    let market = setup().await;
    let order = place_order(&market.orders, "sari", "rina", 400_000).await;
    let order = advance_to(&market.orders, &order, OrderStatusType::Shipped).await;
    let mut sub = market.live.watch_order(&sari(), &order.id).await.unwrap();
    let mut view = LiveView::new();
    view.reconcile(sub.next().await.unwrap().unwrap());

    // The customer taps "order received" and the UI shows it straight away...
    let mut optimistic = order.clone();
    optimistic.status = OrderStatusType::Completed;
    view.set_pending(optimistic);
    assert_eq!(view.current().unwrap().status, OrderStatusType::Completed);
    assert_eq!(view.canonical().unwrap().status, OrderStatusType::Shipped);

    // ...but a complaint lands first, and the receipt is rejected
    market.orders.advance(&order.id, &sari(), TransitionRequest::complain("Salah ukuran", None)).await.unwrap();
    let err = market
        .orders
        .advance(&order.id, &sari(), TransitionRequest::to(OrderStatusType::Completed))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Forbidden(_)), "{err:?}");
    view.fail_pending();
    assert!(view.reconcile(sub.next().await.unwrap().unwrap()));
    assert!(!view.is_pending());
    assert_eq!(view.current().unwrap().status, OrderStatusType::Complaint);
}

#[tokio::test]
async fn conversation_and_inbox_watchers() {
    let market = setup().await;
    let id = ConversationId::for_pair(&sari(), &rina());
    let mallory = UserId::from("mallory");
    let err = market.live.watch_conversation(&mallory, &id).await.unwrap_err();
    assert!(matches!(err, MarketError::PermissionDenied(_)), "{err:?}");

    let mut thread = market.live.watch_conversation(&rina(), &id).await.unwrap();
    let mut inbox = market.live.watch_inbox(&rina());
    assert!(thread.next().await.unwrap().unwrap().data.is_empty());
    assert!(inbox.next().await.unwrap().unwrap().data.is_empty());

    market.chat.send_message(&sari(), &rina(), NewMessage::text("sari", "", "Halo")).await.unwrap();
    market.chat.send_message(&sari(), &rina(), NewMessage::text("sari", "", "Masih buka?")).await.unwrap();
    let messages = thread.next().await.unwrap().unwrap().data;
    assert!(!messages.is_empty());
    let summaries = inbox.next().await.unwrap().unwrap().data;
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].unread);
}

#[tokio::test]
async fn merchant_profile_follows_reviews() {
    let market = setup().await;
    let order = place_order(&market.orders, "sari", "rina", 250_000).await;
    let order = advance_to(&market.orders, &order, OrderStatusType::Completed).await;
    let mut profile = market.live.watch_merchant(&rina());
    let mut reviews = market.live.watch_reviews(&rina());
    assert_eq!(profile.next().await.unwrap().unwrap().data.review_count, 0);
    assert!(reviews.next().await.unwrap().unwrap().data.is_empty());

    let review = NewReview::new(rina(), order.id.clone(), sari(), 4).with_comment("Sari", "Jahitan rapi");
    market.reviews.submit_review(&sari(), review).await.unwrap();
    let snapshot = profile.next().await.unwrap().unwrap();
    assert_eq!(snapshot.data.review_count, 1);
    assert!((snapshot.data.rating - 4.0).abs() < f64::EPSILON);
    assert_eq!(reviews.next().await.unwrap().unwrap().data.len(), 1);

    let err = market.live.watch_transactions(&sari(), OrderScope::Merchant(rina())).unwrap_err();
    assert!(matches!(err, MarketError::PermissionDenied(_)), "{err:?}");
    let mut ledger = market.live.watch_transactions(&rina(), OrderScope::Merchant(rina())).unwrap();
    assert_eq!(ledger.next().await.unwrap().unwrap().data.len(), 1);
}
