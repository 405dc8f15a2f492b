use std::{
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};

use atelier_engine::{
    db_types::{NewMessage, NewReview, OrderStatusType, Role, UserId},
    events::{EventHandlers, EventHooks},
    live::ChangeFeed,
    test_utils::{
        prepare_env::fresh_database,
        seed::{advance_to, place_order, seed_profile},
    },
    ChatApi,
    OrderFlowApi,
    ReviewApi,
};
use log::*;
use tokio::runtime::Runtime;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }

    /// Handlers run on their own tasks, so give them a moment to catch up.
    pub async fn wait_for(&self, expected: i32) -> i32 {
        for _ in 0..100 {
            if self.count() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.count()
    }
}

#[test]
fn order_hooks_fire_once_per_event() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let created = HookCalled::default();
    let changed = HookCalled::default();
    let completed = HookCalled::default();
    let (c1, c2, c3) = (created.clone(), changed.clone(), completed.clone());
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks
            .on_order_created(move |ev| {
                info!("🪝️ created {}", ev.order.id);
                c1.called();
                Box::pin(async {})
            })
            .on_order_status_changed(move |ev| {
                info!("🪝️ {} {} -> {}", ev.order.id, ev.old_status, ev.order.status);
                c2.called();
                Box::pin(async {})
            })
            .on_order_completed(move |ev| {
                assert!(ev.transaction.is_some(), "a received order settles a payment");
                c3.called();
                Box::pin(async {})
            });
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let db = fresh_database().await;
        seed_profile(&db, "sari", "Sari", Role::Customer).await;
        seed_profile(&db, "rina", "Rina", Role::Merchant).await;
        let api = OrderFlowApi::new(db, producers, ChangeFeed::default());
        let order = place_order(&api, "sari", "rina", 150_000).await;
        place_order(&api, "sari", "rina", 90_000).await;
        advance_to(&api, &order, OrderStatusType::Completed).await;

        assert_eq!(created.wait_for(2).await, 2);
        assert_eq!(changed.wait_for(5).await, 5);
        assert_eq!(completed.wait_for(1).await, 1);
    });
    info!("🪝️ test complete");
}

#[test]
fn review_and_message_hooks() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let reviewed = HookCalled::default();
    let messaged = HookCalled::default();
    let (c1, c2) = (reviewed.clone(), messaged.clone());
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks
            .on_review_submitted(move |ev| {
                info!("🪝️ {} rated {}", ev.review.merchant_id, ev.review.rating);
                assert_eq!(ev.merchant_aggregate.review_count, 1);
                c1.called();
                Box::pin(async {})
            })
            .on_message_sent(move |ev| {
                info!("🪝️ message in {}", ev.conversation.id);
                c2.called();
                Box::pin(async {})
            });
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let db = fresh_database().await;
        seed_profile(&db, "sari", "Sari", Role::Customer).await;
        seed_profile(&db, "rina", "Rina", Role::Merchant).await;
        let feed = ChangeFeed::default();
        let orders = OrderFlowApi::new(db.clone(), producers.clone(), feed.clone());
        let reviews = ReviewApi::new(db.clone(), producers.clone(), feed.clone());
        let chat = ChatApi::new(db, producers, feed);

        let sari = UserId::from("sari");
        let order = place_order(&orders, "sari", "rina", 150_000).await;
        let order = advance_to(&orders, &order, OrderStatusType::Completed).await;
        let review = NewReview::new("rina", order.id.clone(), "sari", 5);
        reviews.submit_review(&sari, review.clone()).await.unwrap();
        // Refused reviews fire nothing
        assert!(reviews.submit_review(&sari, review).await.is_err());
        chat.send_message(&sari, &UserId::from("rina"), NewMessage::text("sari", "", "Terima kasih!")).await.unwrap();

        assert_eq!(reviewed.wait_for(1).await, 1);
        assert_eq!(messaged.wait_for(1).await, 1);
    });
    info!("🪝️ test complete");
}
