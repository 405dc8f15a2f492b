use std::str::FromStr;

use atelier_engine::{
    db_types::{ConversationId, NewMessage, NewOrder, NewReview, OrderStatusType, Rupiah, UserId},
    order_objects::OrderScope,
    traits::{OrderManagement, ProfileManagement},
    transitions::TransitionRequest,
    MarketError,
};
use cucumber::{then, when};
use futures_util::future::join_all;

use crate::cucumber::MarketWorld;

fn status(s: &str) -> OrderStatusType {
    OrderStatusType::from_str(s).expect("Not a valid order status")
}

fn error_kind(e: &MarketError) -> &'static str {
    match e {
        MarketError::InvalidTransition { .. } => "InvalidTransition",
        MarketError::Forbidden(_) => "Forbidden",
        MarketError::MissingField(_) => "MissingField",
        MarketError::NotReviewable(_) => "NotReviewable",
        MarketError::Conflict(_) => "Conflict",
        MarketError::AggregationFailed { .. } => "AggregationFailed",
        MarketError::PermissionDenied(_) => "PermissionDenied",
        MarketError::Unavailable(_) => "Unavailable",
        MarketError::NotFound(_) => "NotFound",
        MarketError::InvalidInput(_) => "InvalidInput",
        MarketError::DatabaseError(_) => "DatabaseError",
    }
}

async fn request(world: &mut MarketWorld, actor: String, request: TransitionRequest) {
    let order_id = world.order().id.clone();
    let result = world.system().orders.advance(&order_id, &UserId::from(actor), request).await;
    if let Some(order) = world.record(result) {
        world.order = Some(order);
    }
}

#[when(expr = "'{word}' orders {string} from '{word}' for {int} IDR")]
async fn place_order(world: &mut MarketWorld, customer: String, design: String, merchant: String, price: i64) {
    let customer = UserId::from(customer);
    let order = NewOrder::new(customer.clone(), merchant, design, Rupiah::from(price));
    let order = world.system().orders.create_order(&customer, order).await.expect("Error placing order");
    world.order = Some(order);
}

#[when(expr = "'{word}' moves the order to {word}")]
async fn advance(world: &mut MarketWorld, actor: String, to: String) {
    request(world, actor, TransitionRequest::to(status(&to))).await;
}

#[when(expr = "'{word}' ships the order with tracking number {string}")]
async fn ship(world: &mut MarketWorld, actor: String, tracking_number: String) {
    request(world, actor, TransitionRequest::ship(tracking_number)).await;
}

#[when(expr = "'{word}' cancels the order because {string}")]
async fn cancel(world: &mut MarketWorld, actor: String, reason: String) {
    request(world, actor, TransitionRequest::cancel(reason)).await;
}

#[when(expr = "'{word}' complains about the order because {string}")]
async fn complain(world: &mut MarketWorld, actor: String, reason: String) {
    request(world, actor, TransitionRequest::complain(reason, None)).await;
}

#[when(expr = "'{word}' reviews the order with {int} stars")]
async fn review(world: &mut MarketWorld, actor: String, rating: u8) {
    let order = world.order().clone();
    let review = NewReview::new(order.merchant_id, order.id, order.customer_id, rating);
    let result = world.system().reviews.submit_review(&UserId::from(actor), review).await;
    world.record(result);
}

#[when(expr = "{int} customers of '{word}' review their completed orders at once with {string} stars")]
async fn concurrent_reviews(world: &mut MarketWorld, n: usize, merchant: String, ratings: String) {
    let ratings = ratings.split(',').map(|r| r.trim().parse::<u8>().expect("Not a rating")).collect::<Vec<_>>();
    assert_eq!(ratings.len(), n, "Supply one rating per customer");
    let system = world.system();
    let mut orders = Vec::with_capacity(n);
    for i in 0..n {
        let customer = UserId::from(format!("shopper{i}"));
        let order = NewOrder::new(customer.clone(), merchant.as_str(), "Kemeja Batik", Rupiah::from(100_000));
        let order = system.orders.create_order(&customer, order).await.expect("Error placing order");
        let merchant_id = order.merchant_id.clone();
        for next in [
            OrderStatusType::Design,
            OrderStatusType::Production,
            OrderStatusType::Finishing,
        ] {
            system.orders.advance(&order.id, &merchant_id, TransitionRequest::to(next)).await.expect("advance");
        }
        system.orders.advance(&order.id, &merchant_id, TransitionRequest::ship("JX123")).await.expect("ship");
        let order = system
            .orders
            .advance(&order.id, &customer, TransitionRequest::to(OrderStatusType::Completed))
            .await
            .expect("complete");
        orders.push(order);
    }
    let submissions = orders.iter().zip(ratings).map(|(order, rating)| {
        let review = NewReview::new(order.merchant_id.clone(), order.id.clone(), order.customer_id.clone(), rating);
        system.reviews.submit_review(&order.customer_id, review)
    });
    for result in join_all(submissions).await {
        assert!(result.is_ok(), "Concurrent review failed: {result:?}");
    }
}

#[when(expr = "'{word}' and '{word}' exchange {int} messages")]
async fn exchange_messages(world: &mut MarketWorld, a: String, b: String, n: usize) {
    let (a, b) = (UserId::from(a), UserId::from(b));
    let chat = &world.system().chat;
    let sends = (0..n).map(|i| {
        let (from, to) = if i % 2 == 0 { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };
        async move {
            let message = NewMessage::text(from.clone(), String::new(), format!("pesan {i}"));
            chat.send_message(&from, &to, message).await
        }
    });
    for result in join_all(sends).await {
        assert!(result.is_ok(), "Message was refused: {result:?}");
    }
}

#[then(expr = "the order status is {word}")]
async fn check_status(world: &mut MarketWorld, expected: String) {
    let stored = world.db().fetch_order(&world.order().id).await.expect("Error fetching order").expect("No order");
    assert_eq!(stored.status, status(&expected));
}

#[then(expr = "the last request was rejected with {word}")]
async fn check_rejected(world: &mut MarketWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last request succeeded");
    assert_eq!(error_kind(err), kind, "{err}");
}

#[then("the last request succeeded")]
async fn check_succeeded(world: &mut MarketWorld) {
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
}

#[then(expr = "the order tracking number is {string}")]
async fn check_tracking(world: &mut MarketWorld, expected: String) {
    assert_eq!(world.order().tracking_number.as_deref(), Some(expected.as_str()));
}

#[then(expr = "the order is reviewed")]
async fn check_reviewed(world: &mut MarketWorld) {
    let stored = world.db().fetch_order(&world.order().id).await.expect("Error fetching order").expect("No order");
    assert!(stored.is_reviewed);
}

#[then(expr = "merchant '{word}' has {int} transaction(s) totalling {int} IDR")]
async fn check_ledger(world: &mut MarketWorld, merchant: String, count: usize, total: i64) {
    let merchant = UserId::from(merchant);
    let ledger = world.system().orders.transactions(&OrderScope::Merchant(merchant.clone())).await.expect("ledger");
    assert_eq!(ledger.len(), count);
    let sum = ledger.iter().fold(Rupiah::from(0), |acc, tx| acc + tx.amount);
    assert_eq!(sum, Rupiah::from(total));
    let order = world.order();
    for tx in &ledger {
        assert_eq!(tx.merchant_id, merchant);
        assert_eq!(tx.customer_id, order.customer_id);
        assert_eq!(tx.order_id, order.id);
    }
}

#[then(expr = "merchant '{word}' has a rating of {float} from {int} reviews")]
async fn check_rating(world: &mut MarketWorld, merchant: String, rating: f64, count: i64) {
    let profile = world.db().fetch_profile(&UserId::from(merchant)).await.expect("profile").expect("No merchant");
    assert_eq!(profile.review_count, count);
    assert!((profile.rating - rating).abs() < 1e-3, "rating is {}, expected {rating}", profile.rating);
}

#[then(expr = "both '{word}' and '{word}' see {int} messages in timestamp order")]
async fn check_messages(world: &mut MarketWorld, a: String, b: String, n: usize) {
    let (a, b) = (UserId::from(a), UserId::from(b));
    let id = ConversationId::for_pair(&a, &b);
    let chat = &world.system().chat;
    let for_a = chat.messages(&a, &id).await.expect("messages");
    let for_b = chat.messages(&b, &id).await.expect("messages");
    assert_eq!(for_a, for_b);
    assert_eq!(for_a.len(), n);
    assert!(for_a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}
