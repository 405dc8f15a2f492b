use std::time::Duration;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use atelier_engine::{
    db_types::{NewReview, Order, OrderId, OrderStatusType, RatingAggregate, Review},
    events::EventProducers,
    live::ChangeFeed,
    traits::{ReviewReceipt, StoreError},
    OrderFlowApi,
    RetryPolicy,
    ReviewApi,
};
use chrono::{TimeZone, Utc};

use super::helpers::{get_request, post_request, sample_order, As};
use crate::{
    data_objects::ReviewParams,
    endpoint_tests::mocks::MockReviewStore,
    routes::{MerchantReviewsRoute, ReviewOrderRoute},
};

fn params(rating: u8) -> ReviewParams {
    ReviewParams { rating, comment: "Jahitannya rapi sekali".into(), reviewer_name: "Sari".into(), image_url: None }
}

#[actix_web::test]
async fn review_a_completed_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(As::Verified("sari"), "/orders/done01/review", &params(5), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let receipt: ReviewReceipt = serde_json::from_str(&body).expect("Not a review receipt");
    assert_eq!(receipt.review.rating, 5);
    assert_eq!(receipt.review.merchant_id.as_str(), "rina");
    assert!(receipt.order.is_reviewed);
    assert_eq!(receipt.merchant_aggregate.review_count, 2);
    assert!((receipt.merchant_aggregate.rating - 4.5).abs() < 1e-9);
}

#[actix_web::test]
async fn orders_in_progress_cannot_be_reviewed() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(As::Verified("sari"), "/orders/ship01/review", &params(4), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("not Completed"), "{body}");
}

#[actix_web::test]
async fn ratings_must_be_between_one_and_five() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request(As::Verified("sari"), "/orders/done01/review", &params(6), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn merchants_cannot_review_their_own_orders() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request(As::Verified("rina"), "/orders/done01/review", &params(5), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn a_review_that_keeps_losing_the_race_gives_up() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(As::Verified("sari"), "/orders/busy01/review", &params(3), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("after 3 attempts"), "{body}");
}

#[actix_web::test]
async fn list_merchant_reviews() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(As::Verified("mallory"), "/merchants/rina/reviews", configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let reviews: Vec<Review> = serde_json::from_str(&body).expect("Not a list of reviews");
    assert_eq!(reviews, vec![existing_review()]);
}

fn order(id: &str) -> Option<Order> {
    let status = match id {
        "done01" | "busy01" => OrderStatusType::Completed,
        "ship01" => OrderStatusType::Shipped,
        _ => return None,
    };
    Some(Order { id: OrderId(id.into()), ..sample_order(status) })
}

fn existing_review() -> Review {
    Review {
        id: "r0001".into(),
        merchant_id: "rina".into(),
        order_id: OrderId("old001".into()),
        customer_id: "dewi".into(),
        rating: 4,
        comment: "Bagus".into(),
        reviewer_name: "Dewi".into(),
        image_url: None,
        date: Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(),
    }
}

fn receipt(review: NewReview) -> ReviewReceipt {
    let mut order = order(review.order_id.as_str()).expect("Unknown order");
    order.is_reviewed = true;
    let date = Utc.with_ymd_and_hms(2024, 8, 20, 8, 0, 0).unwrap();
    ReviewReceipt {
        review: Review {
            id: "r0002".into(),
            merchant_id: review.merchant_id,
            order_id: review.order_id,
            customer_id: review.customer_id,
            rating: review.rating,
            comment: review.comment,
            reviewer_name: review.reviewer_name,
            image_url: review.image_url,
            date,
        },
        order,
        merchant_aggregate: RatingAggregate::new(4.0, 1).fold(review.rating),
    }
}

fn configure(cfg: &mut ServiceConfig) {
    // The order API and the review API each get their own store
    let mut order_store = MockReviewStore::new();
    order_store.expect_fetch_order().returning(|id| Ok(order(id.as_str())));
    let mut review_store = MockReviewStore::new();
    review_store.expect_fetch_order().returning(|id| Ok(order(id.as_str())));
    review_store.expect_record_review().returning(|review| match review.order_id.as_str() {
        "busy01" => Err(StoreError::Conflict("rating aggregate of rina changed".into())),
        _ => Ok(receipt(review)),
    });
    review_store.expect_fetch_reviews_for_merchant().returning(|_| Ok(vec![existing_review()]));
    let orders = OrderFlowApi::new(order_store, EventProducers::default(), ChangeFeed::default());
    let reviews = ReviewApi::new(review_store, EventProducers::default(), ChangeFeed::default())
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)));
    cfg.service(ReviewOrderRoute::<MockReviewStore>::new())
        .service(MerchantReviewsRoute::<MockReviewStore>::new())
        .app_data(web::Data::new(orders))
        .app_data(web::Data::new(reviews));
}
