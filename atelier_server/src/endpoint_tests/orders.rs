use actix_web::{http::StatusCode, web, web::ServiceConfig};
use atelier_engine::{
    db_types::{Order, OrderStatusType},
    events::EventProducers,
    live::ChangeFeed,
    transitions::TransitionRequest,
    OrderFlowApi,
};
use log::debug;

use super::helpers::{get_request, post_request, sample_order, As};
use crate::{
    endpoint_tests::mocks::MockOrderManager,
    routes::{AdvanceOrderRoute, MyOrdersRoute, OrderByIdRoute},
};

#[actix_web::test]
async fn fetch_order_without_identity() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(As::Nobody, "/orders/a1b2c3", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No identity was supplied with the request."}"#);
}

#[actix_web::test]
async fn fetch_order_with_forged_identity() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(As::Forged("sari"), "/orders/a1b2c3", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("signature is invalid"), "{body}");
}

#[actix_web::test]
async fn unverified_users_are_turned_away() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(As::Unverified("sari"), "/orders", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("sari has not verified their email address yet"), "{body}");
}

#[actix_web::test]
async fn fetch_my_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(As::Verified("sari"), "/orders/a1b2c3", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).expect("Not an order");
    assert_eq!(order, sample_order(OrderStatusType::Finishing));
}

#[actix_web::test]
async fn outsiders_cannot_read_an_order() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(As::Verified("mallory"), "/orders/a1b2c3", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_orders_are_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(As::Verified("sari"), "/orders/zzz999", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn list_my_orders_as_merchant() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(As::Verified("rina"), "/orders?as=merchant", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Order> = serde_json::from_str(&body).expect("Not a list of orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].merchant_id.as_str(), "rina");
}

#[actix_web::test]
async fn shipping_without_a_tracking_number_is_refused() {
    let _ = env_logger::try_init().ok();
    let body = TransitionRequest::to(OrderStatusType::Shipped);
    let (status, body) =
        post_request(As::Verified("rina"), "/orders/a1b2c3/advance", &body, configure).await.expect("Request failed");
    debug!("🚀️ {body}");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("tracking_number"), "{body}");
}

#[actix_web::test]
async fn customers_cannot_ship() {
    let _ = env_logger::try_init().ok();
    let body = TransitionRequest::ship("JX123");
    let (status, _) =
        post_request(As::Verified("sari"), "/orders/a1b2c3/advance", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unreachable_statuses_are_a_conflict() {
    let _ = env_logger::try_init().ok();
    let body = TransitionRequest::to(OrderStatusType::Design);
    let (status, _) =
        post_request(As::Verified("rina"), "/orders/a1b2c3/advance", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut orders = MockOrderManager::new();
    orders.expect_fetch_order().returning(|id| {
        Ok((id.as_str() == "a1b2c3").then(|| sample_order(OrderStatusType::Finishing)))
    });
    orders.expect_search_orders().returning(|filter| {
        assert_eq!(filter.merchant_id.as_ref().map(|m| m.as_str()), Some("rina"));
        assert!(filter.customer_id.is_none());
        Ok(vec![sample_order(OrderStatusType::Finishing)])
    });
    // Every refused transition is refused before anything is written
    orders.expect_apply_status_update().times(0);
    let api = OrderFlowApi::new(orders, EventProducers::default(), ChangeFeed::default());
    cfg.service(MyOrdersRoute::<MockOrderManager>::new())
        .service(OrderByIdRoute::<MockOrderManager>::new())
        .service(AdvanceOrderRoute::<MockOrderManager>::new())
        .app_data(web::Data::new(api));
}
