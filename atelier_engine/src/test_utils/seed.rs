use crate::{
    db_types::{NewOrder, Order, OrderStatusType, ProfileUpdate, Role, Rupiah, UserId, UserProfile},
    market_api::transitions::TransitionRequest,
    traits::{OrderManagement, ProfileManagement},
    OrderFlowApi,
    SqliteDatabase,
};

pub async fn seed_profile(db: &SqliteDatabase, id: &str, name: &str, role: Role) -> UserProfile {
    let update = ProfileUpdate {
        name: name.to_string(),
        email: format!("{id}@atelier.test"),
        role,
        brand_name: (role == Role::Merchant).then(|| format!("{name} Atelier")),
        ..Default::default()
    };
    db.upsert_profile(&UserId::from(id), update).await.expect("Error seeding profile")
}

/// Overwrites a merchant's rating aggregate directly, bypassing the aggregator.
pub async fn seed_rating_aggregate(db: &SqliteDatabase, merchant: &str, rating: f64, review_count: i64) {
    sqlx::query("UPDATE users SET rating = $1, review_count = $2 WHERE id = $3")
        .bind(rating)
        .bind(review_count)
        .bind(merchant)
        .execute(db.pool())
        .await
        .expect("Error seeding rating aggregate");
}

pub async fn place_order(api: &OrderFlowApi<SqliteDatabase>, customer: &str, merchant: &str, price: i64) -> Order {
    let customer = UserId::from(customer);
    let order = NewOrder::new(customer.clone(), merchant, "Kebaya Modern", Rupiah::from(price))
        .with_names("Customer", "Merchant")
        .with_shipping("JNE - REG", "Jl. Mawar 12, Bandung");
    api.create_order(&customer, order).await.expect("Error placing order")
}

/// Drives an order from `Consultation` up to `target` along the main chain.
pub async fn advance_to(api: &OrderFlowApi<SqliteDatabase>, order: &Order, target: OrderStatusType) -> Order {
    use OrderStatusType::*;
    let mut current = api.db().fetch_order(&order.id).await.expect("Error fetching order").expect("Order vanished");
    for (next, actor) in [
        (Design, &order.merchant_id),
        (Production, &order.merchant_id),
        (Finishing, &order.merchant_id),
        (Shipped, &order.merchant_id),
        (Completed, &order.customer_id),
    ] {
        if current.status == target {
            break;
        }
        let request = match next {
            Shipped => TransitionRequest::ship("JX123"),
            other => TransitionRequest::to(other),
        };
        current = api.advance(&order.id, actor, request).await.expect("Error advancing seeded order");
    }
    current
}
