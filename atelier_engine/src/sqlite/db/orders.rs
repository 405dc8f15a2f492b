use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{ComplaintStatus, NewOrder, Order, OrderId, OrderStatusType, UserId},
    traits::{OrderQueryFilter, StatusUpdate},
};

/// Inserts a new order using the given connection. The order always starts in `Consultation` and unreviewed.
pub async fn insert_order(
    order: NewOrder,
    id: &OrderId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let m = order.measurements;
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                customer_id,
                merchant_id,
                customer_name,
                merchant_name,
                design_name,
                image_url,
                price,
                payment_method,
                payment_proof_url,
                shipping_method,
                shipping_address,
                height,
                weight,
                bust,
                waist,
                hips,
                shoulder,
                sleeve_length,
                customer_notes,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $21)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(order.customer_id)
    .bind(order.merchant_id)
    .bind(order.customer_name)
    .bind(order.merchant_name)
    .bind(order.design_name)
    .bind(order.image_url)
    .bind(order.price)
    .bind(order.payment_method)
    .bind(order.payment_proof_url)
    .bind(order.shipping_method)
    .bind(order.shipping_address)
    .bind(m.height)
    .bind(m.weight)
    .bind(m.bust)
    .bind(m.waist)
    .bind(m.hips)
    .bind(m.shoulder)
    .bind(m.sleeve_length)
    .bind(order.customer_notes)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted for customer {} with merchant {}", order.id, order.customer_id, order.merchant_id);
    Ok(order)
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at`, newest first.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(mid) = query.merchant_id {
        where_clause.push("merchant_id = ");
        where_clause.push_bind_unseparated(mid);
    }
    if let Some(statuses) = query.status.as_ref().filter(|s| !s.is_empty()) {
        // Enum display values only, so inlining is safe
        let status_clause = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since.trunc_subsecs(3));
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until.trunc_subsecs(3));
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Writes the status change, but only if the order is still in `update.from`.
///
/// Returns `None` when no row matched, i.e. the order does not exist or has moved on since the change was validated.
pub(crate) async fn apply_status_update(
    update: &StatusUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE orders SET ");
    let mut set_clause = builder.separated(", ");
    set_clause.push("status = ");
    set_clause.push_bind_unseparated(update.to);
    set_clause.push("updated_at = ");
    set_clause.push_bind_unseparated(now);
    if let Some(tracking_number) = &update.tracking_number {
        set_clause.push("tracking_number = ");
        set_clause.push_bind_unseparated(tracking_number.clone());
    }
    if let Some(reason) = &update.cancellation_reason {
        set_clause.push("cancellation_reason = ");
        set_clause.push_bind_unseparated(reason.clone());
    }
    if let Some(complaint) = &update.complaint {
        set_clause.push("complaint_reason = ");
        set_clause.push_bind_unseparated(complaint.reason.clone());
        set_clause.push("complaint_image_url = ");
        set_clause.push_bind_unseparated(complaint.image_url.clone());
        set_clause.push("complaint_date = ");
        set_clause.push_bind_unseparated(complaint.date);
        set_clause.push("complaint_status = ");
        set_clause.push_bind_unseparated(complaint.status);
    }
    if update.resolve_complaint {
        set_clause.push("complaint_status = ");
        set_clause.push_bind_unseparated(ComplaintStatus::Resolved);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(update.order_id.clone());
    builder.push(" AND status = ");
    builder.push_bind(update.from);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(order)
}

/// Flips `is_reviewed` on a completed, unreviewed order belonging to `merchant_id`.
///
/// Returns `None` if no such order exists, which also covers an order reviewed by a concurrent submission.
pub(crate) async fn mark_reviewed(
    order_id: &OrderId,
    merchant_id: &UserId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET is_reviewed = 1, updated_at = $1
            WHERE id = $2 AND merchant_id = $3 AND status = $4 AND is_reviewed = 0
            RETURNING *
        "#,
    )
    .bind(now)
    .bind(order_id)
    .bind(merchant_id)
    .bind(OrderStatusType::Completed)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
