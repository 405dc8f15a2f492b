use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{new_document_id, NewReview, Review, UserId};

pub async fn insert_review(
    review: NewReview,
    date: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Review, sqlx::Error> {
    let review: Review = sqlx::query_as(
        r#"
            INSERT INTO reviews (id, merchant_id, order_id, customer_id, rating, comment, reviewer_name, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(new_document_id())
    .bind(review.merchant_id)
    .bind(review.order_id)
    .bind(review.customer_id)
    .bind(review.rating)
    .bind(review.comment)
    .bind(review.reviewer_name)
    .bind(review.image_url)
    .bind(date)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Review {} ({}★) stored for order {}", review.id, review.rating, review.order_id);
    Ok(review)
}

pub async fn fetch_reviews_for_merchant(
    merchant_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Review>, sqlx::Error> {
    let reviews = sqlx::query_as("SELECT * FROM reviews WHERE merchant_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(merchant_id)
        .fetch_all(conn)
        .await?;
    Ok(reviews)
}
