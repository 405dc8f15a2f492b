use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{Row, SqliteConnection};

use crate::db_types::{
    new_document_id,
    CatalogItem,
    NewCatalogItem,
    ProfileUpdate,
    RatingAggregate,
    Role,
    UserId,
    UserProfile,
};

pub async fn fetch_profile(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<UserProfile>, sqlx::Error> {
    let profile = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(profile)
}

/// Inserts or overwrites the user-editable columns. `rating` and `review_count` are not in the column list, so an
/// existing aggregate survives any profile save.
pub async fn upsert_profile(
    user_id: &UserId,
    update: ProfileUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<UserProfile, sqlx::Error> {
    let m = update.measurements;
    let bank = update.bank.unwrap_or_default();
    let has_bank = !bank.bank_name.is_empty();
    let wallet = update.e_wallet.unwrap_or_default();
    let has_wallet = !wallet.wallet_name.is_empty();
    let profile: UserProfile = sqlx::query_as(
        r#"
            INSERT INTO users (
                id, name, email, role, brand_name, phone, address, bio, photo_url, body_fit_photo_url,
                height, weight, bust, waist, hips, shoulder, sleeve_length,
                bank_name, account_number, account_holder, wallet_name, wallet_phone,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22,
                $23, $23
            )
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role,
                brand_name = excluded.brand_name,
                phone = excluded.phone,
                address = excluded.address,
                bio = excluded.bio,
                photo_url = excluded.photo_url,
                body_fit_photo_url = excluded.body_fit_photo_url,
                height = excluded.height,
                weight = excluded.weight,
                bust = excluded.bust,
                waist = excluded.waist,
                hips = excluded.hips,
                shoulder = excluded.shoulder,
                sleeve_length = excluded.sleeve_length,
                bank_name = excluded.bank_name,
                account_number = excluded.account_number,
                account_holder = excluded.account_holder,
                wallet_name = excluded.wallet_name,
                wallet_phone = excluded.wallet_phone,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(update.name)
    .bind(update.email)
    .bind(update.role)
    .bind(update.brand_name)
    .bind(update.phone)
    .bind(update.address)
    .bind(update.bio)
    .bind(update.photo_url)
    .bind(update.body_fit_photo_url)
    .bind(m.map(|m| m.height))
    .bind(m.map(|m| m.weight))
    .bind(m.map(|m| m.bust))
    .bind(m.map(|m| m.waist))
    .bind(m.map(|m| m.hips))
    .bind(m.map(|m| m.shoulder))
    .bind(m.map(|m| m.sleeve_length))
    .bind(has_bank.then_some(bank.bank_name))
    .bind(has_bank.then_some(bank.account_number))
    .bind(has_bank.then_some(bank.account_holder))
    .bind(has_wallet.then_some(wallet.wallet_name))
    .bind(has_wallet.then_some(wallet.phone_number))
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Profile for {} ({}) saved", profile.id, profile.role);
    Ok(profile)
}

pub async fn fetch_merchants(conn: &mut SqliteConnection) -> Result<Vec<UserProfile>, sqlx::Error> {
    let merchants = sqlx::query_as("SELECT * FROM users WHERE role = $1 ORDER BY rating DESC, name ASC")
        .bind(Role::Merchant)
        .fetch_all(conn)
        .await?;
    Ok(merchants)
}

/// Reads the merchant's current `(rating, review_count)`. `None` if there is no such user.
pub(crate) async fn fetch_rating_aggregate(
    merchant_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<RatingAggregate>, sqlx::Error> {
    let row = sqlx::query("SELECT rating, review_count FROM users WHERE id = $1")
        .bind(merchant_id)
        .fetch_optional(conn)
        .await?;
    match row {
        Some(r) => Ok(Some(RatingAggregate::new(r.try_get("rating")?, r.try_get("review_count")?))),
        None => Ok(None),
    }
}

/// Writes the new aggregate, provided `review_count` is still the value it was computed from.
///
/// Returns `false` if another writer got there first.
pub(crate) async fn update_rating_aggregate(
    merchant_id: &UserId,
    previous: RatingAggregate,
    next: RatingAggregate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET rating = $1, review_count = $2, updated_at = $3 WHERE id = $4 AND review_count = $5",
    )
    .bind(next.rating)
    .bind(next.review_count)
    .bind(now)
    .bind(merchant_id)
    .bind(previous.review_count)
    .execute(conn)
    .await?;
    trace!("🗃️ Rating aggregate update for {merchant_id} affected {} rows", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_catalog(merchant_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<CatalogItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM catalog_items WHERE merchant_id = $1 ORDER BY position ASC")
        .bind(merchant_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Deletes the merchant's catalogue and inserts `items` in their given order. Not atomic on its own; call it inside
/// a transaction.
pub async fn replace_catalog(
    merchant_id: &UserId,
    items: Vec<NewCatalogItem>,
    conn: &mut SqliteConnection,
) -> Result<Vec<CatalogItem>, sqlx::Error> {
    sqlx::query("DELETE FROM catalog_items WHERE merchant_id = $1").bind(merchant_id).execute(&mut *conn).await?;
    let mut result = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        #[allow(clippy::cast_possible_wrap)]
        let position = position as i64;
        let item: CatalogItem = sqlx::query_as(
            r#"
                INSERT INTO catalog_items (id, merchant_id, position, title, image_url, description, price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *;
            "#,
        )
        .bind(new_document_id())
        .bind(merchant_id)
        .bind(position)
        .bind(item.title)
        .bind(item.image_url)
        .bind(item.description)
        .bind(item.price)
        .fetch_one(&mut *conn)
        .await?;
        result.push(item);
    }
    debug!("🗃️ Catalogue for {merchant_id} replaced with {} items", result.len());
    Ok(result)
}
