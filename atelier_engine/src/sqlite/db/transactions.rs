use chrono::SubsecRound;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{db_types::Transaction, traits::TransactionQueryFilter};

/// Appends an entry to the ledger. Ledger rows are never updated afterwards.
pub async fn insert_transaction(tx: Transaction, conn: &mut SqliteConnection) -> Result<Transaction, sqlx::Error> {
    let tx: Transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (id, order_id, merchant_id, customer_id, amount, description, status, tx_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(tx.id)
    .bind(tx.order_id)
    .bind(tx.merchant_id)
    .bind(tx.customer_id)
    .bind(tx.amount)
    .bind(tx.description)
    .bind(tx.status)
    .bind(tx.tx_type)
    .bind(tx.date)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ {} of {} recorded for order {}", tx.tx_type, tx.amount, tx.order_id);
    Ok(tx)
}

/// Ledger entries matching the filter, newest first.
pub async fn search_transactions(
    query: TransactionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM transactions WHERE 1 = 1");
    if let Some(mid) = query.merchant_id {
        builder.push(" AND merchant_id = ");
        builder.push_bind(mid);
    }
    if let Some(cid) = query.customer_id {
        builder.push(" AND customer_id = ");
        builder.push_bind(cid);
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
    if let Some(since) = query.since {
        builder.push(" AND created_at >= ");
        builder.push_bind(since.trunc_subsecs(3));
    }
    if let Some(until) = query.until {
        builder.push(" AND created_at <= ");
        builder.push_bind(until.trunc_subsecs(3));
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let transactions = builder.build_query_as::<Transaction>().fetch_all(conn).await?;
    Ok(transactions)
}
