use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, OrderId, Payment, PaymentId, PaymentSession, PaymentStatus, UserId},
    traits::MarketplaceError,
};

/// Inserts a new `pending` payment. Transaction ids are unique; a clash is reported as a database error.
pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, MarketplaceError> {
    let txid = payment.txid.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, buyer_id, amount, status, txid)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.buyer_id)
    .bind(payment.amount)
    .bind(PaymentStatus::Pending)
    .bind(payment.txid)
    .fetch_one(conn)
    .await;
    match result {
        Ok(payment) => Ok(payment),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(MarketplaceError::DatabaseError(format!("Transaction id {txid} is already in use")))
        },
        Err(e) => Err(e.into()),
    }
}

/// Marks every `pending` payment for the order as `failed`. Returns the number of payments affected.
pub async fn supersede_pending_payments(order_id: OrderId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 AND status = $3",
    )
    .bind(PaymentStatus::Failed)
    .bind(order_id)
    .bind(PaymentStatus::Pending)
    .execute(conn)
    .await?;
    let count = result.rows_affected();
    if count > 0 {
        debug!("🗃️ {count} pending payment(s) for order #{order_id} superseded");
    }
    Ok(count)
}

/// Stores the session details on a `pending` payment that has no session yet. Returns `None` if nothing was updated.
pub async fn set_session(
    id: PaymentId,
    session: &PaymentSession,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments
            SET session_token = $1, session_url = $2, session_mode = $3, updated_at = CURRENT_TIMESTAMP
            WHERE id = $4 AND session_token IS NULL AND status = $5
            RETURNING *;
        "#,
    )
    .bind(&session.token)
    .bind(&session.redirect_url)
    .bind(session.mode)
    .bind(id)
    .bind(PaymentStatus::Pending)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Locks the payment row for the rest of the transaction.
pub async fn lock_payment(id: PaymentId, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("UPDATE payments SET status = status WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn update_payment_status(
    id: PaymentId,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment =
        sqlx::query_as("UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_one(conn)
            .await?;
    Ok(payment)
}

pub async fn fetch_payment(id: PaymentId, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_by_txid(txid: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE txid = $1").bind(txid).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payments_for_buyer(
    buyer_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE buyer_id = $1 ORDER BY id DESC")
        .bind(buyer_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

pub async fn fetch_payments_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id DESC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}
