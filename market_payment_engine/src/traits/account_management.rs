use thiserror::Error;

use crate::db_types::{Address, AddressId, Order, OrderId, Payment, PaymentId, Product, ProductId, UserId};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Timed out waiting for the database: {0}")]
    LockTimeout(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        if super::marketplace_database::is_lock_contention(&e) {
            AccountApiError::LockTimeout(e.to_string())
        } else {
            AccountApiError::DatabaseError(e.to_string())
        }
    }
}

/// Read-only queries over the marketplace data.
///
/// None of these methods enforce ownership. Callers that act on behalf of a buyer (see
/// [`crate::AccountApi`]) must check that the returned records belong to that buyer.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, AccountApiError>;

    /// Fetches the order with the given id, including its line items.
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, AccountApiError>;

    /// Fetches all orders (with line items) placed by the buyer, newest first.
    async fn fetch_orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, AccountApiError>;

    async fn fetch_address(&self, address_id: AddressId) -> Result<Option<Address>, AccountApiError>;

    async fn fetch_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, AccountApiError>;

    /// Fetches a payment by its external transaction id.
    async fn fetch_payment_by_txid(&self, txid: &str) -> Result<Option<Payment>, AccountApiError>;

    /// Fetches all payments made by the buyer, newest first.
    async fn fetch_payments_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Payment>, AccountApiError>;

    /// Fetches every payment attempt for the order, newest first.
    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, AccountApiError>;
}
