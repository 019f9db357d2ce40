use thiserror::Error;

use crate::{
    db_types::{
        AddressId,
        Money,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        PaymentId,
        PaymentSession,
        PaymentStatus,
        ProductId,
    },
    traits::{AccountApiError, AccountManagement, SettlementResult},
};

/// Every error the engine can report.
///
/// The variants fall into three groups:
/// * validation errors, which are detected before any database work is done;
/// * business-state errors, which the client can correct and which must not be retried as-is;
/// * infrastructure errors, which are transient. See [`MarketplaceError::is_retryable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketplaceError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for product {product_id}. Available: {available}, requested: {requested}")]
    InsufficientStock { product_id: ProductId, available: i64, requested: i64 },
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("You are not authorised to access this resource")]
    Unauthorized,
    #[error("A valid delivery address belonging to the buyer is required")]
    AddressRequired,
    #[error("Payment {0} does not exist")]
    PaymentNotFound(String),
    #[error("The payment amount ({supplied}) does not match the order total ({expected})")]
    AmountMismatch { supplied: Money, expected: Money },
    #[error("Order {order_id} is {status} and cannot accept a payment")]
    OrderNotPayable { order_id: OrderId, status: OrderStatusType },
    #[error("Order status cannot change from {from} to {to}")]
    OrderTransitionForbidden { from: OrderStatusType, to: OrderStatusType },
    #[error("Order {order_id} is already {status}")]
    OrderTransitionNoOp { order_id: OrderId, status: OrderStatusType },
    #[error("Payment status cannot change from {from} to {to}")]
    PaymentTransitionForbidden { from: PaymentStatus, to: PaymentStatus },
    #[error("Payment {0} already has a payment session")]
    SessionAlreadyAttached(PaymentId),
    #[error("Payment {0} has been superseded by a newer payment attempt")]
    PaymentSuperseded(PaymentId),
    #[error("Only payments with a mock session can be confirmed without the payment gateway")]
    MockModeDisabled,
    #[error("Timed out waiting for a database lock. Please try again. {0}")]
    LockTimeout(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Payment provider error: {0}")]
    ProviderError(String),
}

impl MarketplaceError {
    /// Infrastructure failures that may succeed if the same request is submitted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout(_) | Self::DatabaseError(_) | Self::ProviderError(_))
    }
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        if is_lock_contention(&e) {
            MarketplaceError::LockTimeout(e.to_string())
        } else {
            MarketplaceError::DatabaseError(e.to_string())
        }
    }
}

impl From<AccountApiError> for MarketplaceError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(s) => MarketplaceError::DatabaseError(s),
            AccountApiError::LockTimeout(s) => MarketplaceError::LockTimeout(s),
        }
    }
}

/// SQLite reports lock contention as SQLITE_BUSY (5) or SQLITE_LOCKED (6), possibly as an extended result code.
/// A pool that cannot hand out a connection in time is treated the same way.
pub(crate) fn is_lock_contention(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|c| c.parse::<i32>().ok())
            .map(|code| matches!(code & 0xff, 5 | 6))
            .unwrap_or(false),
        _ => false,
    }
}

/// The state-changing operations of a marketplace backend.
///
/// Every method runs as one atomic database transaction. If a method returns an error, nothing it did is persisted.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Places an order against locked inventory.
    ///
    /// The cart is expected to have been validated already (non-empty, positive quantities). Quantities for the same
    /// product are aggregated. Product rows are locked in ascending id order, stock is re-read under the lock, and
    /// if every product can be supplied the stock is decremented and the order and its line items are inserted. Unit
    /// prices are taken from the locked rows.
    ///
    /// Errors: [`MarketplaceError::ProductNotFound`], [`MarketplaceError::InsufficientStock`],
    /// [`MarketplaceError::AddressRequired`] (if an address is given but does not belong to the buyer), and
    /// [`MarketplaceError::LockTimeout`].
    async fn place_order(&self, order: NewOrder) -> Result<Order, MarketplaceError>;

    /// Opens a new payment attempt for an order.
    ///
    /// With the order locked, this checks that the buyer owns the order, that it is still `pending`, and that the
    /// amount matches the stored total. Any earlier `pending` payment for the order is marked `failed`, so that at
    /// most one payment per order can still settle.
    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, MarketplaceError>;

    /// Stores the provider session on the payment and links the order to the payment and delivery address.
    ///
    /// A session can only be attached once, and only to a `pending` payment that is still the latest attempt for a
    /// `pending` order. Otherwise nothing is written and [`MarketplaceError::PaymentSuperseded`] (or
    /// [`MarketplaceError::OrderNotPayable`]) is returned.
    async fn attach_payment_session(
        &self,
        payment_id: PaymentId,
        address_id: AddressId,
        session: &PaymentSession,
    ) -> Result<Payment, MarketplaceError>;

    /// Moves a payment to `status`, and its order to the implied status, in a single transaction.
    ///
    /// * If the payment already has `status`, nothing is written.
    /// * Transitions out of a terminal payment status fail with [`MarketplaceError::PaymentTransitionForbidden`].
    /// * If the order is no longer `pending`, the order is left untouched.
    ///
    /// Stock levels are never modified here.
    async fn settle_payment(
        &self,
        payment_id: PaymentId,
        status: PaymentStatus,
    ) -> Result<SettlementResult, MarketplaceError>;

    /// Moves a paid order through fulfillment (`paid → shipped → completed`).
    async fn advance_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatusType,
    ) -> Result<Order, MarketplaceError>;
}
