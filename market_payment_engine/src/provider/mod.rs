//! # Payment providers
//!
//! A [`PaymentProvider`] opens a payable session for a payment record. The engine ships with a
//! [`MockPaymentProvider`], which is used whenever no real provider has been configured. Integrations with a hosted
//! payment gateway implement the same trait (the server crate provides one).
mod mock;

pub use mock::{MockPaymentProvider, DEFAULT_MOCK_BASE_URL};
use thiserror::Error;

use crate::db_types::{Money, PaymentId, PaymentSession, ProductId, SessionMode};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider could not be contacted at all.
    #[error("Payment provider is unreachable: {0}")]
    Unreachable(String),
    /// The provider answered, but refused to open a session.
    #[error("{0}")]
    Rejected(String),
    #[error("Invalid session request: {0}")]
    InvalidRequest(String),
}

/// Everything a provider needs to know to open a session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub payment_id: PaymentId,
    pub txid: String,
    pub amount: Money,
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<SessionLineItem>,
}

#[derive(Debug, Clone)]
pub struct SessionLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

#[allow(async_fn_in_trait)]
pub trait PaymentProvider: Clone {
    /// Whether sessions from this provider are real, or simulated.
    fn mode(&self) -> SessionMode;

    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderError>;
}
