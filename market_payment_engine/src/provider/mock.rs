use chrono::Utc;
use log::*;

use crate::{
    db_types::{PaymentSession, SessionMode},
    provider::{PaymentProvider, ProviderError, SessionRequest},
};

pub const DEFAULT_MOCK_BASE_URL: &str = "https://app.sandbox.midtrans.com";

/// Hands out locally generated sessions without talking to anyone. Payments opened this way are settled with
/// [`crate::SettlementApi::confirm_mock`].
#[derive(Debug, Clone)]
pub struct MockPaymentProvider {
    base_url: String,
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_BASE_URL)
    }
}

impl MockPaymentProvider {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn session_for(&self, request: &SessionRequest) -> PaymentSession {
        let token = format!("mock-token-{}-{}", request.payment_id, Utc::now().timestamp());
        let redirect_url = format!("{}/snap/v2/vtweb/{token}", self.base_url.trim_end_matches('/'));
        PaymentSession { token, redirect_url, mode: SessionMode::Mock }
    }
}

impl PaymentProvider for MockPaymentProvider {
    fn mode(&self) -> SessionMode {
        SessionMode::Mock
    }

    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderError> {
        let session = self.session_for(request);
        info!("💳️ MOCK payment session for {} ({}). No money will move.", request.txid, request.amount);
        Ok(session)
    }
}
