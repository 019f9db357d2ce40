//! Payment provider selection.
//!
//! The server opens payment sessions through a [`ConfiguredProvider`]. When a real gateway server key is configured
//! it talks to the hosted gateway; otherwise every session is mocked locally.
use gateway_tools::{
    gross_amount,
    CustomerDetails,
    GatewayApi,
    GatewayApiError,
    GatewayConfig,
    GatewayNotification,
    ItemDetail,
    SnapTransactionRequest,
    TransactionDetails,
};
use log::*;
use market_payment_engine::{
    db_types::{PaymentSession, SessionMode},
    provider::{MockPaymentProvider, PaymentProvider, ProviderError, SessionRequest},
};
use mpg_common::Secret;

use crate::errors::ServerError;

#[derive(Clone)]
pub enum ConfiguredProvider {
    Mock(MockPaymentProvider),
    Live(LiveGateway),
}

#[derive(Clone)]
pub struct LiveGateway {
    api: GatewayApi,
    fallback: Option<MockPaymentProvider>,
}

impl ConfiguredProvider {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ServerError> {
        if !config.is_configured() {
            warn!("🚨️🚨️🚨️ No payment gateway server key is configured. Payment sessions will be MOCKED and no money \
                   will move. Set MPG_GATEWAY_SERVER_KEY to take real payments. 🚨️🚨️🚨️");
            return Ok(Self::Mock(MockPaymentProvider::new(config.base_url.as_str())));
        }
        let api = GatewayApi::new(config.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        let fallback = config.fallback_to_mock.then(|| {
            warn!("💳️ Mock sessions will be handed out whenever the payment gateway cannot be reached");
            MockPaymentProvider::new(config.base_url.as_str())
        });
        info!("💳️ Payment sessions will be opened at {}", config.base_url);
        Ok(Self::Live(LiveGateway { api, fallback }))
    }
}

impl PaymentProvider for ConfiguredProvider {
    fn mode(&self) -> SessionMode {
        match self {
            Self::Mock(_) => SessionMode::Mock,
            Self::Live(_) => SessionMode::Live,
        }
    }

    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderError> {
        match self {
            Self::Mock(mock) => mock.create_session(request).await,
            Self::Live(live) => live.create_session(request).await,
        }
    }
}

impl LiveGateway {
    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderError> {
        let snap_request = snap_request(request)?;
        match self.api.create_transaction(&snap_request).await {
            Ok(session) => {
                Ok(PaymentSession { token: session.token, redirect_url: session.redirect_url, mode: SessionMode::Live })
            },
            Err(e) if e.is_unreachable() => match &self.fallback {
                Some(mock) => {
                    let txid = &request.txid;
                    warn!("💳️ Payment gateway is unreachable ({e}). Falling back to a MOCK session for {txid}");
                    Ok(mock.session_for(request))
                },
                None => Err(ProviderError::Unreachable(e.to_string())),
            },
            Err(e) => Err(provider_error(e)),
        }
    }
}

/// Checks the signature on incoming gateway notifications.
///
/// Verification only happens in live mode. Mock sessions are never seen by the gateway, so there is nothing to sign
/// their notifications with.
#[derive(Clone, Debug)]
pub struct NotificationVerifier {
    server_key: Secret<String>,
    enabled: bool,
}

impl NotificationVerifier {
    pub fn new(config: &GatewayConfig, mode: SessionMode) -> Self {
        let enabled = mode == SessionMode::Live && config.verify_signatures;
        if mode == SessionMode::Live && !enabled {
            warn!("🚨️ Payment notification signatures will NOT be checked. Anyone can mark payments as settled.");
        }
        Self { server_key: config.server_key.clone(), enabled }
    }

    pub fn disabled() -> Self {
        Self { server_key: Secret::default(), enabled: false }
    }

    pub fn check(&self, notification: &GatewayNotification) -> Result<(), ServerError> {
        if !self.enabled || notification.verify_signature(self.server_key.reveal()) {
            Ok(())
        } else {
            warn!("💳️ Notification for {} has an invalid signature. It has been rejected.", notification.order_id);
            Err(ServerError::InvalidNotificationSignature)
        }
    }
}

fn provider_error(e: GatewayApiError) -> ProviderError {
    match e {
        GatewayApiError::Unreachable(s) => ProviderError::Unreachable(s),
        GatewayApiError::InvalidCurrencyAmount(s) => ProviderError::InvalidRequest(s),
        GatewayApiError::QueryError { status, message } => {
            ProviderError::Rejected(format!("Gateway returned {status}. {message}"))
        },
        other => ProviderError::Rejected(other.to_string()),
    }
}

/// Builds the gateway transaction for a payment. The line items must add up to the gross amount, so they are only
/// included when every price is in whole currency units.
pub fn snap_request(request: &SessionRequest) -> Result<SnapTransactionRequest, ProviderError> {
    let amount = gross_amount(request.amount).map_err(provider_error)?;
    let item_details = request
        .items
        .iter()
        .map(|item| {
            gross_amount(item.price).map(|price| ItemDetail {
                id: item.product_id.to_string(),
                price,
                quantity: item.quantity,
                name: item.name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            warn!("💳️ Line items for {} are left off the checkout page. {e}", request.txid);
            Vec::new()
        });
    let customer_details = (!request.customer_name.is_empty()).then(|| CustomerDetails {
        first_name: request.customer_name.clone(),
        phone: request.customer_phone.clone(),
    });
    Ok(SnapTransactionRequest {
        transaction_details: TransactionDetails { order_id: request.txid.clone(), gross_amount: amount },
        customer_details,
        item_details,
    })
}
