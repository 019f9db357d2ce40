use std::fmt::Display;

use market_payment_engine::{
    db_types::{AddressId, CartItem, Money, OrderId, OrderStatusType, PaymentId, SessionMode},
    payment_objects::PaymentReceipt,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub address_id: Option<AddressId>,
}

/// Body of `POST /api/orders/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatusType,
}

/// Body of `POST /api/payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: OrderId,
    pub address_id: AddressId,
    pub amount: Money,
}

/// Returned from `POST /api/payments`. The buyer completes payment at `redirect_url`, or with `snap_token` in an
/// embedded checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreatedResponse {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub txid: String,
    pub snap_token: String,
    pub redirect_url: String,
    pub amount: Money,
    pub mode: SessionMode,
}

impl From<PaymentReceipt> for PaymentCreatedResponse {
    fn from(receipt: PaymentReceipt) -> Self {
        Self {
            payment_id: receipt.payment.id,
            order_id: receipt.payment.order_id,
            txid: receipt.payment.txid,
            snap_token: receipt.session_token,
            redirect_url: receipt.redirect_url,
            amount: receipt.payment.amount,
            mode: receipt.mode,
        }
    }
}

/// Body of `POST /api/payments/mock-success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockPaymentConfirmation {
    pub payment_id: PaymentId,
}
