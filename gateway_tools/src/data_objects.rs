use serde::{Deserialize, Serialize};

use crate::helpers::notification_signature;

#[derive(Debug, Clone, Serialize)]
pub struct SnapTransactionRequest {
    pub transaction_details: TransactionDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_details: Option<CustomerDetails>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item_details: Vec<ItemDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    /// The merchant-side transaction id. The gateway echoes it back as `order_id` in notifications.
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDetail {
    pub id: String,
    pub price: i64,
    pub quantity: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SnapSession {
    pub token: String,
    pub redirect_url: String,
}

/// A payment status notification, as posted by the gateway to the merchant's webhook.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayNotification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub signature_key: String,
    pub transaction_id: Option<String>,
    pub payment_type: Option<String>,
    pub fraud_status: Option<String>,
    pub transaction_time: Option<String>,
}

impl GatewayNotification {
    pub fn verify_signature(&self, server_key: &str) -> bool {
        let expected = notification_signature(&self.order_id, &self.status_code, &self.gross_amount, server_key);
        expected.eq_ignore_ascii_case(self.signature_key.trim())
    }
}
