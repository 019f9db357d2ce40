use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment, PaymentStatus, SessionMode};

/// The result of opening a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub session_token: String,
    pub redirect_url: String,
    pub mode: SessionMode,
}

/// What a settlement request did. Only infrastructure failures are reported as errors; everything a provider might
/// legitimately redeliver ends up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// The payment moved to a new status. The order may also have moved.
    Applied { payment: Payment, order: Order },
    /// The payment already had the requested status.
    Duplicate { payment: Payment, order: Order },
    /// The payment is in a terminal status and cannot take the requested one.
    Rejected { payment: Payment, requested: PaymentStatus },
    UnknownTransaction { txid: String },
    UnrecognisedStatus { status: String },
}

impl SettlementOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Applied { payment, order } => {
                format!("Payment {} is now {}. Order #{} is {}", payment.txid, payment.status, order.id, order.status)
            },
            Self::Duplicate { payment, .. } => format!("Payment {} is already {}", payment.txid, payment.status),
            Self::Rejected { payment, requested } => {
                format!("Payment {} is {} and cannot become {requested}", payment.txid, payment.status)
            },
            Self::UnknownTransaction { txid } => format!("Unknown transaction {txid}"),
            Self::UnrecognisedStatus { status } => format!("Ignored transaction status '{status}'"),
        }
    }
}
