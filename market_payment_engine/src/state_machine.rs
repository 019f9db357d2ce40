//! Legal lifecycle transitions for orders and payments.
//!
//! ```text
//! Order:    pending ──► paid ──► shipped ──► completed
//!              └──────► cancelled
//!
//! Payment:  pending ──► success
//!              └──────► failed
//! ```
//!
//! `paid` and `cancelled` are reached only through payment settlement. `shipped` and `completed` are reached through
//! fulfillment. Terminal states accept no further transitions, which makes settlement monotonic: a late or replayed
//! notification can never move a payment backwards.
use std::{fmt::Display, str::FromStr};

use thiserror::Error;

use crate::db_types::{OrderStatusType, PaymentStatus};

/// The result of a legal transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status will change.
    Changed,
    /// The requested status is the current status. Nothing to do.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot move from {from} to {to}")]
pub struct IllegalTransition<S: Display + std::fmt::Debug> {
    pub from: S,
    pub to: S,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (Pending, Paid) | (Pending, Cancelled) | (Paid, Shipped) | (Shipped, Completed))
    }

    pub fn transition(&self, next: OrderStatusType) -> Result<Transition, IllegalTransition<OrderStatusType>> {
        if *self == next {
            Ok(Transition::Unchanged)
        } else if self.can_transition_to(next) {
            Ok(Transition::Changed)
        } else {
            Err(IllegalTransition { from: *self, to: next })
        }
    }

    /// Transitions that sellers and admins may drive directly.
    pub fn is_fulfillment_transition(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (Paid, Shipped) | (Shipped, Completed))
    }
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(self, Self::Pending) && next != Self::Pending
    }

    pub fn transition(&self, next: PaymentStatus) -> Result<Transition, IllegalTransition<PaymentStatus>> {
        if *self == next {
            Ok(Transition::Unchanged)
        } else if self.can_transition_to(next) {
            Ok(Transition::Changed)
        } else {
            Err(IllegalTransition { from: *self, to: next })
        }
    }

    /// The order status implied by a payment reaching this status, if any.
    pub fn implied_order_status(&self) -> Option<OrderStatusType> {
        match self {
            Self::Pending => None,
            Self::Success => Some(OrderStatusType::Paid),
            Self::Failed => Some(OrderStatusType::Cancelled),
        }
    }
}

//--------------------------------------  SettlementSignal   ---------------------------------------------------------
/// The raw transaction status vocabulary used by the payment provider's notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementSignal {
    Capture,
    Settlement,
    Pending,
    Deny,
    Cancel,
    Expire,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognised transaction status: {0}")]
pub struct UnrecognisedSignal(pub String);

impl FromStr for SettlementSignal {
    type Err = UnrecognisedSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "capture" => Ok(Self::Capture),
            "settlement" => Ok(Self::Settlement),
            "pending" => Ok(Self::Pending),
            "deny" => Ok(Self::Deny),
            "cancel" => Ok(Self::Cancel),
            "expire" => Ok(Self::Expire),
            _ => Err(UnrecognisedSignal(s.to_string())),
        }
    }
}

impl Display for SettlementSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Capture => "capture",
            Self::Settlement => "settlement",
            Self::Pending => "pending",
            Self::Deny => "deny",
            Self::Cancel => "cancel",
            Self::Expire => "expire",
        };
        f.write_str(s)
    }
}

impl SettlementSignal {
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            Self::Capture | Self::Settlement => PaymentStatus::Success,
            Self::Pending => PaymentStatus::Pending,
            Self::Deny | Self::Cancel | Self::Expire => PaymentStatus::Failed,
        }
    }
}
