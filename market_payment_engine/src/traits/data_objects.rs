use crate::db_types::{Order, Payment};

/// The state of a payment and its order after a settlement transaction.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    pub payment: Payment,
    pub order: Order,
    pub payment_changed: bool,
    pub order_changed: bool,
}
