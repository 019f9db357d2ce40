use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// Emitted once an order has been committed and its stock reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order: Order,
}

impl OrderPlacedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when a settlement moves an order to `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

/// Emitted when a failed payment moves an order to `cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPlaced(OrderPlacedEvent),
    OrderPaid(OrderPaidEvent),
    OrderCancelled(OrderCancelledEvent),
}
