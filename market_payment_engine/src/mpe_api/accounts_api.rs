//! Read access to a buyer's own orders and payments.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{Order, OrderId, Payment, UserId},
    traits::{AccountManagement, MarketplaceError},
};

/// The `AccountApi` returns snapshots of orders and payments, checking that they belong to the buyer asking.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// All of the buyer's orders, newest first.
    pub async fn orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, MarketplaceError> {
        let orders = self.db.fetch_orders_for_buyer(buyer_id).await?;
        trace!("Fetched {} orders for buyer {buyer_id}", orders.len());
        Ok(orders)
    }

    pub async fn order_for_buyer(&self, buyer_id: UserId, order_id: OrderId) -> Result<Order, MarketplaceError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if order.buyer_id != buyer_id {
            return Err(MarketplaceError::Unauthorized);
        }
        Ok(order)
    }

    /// All of the buyer's payment attempts, newest first.
    pub async fn payments_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Payment>, MarketplaceError> {
        let payments = self.db.fetch_payments_for_buyer(buyer_id).await?;
        Ok(payments)
    }

    /// The most recent payment attempt for the buyer's order.
    pub async fn payment_for_order(&self, buyer_id: UserId, order_id: OrderId) -> Result<Payment, MarketplaceError> {
        self.order_for_buyer(buyer_id, order_id).await?;
        let payments = self.db.fetch_payments_for_order(order_id).await?;
        payments.into_iter().next().ok_or_else(|| MarketplaceError::PaymentNotFound(format!("for order {order_id}")))
    }
}
