use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartItem, NewOrder, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderPlacedEvent},
    order_objects::FulfillmentActor,
    traits::{MarketplaceDatabase, MarketplaceError},
};

/// `OrderFlowApi` places orders against shared inventory and moves paid orders through fulfillment.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

/// Rejects carts that can never be placed, before any database work is done.
pub fn validate_cart(items: &[CartItem]) -> Result<(), MarketplaceError> {
    if items.is_empty() {
        return Err(MarketplaceError::EmptyCart);
    }
    match items.iter().find(|i| i.quantity < 1) {
        Some(item) => Err(MarketplaceError::InvalidQuantity { product_id: item.product_id, quantity: item.quantity }),
        None => Ok(()),
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Places a new order for the buyer.
    ///
    /// Either the whole cart is supplied, stock is decremented, and a `pending` order is returned, or nothing at
    /// all changes. Concurrent orders for the same products are serialised on the product locks; exactly as many
    /// succeed as there is stock for.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, MarketplaceError> {
        validate_cart(&order.items)?;
        let buyer_id = order.buyer_id;
        let order = self.db.place_order(order).await.map_err(|e| {
            debug!("🔄️📦️ Order for buyer {buyer_id} was not placed. {e}");
            e
        })?;
        info!(
            "🔄️📦️ Order #{} placed for buyer {buyer_id}. {} line item(s), total {}",
            order.id,
            order.items.len(),
            order.total_price
        );
        self.call_order_placed_hook(&order);
        Ok(order)
    }

    /// Moves a paid order to `shipped`, or a shipped order to `completed`.
    pub async fn advance_fulfillment(
        &self,
        actor: FulfillmentActor,
        order_id: OrderId,
        status: OrderStatusType,
    ) -> Result<Order, MarketplaceError> {
        if let FulfillmentActor::Seller(seller_id) = actor {
            let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
            let mut sells_in_order = false;
            for item in &order.items {
                if let Some(product) = self.db.fetch_product(item.product_id).await? {
                    if product.seller_id == seller_id {
                        sells_in_order = true;
                        break;
                    }
                }
            }
            if !sells_in_order {
                warn!("🔄️📦️ Seller {seller_id} tried to update order #{order_id}, which has none of their products");
                return Err(MarketplaceError::Unauthorized);
            }
        }
        let order = self.db.advance_order_status(order_id, status).await?;
        info!("🔄️📦️ Order #{order_id} is now {status}");
        Ok(order)
    }

    fn call_order_placed_hook(&self, order: &Order) {
        for emitter in &self.producers.order_placed_producer {
            debug!("🔄️📦️ Notifying order placed hook subscribers");
            emitter.try_publish_event(OrderPlacedEvent::new(order.clone()));
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
