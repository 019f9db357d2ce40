use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Address, AddressId, Money, NewPayment, Order, OrderId, OrderStatusType, Payment, UserId},
    payment_objects::PaymentReceipt,
    provider::{PaymentProvider, SessionLineItem, SessionRequest},
    traits::{MarketplaceDatabase, MarketplaceError},
};

/// `PaymentApi` opens payment attempts for placed orders.
pub struct PaymentApi<B, P> {
    db: B,
    provider: P,
}

impl<B, P> Debug for PaymentApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B, P> PaymentApi<B, P> {
    pub fn new(db: B, provider: P) -> Self {
        Self { db, provider }
    }
}

impl<B, P> PaymentApi<B, P>
where
    B: MarketplaceDatabase,
    P: PaymentProvider,
{
    /// Opens a payment for the buyer's order and returns the session the buyer should be sent to.
    ///
    /// The order must belong to the buyer and still be `pending`, the address must belong to the buyer, and the
    /// amount must equal the order total. Any earlier pending attempt for the same order is superseded.
    ///
    /// If the provider fails to open a session, its error is returned as [`MarketplaceError::ProviderError`] and the
    /// payment record stays `pending` without a session. A retry will supersede it.
    pub async fn create_payment(
        &self,
        buyer_id: UserId,
        order_id: OrderId,
        address_id: AddressId,
        amount: Money,
    ) -> Result<PaymentReceipt, MarketplaceError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if order.buyer_id != buyer_id {
            warn!("💳️ Buyer {buyer_id} tried to pay for order #{order_id}, which belongs to {}", order.buyer_id);
            return Err(MarketplaceError::Unauthorized);
        }
        let address = self
            .db
            .fetch_address(address_id)
            .await?
            .filter(|a| a.user_id == buyer_id)
            .ok_or(MarketplaceError::AddressRequired)?;
        if order.status != OrderStatusType::Pending {
            return Err(MarketplaceError::OrderNotPayable { order_id, status: order.status });
        }
        if amount != order.total_price {
            return Err(MarketplaceError::AmountMismatch { supplied: amount, expected: order.total_price });
        }
        let payment = self.db.create_payment(NewPayment::new(order_id, buyer_id, amount)).await?;
        debug!("💳️ Payment #{} ({}) opened for order #{order_id}", payment.id, payment.txid);
        let request = self.session_request(&order, &payment, &address).await?;
        let session = self.provider.create_session(&request).await.map_err(|e| {
            warn!("💳️ Could not open a payment session for {}. {e}", payment.txid);
            MarketplaceError::ProviderError(e.to_string())
        })?;
        let payment = self.db.attach_payment_session(payment.id, address_id, &session).await?;
        info!("💳️ Payment {} for order #{order_id} is ready ({} session)", payment.txid, session.mode);
        Ok(PaymentReceipt {
            payment,
            session_token: session.token,
            redirect_url: session.redirect_url,
            mode: session.mode,
        })
    }

    async fn session_request(
        &self,
        order: &Order,
        payment: &Payment,
        address: &Address,
    ) -> Result<SessionRequest, MarketplaceError> {
        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let name = self
                .db
                .fetch_product(item.product_id)
                .await?
                .map(|p| p.name)
                .unwrap_or_else(|| format!("Product #{}", item.product_id));
            items.push(SessionLineItem {
                product_id: item.product_id,
                name,
                price: item.price,
                quantity: item.quantity,
            });
        }
        Ok(SessionRequest {
            payment_id: payment.id,
            txid: payment.txid.clone(),
            amount: payment.amount,
            customer_name: address.recipient_name.clone(),
            customer_phone: address.phone_number.clone(),
            items,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}
