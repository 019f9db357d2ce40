//! `SqliteDatabase` is a concrete implementation of a marketplace payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::{collections::BTreeMap, fmt::Debug, time::Duration};

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{addresses, db_url, new_pool, orders, payments, products, DEFAULT_LOCK_TIMEOUT};
use crate::{
    db_types::{
        Address,
        AddressId,
        CartItem,
        Money,
        NewAddress,
        NewOrder,
        NewPayment,
        NewProduct,
        Order,
        OrderId,
        OrderStatusType,
        OrderType,
        Payment,
        PaymentId,
        PaymentSession,
        PaymentStatus,
        Product,
        ProductId,
        UserId,
    },
    state_machine::Transition,
    traits::{AccountApiError, AccountManagement, MarketplaceDatabase, MarketplaceError, SettlementResult},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

/// Sums the requested quantity per product. Iterating the map visits products in ascending id order, which is the
/// order in which product rows must be locked. A sum that does not fit in an `i64` is recorded as `None`.
fn aggregate_quantities(items: &[CartItem]) -> BTreeMap<ProductId, Option<i64>> {
    items.iter().fold(BTreeMap::new(), |mut acc, item| {
        let total = acc.entry(item.product_id).or_insert(Some(0));
        *total = total.and_then(|q| q.checked_add(item.quantity));
        acc
    })
}

/// Prices each line at the locked unit price and sums the order total.
fn price_lines(
    items: &[CartItem],
    locked: &BTreeMap<ProductId, (Product, i64)>,
) -> Result<(Vec<(ProductId, i64, Money)>, Money), MarketplaceError> {
    let mut lines = Vec::with_capacity(items.len());
    let mut total = Money::default();
    for item in items {
        let price = locked
            .get(&item.product_id)
            .map(|(p, _)| p.price)
            .ok_or(MarketplaceError::ProductNotFound(item.product_id))?;
        total = price
            .checked_mul(item.quantity)
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or(MarketplaceError::InvalidQuantity { product_id: item.product_id, quantity: item.quantity })?;
        lines.push((item.product_id, item.quantity, price));
    }
    Ok((lines, total))
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn place_order(&self, order: NewOrder) -> Result<Order, MarketplaceError> {
        let requested = aggregate_quantities(&order.items);
        let mut tx = self.pool.begin().await?;
        let mut locked = BTreeMap::new();
        for (&product_id, &quantity) in &requested {
            let product = products::lock_product(product_id, &mut tx)
                .await?
                .ok_or(MarketplaceError::ProductNotFound(product_id))?;
            let Some(quantity) = quantity.filter(|q| *q <= product.stock) else {
                let requested = quantity.unwrap_or(i64::MAX);
                debug!(
                    "🗃️ Product #{product_id} has {} in stock, but {requested} were requested. Rolling back.",
                    product.stock
                );
                return Err(MarketplaceError::InsufficientStock { product_id, available: product.stock, requested });
            };
            locked.insert(product_id, (product, quantity));
        }
        if let Some(address_id) = order.address_id {
            let address = addresses::fetch_address(address_id, &mut tx).await?;
            if address.map(|a| a.user_id != order.buyer_id).unwrap_or(true) {
                return Err(MarketplaceError::AddressRequired);
            }
        }
        let (lines, total) = price_lines(&order.items, &locked)?;
        for (&product_id, &(_, quantity)) in &locked {
            if !products::decrement_stock(product_id, quantity, &mut tx).await? {
                // The row is locked, so the stock cannot have moved since it was checked
                error!("🗃️ Stock for product #{product_id} changed while it was locked. Rolling back.");
                let msg = format!("Stock for product {product_id} changed unexpectedly");
                return Err(MarketplaceError::DatabaseError(msg));
            }
        }
        let order_type =
            if locked.values().any(|(p, _)| p.is_pre_order) { OrderType::Preorder } else { OrderType::Regular };
        let mut new_order = orders::insert_order(order.buyer_id, total, order_type, order.address_id, &mut tx).await?;
        for (product_id, quantity, price) in lines {
            let item = orders::insert_order_item(new_order.id, product_id, quantity, price, &mut tx).await?;
            new_order.items.push(item);
        }
        tx.commit().await?;
        debug!(
            "🗃️ Order #{} for buyer {} saved with {} line item(s). Total: {total}",
            new_order.id,
            new_order.buyer_id,
            new_order.items.len()
        );
        Ok(new_order)
    }

    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::lock_order(payment.order_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::OrderNotFound(payment.order_id))?;
        if order.buyer_id != payment.buyer_id {
            return Err(MarketplaceError::Unauthorized);
        }
        if order.status != OrderStatusType::Pending {
            return Err(MarketplaceError::OrderNotPayable { order_id: order.id, status: order.status });
        }
        if order.total_price != payment.amount {
            return Err(MarketplaceError::AmountMismatch { supplied: payment.amount, expected: order.total_price });
        }
        let superseded = payments::supersede_pending_payments(order.id, &mut tx).await?;
        if superseded > 0 {
            info!("🗃️ {superseded} earlier payment attempt(s) for order #{} have been superseded", order.id);
        }
        let payment = payments::insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment #{} ({}) created for order #{}", payment.id, payment.txid, payment.order_id);
        Ok(payment)
    }

    async fn attach_payment_session(
        &self,
        payment_id: PaymentId,
        address_id: AddressId,
        session: &PaymentSession,
    ) -> Result<Payment, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let payment = match payments::set_session(payment_id, session, &mut tx).await? {
            Some(p) => p,
            None => {
                return match payments::fetch_payment(payment_id, &mut tx).await? {
                    Some(p) if p.session_token.is_some() => Err(MarketplaceError::SessionAlreadyAttached(payment_id)),
                    Some(p) => {
                        warn!("🗃️ Payment #{payment_id} is {} and can no longer take a session", p.status);
                        Err(MarketplaceError::PaymentSuperseded(payment_id))
                    },
                    None => Err(MarketplaceError::PaymentNotFound(payment_id.to_string())),
                };
            },
        };
        let order_id = payment.order_id;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Pending {
            return Err(MarketplaceError::OrderNotPayable { order_id, status: order.status });
        }
        if order.payment_id.is_some_and(|linked| linked > payment_id) {
            warn!("🗃️ Order #{order_id} is already linked to a newer payment than #{payment_id}");
            return Err(MarketplaceError::PaymentSuperseded(payment_id));
        }
        orders::link_payment(order_id, payment.id, address_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment #{payment_id} has a {} session. Order #{} linked.", session.mode, payment.order_id);
        Ok(payment)
    }

    async fn settle_payment(
        &self,
        payment_id: PaymentId,
        status: PaymentStatus,
    ) -> Result<SettlementResult, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::lock_payment(payment_id, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::PaymentNotFound(payment_id.to_string()))?;
        let transition = payment
            .status
            .transition(status)
            .map_err(|e| MarketplaceError::PaymentTransitionForbidden { from: e.from, to: e.to })?;
        let order_id = payment.order_id;
        if transition == Transition::Unchanged {
            let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
            debug!("🗃️ Payment #{payment_id} is already {status}. No action to take");
            return Ok(SettlementResult { payment, order, payment_changed: false, order_changed: false });
        }
        let payment = payments::update_payment_status(payment_id, status, &mut tx).await?;
        trace!("🗃️ Payment #{payment_id} is now {status}");
        let mut order_changed = false;
        if let Some(target) = status.implied_order_status() {
            let order =
                orders::lock_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
            match order.status.transition(target) {
                Ok(Transition::Changed) => {
                    orders::update_order_status(order_id, target, &mut tx).await?;
                    order_changed = true;
                },
                Ok(Transition::Unchanged) => {},
                Err(e) => {
                    warn!(
                        "🗃️ Payment #{payment_id} is now {status}, but order #{order_id} cannot move from {} to {}. \
                         The order has been left as is.",
                        e.from, e.to
                    );
                },
            }
        }
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        tx.commit().await?;
        Ok(SettlementResult { payment, order, payment_changed: true, order_changed })
    }

    async fn advance_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatusType,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::lock_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if order.status == status {
            return Err(MarketplaceError::OrderTransitionNoOp { order_id, status });
        }
        if !order.status.is_fulfillment_transition(status) {
            return Err(MarketplaceError::OrderTransitionForbidden { from: order.status, to: status });
        }
        orders::update_order_status(order_id, status, &mut tx).await?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        tx.commit().await?;
        Ok(order)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_buyer(buyer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_address(&self, address_id: AddressId) -> Result<Option<Address>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let address = addresses::fetch_address(address_id, &mut conn).await?;
        Ok(address)
    }

    async fn fetch_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_by_txid(&self, txid: &str) -> Result<Option<Payment>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_txid(txid, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payments_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Payment>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_buyer(buyer_id, &mut conn).await?;
        Ok(payments)
    }

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `MPG_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    /// Creates a new database API object with the default lock timeout
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_options(url, max_connections, DEFAULT_LOCK_TIMEOUT).await
    }

    /// Creates a new database API object. Transactions wait at most `lock_timeout` for a contended lock before
    /// failing with [`MarketplaceError::LockTimeout`].
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        lock_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections, lock_timeout).await?;
        trace!("🗃️ Created new database pool with url {url} and lock timeout {}ms", lock_timeout.as_millis());
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }

    // Catalog and address book writes belong to other services. These helpers exist for seeding and tooling.

    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        Ok(product)
    }

    pub async fn update_product_price(&self, product_id: ProductId, price: Money) -> Result<Product, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        products::update_price(product_id, price, &mut conn).await?.ok_or(MarketplaceError::ProductNotFound(product_id))
    }

    pub async fn set_product_stock(&self, product_id: ProductId, stock: i64) -> Result<Product, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        products::set_stock(product_id, stock, &mut conn).await?.ok_or(MarketplaceError::ProductNotFound(product_id))
    }

    pub async fn insert_address(&self, address: NewAddress) -> Result<Address, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let address = addresses::insert_address(address, &mut conn).await?;
        Ok(address)
    }
}
