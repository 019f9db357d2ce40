use std::collections::HashMap;

use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db_types::{
    AddressId,
    Money,
    Order,
    OrderId,
    OrderItem,
    OrderStatusType,
    OrderType,
    PaymentId,
    ProductId,
    UserId,
};

/// Inserts a bare order record. Line items are added with [`insert_order_item`]. This is not atomic; call it inside a
/// transaction and pass `&mut tx` as the connection argument.
pub async fn insert_order(
    buyer_id: UserId,
    total_price: Money,
    order_type: OrderType,
    address_id: Option<AddressId>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (buyer_id, total_price, status, order_type, address_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(buyer_id)
    .bind(total_price)
    .bind(OrderStatusType::Pending)
    .bind(order_type)
    .bind(address_id)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn insert_order_item(
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    price: Money,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

/// Locks the order row for the rest of the transaction. The returned order does not include its line items.
pub async fn lock_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET status = status WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    trace!("🗃️ Locked order #{id}");
    Ok(order)
}

/// Fetches the order with the given id, along with its line items.
pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match order {
        Some(mut order) => {
            order.items = fetch_items_for_orders(&[id], conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Fetches all the orders for the buyer, newest first, with their line items.
pub async fn fetch_orders_for_buyer(buyer_id: UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut orders: Vec<Order> = sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 ORDER BY id DESC")
        .bind(buyer_id)
        .fetch_all(&mut *conn)
        .await?;
    let ids = orders.iter().map(|o| o.id).collect::<Vec<OrderId>>();
    let items = fetch_items_for_orders(&ids, conn).await?;
    attach_items(&mut orders, items);
    Ok(orders)
}

/// Fetches the line items for all the given orders, in insertion order.
pub async fn fetch_items_for_orders(
    order_ids: &[OrderId],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    if order_ids.is_empty() {
        return Ok(vec![]);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM order_items WHERE order_id IN (");
    let mut ids = builder.separated(", ");
    for id in order_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY order_id, id");
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    Ok(items)
}

fn attach_items(orders: &mut [Order], items: Vec<OrderItem>) {
    let index = orders.iter().enumerate().map(|(i, o)| (o.id, i)).collect::<HashMap<OrderId, usize>>();
    for item in items {
        if let Some(&i) = index.get(&item.order_id) {
            orders[i].items.push(item);
        }
    }
}

pub async fn update_order_status(
    id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Order #{id} is now {status}");
    Ok(order)
}

/// Records the payment attempt and delivery address against the order.
pub async fn link_payment(
    id: OrderId,
    payment_id: PaymentId,
    address_id: AddressId,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET payment_id = $1, address_id = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
    )
    .bind(payment_id)
    .bind(address_id)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}
