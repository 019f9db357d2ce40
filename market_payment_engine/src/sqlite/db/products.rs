use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Money, NewProduct, Product, ProductId};

/// Locks the product row for the rest of the transaction and returns its current state.
pub async fn lock_product(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("UPDATE products SET stock = stock WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    trace!("🗃️ Locked product #{id}");
    Ok(product)
}

/// Removes `quantity` units from stock. Returns false, and changes nothing, if there is not enough stock.
pub async fn decrement_stock(id: ProductId, quantity: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND $1 > 0 AND stock >= $1
        "#,
    )
    .bind(quantity)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_product(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (seller_id, name, price, stock, is_pre_order, is_subscription)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(product.seller_id)
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.is_pre_order)
    .bind(product.is_subscription)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn update_price(
    id: ProductId,
    price: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("UPDATE products SET price = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(price)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(product)
}

pub async fn set_stock(id: ProductId, stock: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("UPDATE products SET stock = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(stock)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(product)
}
