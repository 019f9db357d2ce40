use sqlx::SqliteConnection;

use crate::db_types::{Address, AddressId, NewAddress};

pub async fn fetch_address(id: AddressId, conn: &mut SqliteConnection) -> Result<Option<Address>, sqlx::Error> {
    let address = sqlx::query_as("SELECT * FROM addresses WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(address)
}

pub async fn insert_address(address: NewAddress, conn: &mut SqliteConnection) -> Result<Address, sqlx::Error> {
    let address = sqlx::query_as(
        r#"
            INSERT INTO addresses (user_id, recipient_name, phone_number, street, city, province, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(address.user_id)
    .bind(address.recipient_name)
    .bind(address.phone_number)
    .bind(address.street)
    .bind(address.city)
    .bind(address.province)
    .bind(address.postal_code)
    .fetch_one(conn)
    .await?;
    Ok(address)
}
