//! Catalog and address-book fixtures for tests and local development.
use crate::{
    db_types::{Address, Money, NewAddress, NewProduct, Product, UserId},
    SqliteDatabase,
};

pub const SELLER_A: UserId = UserId(100);
pub const SELLER_B: UserId = UserId(200);

pub async fn seed_product(db: &SqliteDatabase, seller: UserId, name: &str, price: i64, stock: i64) -> Product {
    db.insert_product(NewProduct::new(seller, name, Money::from(price), stock)).await.expect("Error seeding product")
}

pub async fn seed_pre_order_product(
    db: &SqliteDatabase,
    seller: UserId,
    name: &str,
    price: i64,
    stock: i64,
) -> Product {
    db.insert_product(NewProduct::new(seller, name, Money::from(price), stock).pre_order())
        .await
        .expect("Error seeding product")
}

pub async fn seed_address(db: &SqliteDatabase, user_id: UserId) -> Address {
    let address = NewAddress::new(user_id, "Siti Rahma", "081234567890").with_street(
        "Jl. Merdeka 17",
        "Bandung",
        "Jawa Barat",
        "40111",
    );
    db.insert_address(address).await.expect("Error seeding address")
}
