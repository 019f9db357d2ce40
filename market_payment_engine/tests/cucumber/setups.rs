use cucumber::given;
use market_payment_engine::{
    db_types::UserId,
    test_utils::seed::{seed_address, seed_pre_order_product, seed_product},
};

use crate::cucumber::{market_world::MarketplaceSystem, MarketWorld};

#[given("a fresh marketplace")]
async fn fresh_database(world: &mut MarketWorld) {
    let system = MarketplaceSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "seller {int} lists {string} at {int} with {int} in stock")]
async fn list_product(world: &mut MarketWorld, seller: i64, name: String, price: i64, stock: i64) {
    let system = world.system_mut();
    let product = seed_product(&system.db, UserId(seller), &name, price, stock).await;
    system.products.insert(name, product.id);
}

#[given(expr = "seller {int} lists pre-order {string} at {int} with {int} in stock")]
async fn list_pre_order(world: &mut MarketWorld, seller: i64, name: String, price: i64, stock: i64) {
    let system = world.system_mut();
    let product = seed_pre_order_product(&system.db, UserId(seller), &name, price, stock).await;
    system.products.insert(name, product.id);
}

#[given(expr = "buyer {int} has a delivery address")]
async fn buyer_address(world: &mut MarketWorld, buyer: i64) {
    let system = world.system_mut();
    let address = seed_address(&system.db, UserId(buyer)).await;
    system.addresses.insert(buyer, address.id);
}
