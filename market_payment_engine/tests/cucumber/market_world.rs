use std::collections::HashMap;

use cucumber::World;
use log::*;
use market_payment_engine::{
    db_types::{AddressId, OrderId, ProductId, SessionMode},
    events::EventProducers,
    payment_objects::{PaymentReceipt, SettlementOutcome},
    provider::MockPaymentProvider,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    AccountApi,
    OrderFlowApi,
    PaymentApi,
    SettlementApi,
    SqliteDatabase,
};
use tokio::time::sleep;

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketplaceSystem>,
}

#[derive(Debug)]
pub struct MarketplaceSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentApi<SqliteDatabase, MockPaymentProvider>,
    pub settlement: SettlementApi<SqliteDatabase>,
    pub accounts: AccountApi<SqliteDatabase>,
    /// Catalog entries, by product name
    pub products: HashMap<String, ProductId>,
    /// Each buyer's delivery address
    pub addresses: HashMap<i64, AddressId>,
    /// The most recent order each buyer placed
    pub last_order: HashMap<i64, OrderId>,
    /// The most recent payment each buyer opened
    pub last_receipt: HashMap<i64, PaymentReceipt>,
    pub last_outcome: Option<SettlementOutcome>,
    pub last_error: Option<String>,
}

impl MarketWorld {
    pub fn system(&self) -> &MarketplaceSystem {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn system_mut(&mut self) -> &mut MarketplaceSystem {
        self.system.as_mut().expect("Marketplace not initialised")
    }
}

impl MarketplaceSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(std::time::Duration::from_millis(50)).await;
        let producers = EventProducers::default();
        Self {
            db_path: url,
            orders: OrderFlowApi::new(db.clone(), producers.clone()),
            payments: PaymentApi::new(db.clone(), MockPaymentProvider::default()),
            settlement: SettlementApi::new(db.clone(), producers, SessionMode::Mock),
            accounts: AccountApi::new(db.clone()),
            db,
            products: HashMap::new(),
            addresses: HashMap::new(),
            last_order: HashMap::new(),
            last_receipt: HashMap::new(),
            last_outcome: None,
            last_error: None,
        }
    }

    pub fn product(&self, name: &str) -> ProductId {
        *self.products.get(name).unwrap_or_else(|| panic!("No product called {name}"))
    }

    pub fn order_for(&self, buyer: i64) -> OrderId {
        *self.last_order.get(&buyer).unwrap_or_else(|| panic!("Buyer {buyer} has not placed an order"))
    }

    pub fn receipt_for(&self, buyer: i64) -> &PaymentReceipt {
        self.last_receipt.get(&buyer).unwrap_or_else(|| panic!("Buyer {buyer} has not opened a payment"))
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
