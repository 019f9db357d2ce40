use market_payment_engine::{
    db_types::{Address, AddressId, Order, OrderId, Payment, PaymentId, Product, ProductId, UserId},
    traits::{AccountApiError, AccountManagement},
};
use mockall::mock;

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, AccountApiError>;
        async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, AccountApiError>;
        async fn fetch_orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, AccountApiError>;
        async fn fetch_address(&self, address_id: AddressId) -> Result<Option<Address>, AccountApiError>;
        async fn fetch_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, AccountApiError>;
        async fn fetch_payment_by_txid(&self, txid: &str) -> Result<Option<Payment>, AccountApiError>;
        async fn fetch_payments_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Payment>, AccountApiError>;
        async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, AccountApiError>;
    }
}
