//! End-to-end request flows against a real SQLite database and the mock payment provider.
use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gateway_tools::{notification_signature, GatewayConfig, GatewayNotification};
use market_payment_engine::{
    db_types::{
        Address,
        CartItem,
        Money,
        Order,
        OrderStatusType,
        Payment,
        PaymentStatus,
        Product,
        SessionMode,
        UserId,
    },
    events::EventProducers,
    provider::MockPaymentProvider,
    test_utils::{
        prepare_env::{drop_database, prepare_test_env, random_db_path},
        seed::{seed_address, seed_product, SELLER_A, SELLER_B},
    },
    traits::AccountManagement,
    AccountApi,
    OrderFlowApi,
    PaymentApi,
    SettlementApi,
    SqliteDatabase,
};
use mpg_common::Secret;
use serde_json::json;

use super::helpers::{get_request, post_raw, post_request};
use crate::{
    data_objects::{CreatePaymentRequest, JsonResponse, MockPaymentConfirmation, PaymentCreatedResponse},
    integrations::gateway::{ConfiguredProvider, NotificationVerifier},
    routes::{
        CreatePaymentRoute,
        MockPaymentSuccessRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PaymentForOrderRoute,
        PaymentWebhookRoute,
        PlaceOrderRoute,
        UpdateOrderStatusRoute,
    },
};

const BUYER: Option<(i64, &str)> = Some((1, "buyer"));
const SELLER: Option<(i64, &str)> = Some((100, "seller"));
const OTHER_SELLER: Option<(i64, &str)> = Some((200, "seller"));

struct TestMarket {
    url: String,
    db: SqliteDatabase,
    coffee: Product,
    address: Address,
    verifier: NotificationVerifier,
    provider: ConfiguredProvider,
    mode: SessionMode,
}

impl TestMarket {
    async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
        let coffee = seed_product(&db, SELLER_A, "Kopi Gayo 250g", 85_000, 5).await;
        let _ = seed_product(&db, SELLER_B, "Beras Merah 5kg", 120_000, 10).await;
        let address = seed_address(&db, UserId(1)).await;
        Self {
            url,
            db,
            coffee,
            address,
            verifier: NotificationVerifier::disabled(),
            provider: ConfiguredProvider::Mock(MockPaymentProvider::default()),
            mode: SessionMode::Mock,
        }
    }

    fn configure(&self) -> impl FnOnce(&mut ServiceConfig) {
        let db = self.db.clone();
        let verifier = self.verifier.clone();
        let provider = self.provider.clone();
        let mode = self.mode;
        move |cfg| {
            let producers = EventProducers::default();
            cfg.app_data(web::Data::new(OrderFlowApi::new(db.clone(), producers.clone())))
                .app_data(web::Data::new(PaymentApi::new(db.clone(), provider)))
                .app_data(web::Data::new(SettlementApi::new(db.clone(), producers, mode)))
                .app_data(web::Data::new(AccountApi::new(db)))
                .app_data(web::Data::new(verifier))
                .service(PaymentWebhookRoute::<SqliteDatabase>::new())
                .service(PlaceOrderRoute::<SqliteDatabase>::new())
                .service(MyOrdersRoute::<SqliteDatabase>::new())
                .service(OrderByIdRoute::<SqliteDatabase>::new())
                .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
                .service(MockPaymentSuccessRoute::<SqliteDatabase>::new())
                .service(PaymentForOrderRoute::<SqliteDatabase>::new())
                .service(CreatePaymentRoute::<SqliteDatabase, ConfiguredProvider>::new());
        }
    }

    async fn place_order(&self, quantity: i64) -> Order {
        let body = json!({ "items": [CartItem::new(self.coffee.id, quantity)] });
        let (status, body) = post_request(BUYER, "/orders", &body, self.configure()).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_str(&body).unwrap()
    }

    async fn pay(&self, order: &Order) -> PaymentCreatedResponse {
        let req = CreatePaymentRequest { order_id: order.id, address_id: self.address.id, amount: order.total_price };
        let (status, body) = post_request(BUYER, "/payments", &req, self.configure()).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_str(&body).unwrap()
    }

    async fn notify(&self, notification: &GatewayNotification) -> (StatusCode, String) {
        post_request(None, "/payments/webhook", notification, self.configure()).await
    }

    async fn order(&self, order: &Order) -> Order {
        let (status, body) = get_request(BUYER, &format!("/orders/{}", order.id), self.configure()).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        serde_json::from_str(&body).unwrap()
    }

    async fn stock(&self) -> i64 {
        self.db.fetch_product(self.coffee.id).await.unwrap().unwrap().stock
    }

    async fn tear_down(mut self) {
        self.db.close().await.unwrap();
        drop_database(&self.url).await;
    }
}

fn notification(txid: &str, status: &str) -> GatewayNotification {
    GatewayNotification {
        order_id: txid.to_string(),
        transaction_status: status.to_string(),
        status_code: "200".to_string(),
        gross_amount: "170000.00".to_string(),
        ..Default::default()
    }
}

#[actix_web::test]
async fn checkout_from_order_to_completion() {
    let market = TestMarket::new().await;
    let order = market.place_order(2).await;
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.total_price, Money::from(170_000));
    assert_eq!(order.items[0].price, Money::from(85_000));
    assert_eq!(market.stock().await, 3);

    let receipt = market.pay(&order).await;
    assert_eq!(receipt.mode, SessionMode::Mock);
    assert_eq!(receipt.amount, order.total_price);
    assert!(receipt.redirect_url.ends_with(&receipt.snap_token));

    let (status, body) = market.notify(&notification(&receipt.txid, "settlement")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    assert_eq!(market.order(&order).await.status, OrderStatusType::Paid);

    // The gateway redelivers. Nothing changes, and the gateway is told all is well.
    let (status, body) = market.notify(&notification(&receipt.txid, "capture")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already success"), "{body}");

    let path = format!("/payments/orders/{}", order.id);
    let (_, body) = get_request(BUYER, &path, market.configure()).await;
    let payment: Payment = serde_json::from_str(&body).unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    assert_eq!(payment.txid, receipt.txid);

    let path = format!("/orders/{}/status", order.id);
    let (status, _) = post_request(BUYER, &path, &json!({"status": "shipped"}), market.configure()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = post_request(OTHER_SELLER, &path, &json!({"status": "shipped"}), market.configure()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = post_request(SELLER, &path, &json!({"status": "completed"}), market.configure()).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    let (status, body) = post_request(SELLER, &path, &json!({"status": "shipped"}), market.configure()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (status, body) =
        post_request(Some((9, "admin")), &path, &json!({"status": "completed"}), market.configure()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = market.order(&order).await;
    assert_eq!(order.status, OrderStatusType::Completed);
    market.tear_down().await;
}

#[actix_web::test]
async fn orders_beyond_stock_change_nothing() {
    let market = TestMarket::new().await;
    let body = json!({ "items": [CartItem::new(market.coffee.id, 6)] });
    let (status, body) = post_request(BUYER, "/orders", &body, market.configure()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Insufficient stock"), "{body}");
    assert_eq!(market.stock().await, 5);

    let (status, body) = get_request(BUYER, "/orders", market.configure()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
    market.tear_down().await;
}

#[actix_web::test]
async fn malformed_requests() {
    let market = TestMarket::new().await;
    let (status, _) = post_raw(BUYER, "/orders", r#"{"items": "lots"}"#, market.configure()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = post_request(BUYER, "/orders", &json!({ "items": [] }), market.configure()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let body = json!({ "items": [CartItem::new(market.coffee.id, 1)] });
    let (status, _) = post_request(None, "/orders", &body, market.configure()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = post_request(Some((1, "wizard")), "/orders", &body, market.configure()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    market.tear_down().await;
}

#[actix_web::test]
async fn payment_amount_must_match_total() {
    let market = TestMarket::new().await;
    let order = market.place_order(1).await;
    let req = CreatePaymentRequest { order_id: order.id, address_id: market.address.id, amount: Money::from(1_000) };
    let (status, body) = post_request(BUYER, "/payments", &req, market.configure()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("does not match"), "{body}");
    // Someone else's order
    let req = CreatePaymentRequest { order_id: order.id, address_id: market.address.id, amount: order.total_price };
    let (status, _) = post_request(Some((2, "buyer")), "/payments", &req, market.configure()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    market.tear_down().await;
}

#[actix_web::test]
async fn denied_payments_cancel_the_order() {
    let market = TestMarket::new().await;
    let order = market.place_order(1).await;
    let receipt = market.pay(&order).await;
    let (status, _) = market.notify(&notification(&receipt.txid, "deny")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(market.order(&order).await.status, OrderStatusType::Cancelled);

    // A late success cannot resurrect the payment
    let (status, body) = market.notify(&notification(&receipt.txid, "settlement")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("cannot become success"), "{body}");
    assert_eq!(market.order(&order).await.status, OrderStatusType::Cancelled);
    market.tear_down().await;
}

#[actix_web::test]
async fn unknown_notifications_are_acknowledged() {
    let market = TestMarket::new().await;
    let (status, body) = market.notify(&notification("ORD-999-0-beef", "settlement")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Unknown transaction"), "{body}");

    let order = market.place_order(1).await;
    let receipt = market.pay(&order).await;
    let (status, body) = market.notify(&notification(&receipt.txid, "authorize")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ignored"), "{body}");
    assert_eq!(market.order(&order).await.status, OrderStatusType::Pending);
    market.tear_down().await;
}

#[actix_web::test]
async fn mock_success_settles_mock_payments() {
    let market = TestMarket::new().await;
    let order = market.place_order(1).await;
    let receipt = market.pay(&order).await;
    let confirmation = MockPaymentConfirmation { payment_id: receipt.payment_id };
    let (status, body) = post_request(None, "/payments/mock-success", &confirmation, market.configure()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
    let (status, body) = post_request(BUYER, "/payments/mock-success", &confirmation, market.configure()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let payment: Payment = serde_json::from_str(&body).unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    assert_eq!(market.order(&order).await.status, OrderStatusType::Paid);
    market.tear_down().await;
}

#[actix_web::test]
async fn fallback_sessions_can_be_confirmed_in_live_mode() {
    let mut market = TestMarket::new().await;
    let gateway = |fallback_to_mock| GatewayConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        server_key: Secret::new("SB-Mid-server-endpoint-test".to_string()),
        fallback_to_mock,
        verify_signatures: true,
    };
    market.provider = ConfiguredProvider::from_config(&gateway(true)).unwrap();
    market.mode = SessionMode::Live;
    let order = market.place_order(1).await;
    let receipt = market.pay(&order).await;
    assert_eq!(receipt.mode, SessionMode::Mock);

    let confirmation = MockPaymentConfirmation { payment_id: receipt.payment_id };
    let (status, body) = post_request(BUYER, "/payments/mock-success", &confirmation, market.configure()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let payment: Payment = serde_json::from_str(&body).unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    assert_eq!(market.order(&order).await.status, OrderStatusType::Paid);

    // Without the fallback the gateway error surfaces and there is nothing to confirm
    market.provider = ConfiguredProvider::from_config(&gateway(false)).unwrap();
    let second = market.place_order(1).await;
    let req = CreatePaymentRequest { order_id: second.id, address_id: market.address.id, amount: second.total_price };
    let (status, body) = post_request(BUYER, "/payments", &req, market.configure()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    market.tear_down().await;
}

#[actix_web::test]
async fn forged_notifications_are_refused_in_live_mode() {
    let mut market = TestMarket::new().await;
    let server_key = "SB-Mid-server-endpoint-test";
    let config = GatewayConfig { server_key: Secret::new(server_key.to_string()), ..Default::default() };
    market.verifier = NotificationVerifier::new(&config, SessionMode::Live);
    let order = market.place_order(2).await;
    let receipt = market.pay(&order).await;

    let mut forged = notification(&receipt.txid, "settlement");
    forged.signature_key = "00".repeat(64);
    let (status, _) = market.notify(&forged).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(market.order(&order).await.status, OrderStatusType::Pending);

    let mut genuine = notification(&receipt.txid, "settlement");
    genuine.signature_key = notification_signature(&genuine.order_id, "200", "170000.00", server_key);
    let (status, body) = market.notify(&genuine).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(market.order(&order).await.status, OrderStatusType::Paid);
    market.tear_down().await;
}
