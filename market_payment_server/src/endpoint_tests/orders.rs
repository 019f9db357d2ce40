use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use market_payment_engine::{
    db_types::{
        Money,
        Order,
        OrderId,
        OrderItem,
        OrderItemId,
        OrderStatusType,
        OrderType,
        Payment,
        PaymentId,
        PaymentStatus,
        ProductId,
        UserId,
    },
    traits::AccountApiError,
    AccountApi,
};

use super::helpers::get_request;
use crate::{
    endpoint_tests::mocks::MockAccountManager,
    routes::{MyOrdersRoute, MyPaymentsRoute, OrderByIdRoute, PaymentForOrderRoute},
};

const BUYER: Option<(i64, &str)> = Some((1, "buyer"));

#[actix_web::test]
async fn fetch_my_orders_no_headers() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(None, "/orders", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("mpg_user_id"), "{body}");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(BUYER, "/orders", configure).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders, vec![order(1, 1)]);
    assert_eq!(orders[0].items[0].price, Money::from(42_500));
}

#[actix_web::test]
async fn fetch_order_by_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(BUYER, "/orders/1", configure).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.id, OrderId(1));
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn try_fetch_another_buyers_order() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(Some((2, "buyer")), "/orders/1", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // Sellers get no special read access either
    let (status, _) = get_request(Some((100, "seller")), "/orders/1", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(BUYER, "/orders/99", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("99"), "{body}");
}

#[actix_web::test]
async fn fetch_latest_payment_for_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(BUYER, "/payments/orders/1", configure).await;
    assert_eq!(status, StatusCode::OK);
    let payment: Payment = serde_json::from_str(&body).unwrap();
    assert_eq!(payment.id, PaymentId(8));
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[actix_web::test]
async fn database_outages_are_server_errors() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(BUYER, "/payments", configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("disk I/O error"), "{body}");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut accounts = MockAccountManager::new();
    accounts
        .expect_fetch_orders_for_buyer()
        .returning(|buyer| Ok(if buyer == UserId(1) { vec![order(1, 1)] } else { vec![] }));
    accounts.expect_fetch_order().returning(|id| Ok((id == OrderId(1)).then(|| order(1, 1))));
    accounts.expect_fetch_payments_for_order().returning(|id| {
        let older = payment(7, id.value(), PaymentStatus::Failed);
        Ok(vec![payment(8, id.value(), PaymentStatus::Pending), older])
    });
    accounts
        .expect_fetch_payments_for_buyer()
        .returning(|_| Err(AccountApiError::DatabaseError("disk I/O error".to_string())));
    let accounts_api = AccountApi::new(accounts);
    cfg.service(MyOrdersRoute::<MockAccountManager>::new())
        .service(OrderByIdRoute::<MockAccountManager>::new())
        .service(MyPaymentsRoute::<MockAccountManager>::new())
        .service(PaymentForOrderRoute::<MockAccountManager>::new())
        .app_data(web::Data::new(accounts_api));
}

fn order(id: i64, buyer: i64) -> Order {
    let placed = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
    Order {
        id: OrderId(id),
        buyer_id: UserId(buyer),
        total_price: Money::from(85_000),
        status: OrderStatusType::Pending,
        order_type: OrderType::Regular,
        address_id: None,
        payment_id: None,
        created_at: placed,
        updated_at: placed,
        items: vec![OrderItem {
            id: OrderItemId(10),
            order_id: OrderId(id),
            product_id: ProductId(3),
            quantity: 2,
            price: Money::from(42_500),
        }],
    }
}

fn payment(id: i64, order_id: i64, status: PaymentStatus) -> Payment {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 15, 5, 0).unwrap();
    Payment {
        id: PaymentId(id),
        order_id: OrderId(order_id),
        buyer_id: UserId(1),
        amount: Money::from(85_000),
        status,
        txid: format!("ORD-{order_id:03}-1709305500-00{id:02}"),
        session_token: None,
        session_url: None,
        session_mode: None,
        created_at: created,
        updated_at: created,
    }
}
