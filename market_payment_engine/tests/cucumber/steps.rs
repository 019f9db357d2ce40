use cucumber::{then, when};
use market_payment_engine::{
    db_types::{CartItem, Money, NewOrder, OrderStatusType, OrderType, PaymentStatus, UserId},
    order_objects::FulfillmentActor,
    payment_objects::SettlementOutcome,
    AccountManagement,
};

use crate::cucumber::MarketWorld;

async fn place(world: &mut MarketWorld, buyer: i64, items: Vec<(i64, String)>) {
    let system = world.system_mut();
    let cart = items.into_iter().map(|(quantity, name)| CartItem::new(system.product(&name), quantity)).collect();
    match system.orders.place_order(NewOrder::new(UserId(buyer), cart)).await {
        Ok(order) => {
            system.last_order.insert(buyer, order.id);
            system.last_error = None;
        },
        Err(e) => system.last_error = Some(e.to_string()),
    }
}

#[when(expr = "buyer {int} orders {int} of {string}")]
async fn order_one(world: &mut MarketWorld, buyer: i64, quantity: i64, name: String) {
    place(world, buyer, vec![(quantity, name)]).await;
}

#[when(expr = "buyer {int} orders {int} of {string} and {int} of {string}")]
async fn order_two(world: &mut MarketWorld, buyer: i64, q1: i64, name1: String, q2: i64, name2: String) {
    place(world, buyer, vec![(q1, name1), (q2, name2)]).await;
}

async fn pay(world: &mut MarketWorld, buyer: i64, amount: Option<i64>) {
    let system = world.system_mut();
    let order_id = system.order_for(buyer);
    let address_id = *system.addresses.get(&buyer).expect("Buyer has no address");
    let order = system.db.fetch_order(order_id).await.expect("Error fetching order").expect("Order does not exist");
    let amount = amount.map(Money::from).unwrap_or(order.total_price);
    match system.payments.create_payment(UserId(buyer), order_id, address_id, amount).await {
        Ok(receipt) => {
            system.last_receipt.insert(buyer, receipt);
            system.last_error = None;
        },
        Err(e) => system.last_error = Some(e.to_string()),
    }
}

#[when(expr = "buyer {int} pays for their order")]
async fn pay_in_full(world: &mut MarketWorld, buyer: i64) {
    pay(world, buyer, None).await;
}

#[when(expr = "buyer {int} pays {int} for their order")]
async fn pay_amount(world: &mut MarketWorld, buyer: i64, amount: i64) {
    pay(world, buyer, Some(amount)).await;
}

async fn notify(world: &mut MarketWorld, txid: String, status: String) {
    let system = world.system_mut();
    let outcome = system.settlement.settle(&txid, &status).await.expect("Settlement failed");
    system.last_outcome = Some(outcome);
}

#[when(expr = "the provider reports {string} for the payment of buyer {int}")]
async fn provider_reports(world: &mut MarketWorld, status: String, buyer: i64) {
    let txid = world.system().receipt_for(buyer).payment.txid.clone();
    notify(world, txid, status).await;
}

#[when(expr = "the provider reports {string} for transaction {string}")]
async fn provider_reports_txid(world: &mut MarketWorld, status: String, txid: String) {
    notify(world, txid, status).await;
}

#[when(expr = "buyer {int} confirms the mock payment")]
async fn confirm_mock(world: &mut MarketWorld, buyer: i64) {
    let system = world.system_mut();
    let payment_id = system.receipt_for(buyer).payment.id;
    if let Err(e) = system.settlement.confirm_mock(payment_id).await {
        system.last_error = Some(e.to_string());
    }
}

async fn fulfil(world: &mut MarketWorld, actor: FulfillmentActor, buyer: i64, status: String) {
    let system = world.system_mut();
    let order_id = system.order_for(buyer);
    let status = status.parse::<OrderStatusType>().expect("Not a valid order status");
    match system.orders.advance_fulfillment(actor, order_id, status).await {
        Ok(_) => system.last_error = None,
        Err(e) => system.last_error = Some(e.to_string()),
    }
}

#[when(expr = "seller {int} marks the order of buyer {int} as {word}")]
async fn seller_marks(world: &mut MarketWorld, seller: i64, buyer: i64, status: String) {
    fulfil(world, FulfillmentActor::Seller(UserId(seller)), buyer, status).await;
}

#[when(expr = "an admin marks the order of buyer {int} as {word}")]
async fn admin_marks(world: &mut MarketWorld, buyer: i64, status: String) {
    fulfil(world, FulfillmentActor::Admin, buyer, status).await;
}

#[then(expr = "the order of buyer {int} is {word}")]
async fn check_order_status(world: &mut MarketWorld, buyer: i64, status: String) {
    let system = world.system();
    let order = system.db.fetch_order(system.order_for(buyer)).await.expect("Error fetching order").unwrap();
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    assert_eq!(order.status, expected);
}

#[then(expr = "the order of buyer {int} is a {word} order")]
async fn check_order_type(world: &mut MarketWorld, buyer: i64, order_type: String) {
    let system = world.system();
    let order = system.db.fetch_order(system.order_for(buyer)).await.expect("Error fetching order").unwrap();
    let expected = order_type.parse::<OrderType>().expect("Not a valid order type");
    assert_eq!(order.order_type, expected);
}

#[then(expr = "the order of buyer {int} totals {int}")]
async fn check_order_total(world: &mut MarketWorld, buyer: i64, total: i64) {
    let system = world.system();
    let order = system.db.fetch_order(system.order_for(buyer)).await.expect("Error fetching order").unwrap();
    assert_eq!(order.total_price, Money::from(total));
}

#[then(expr = "buyer {int} has {int} order(s)")]
async fn check_order_count(world: &mut MarketWorld, buyer: i64, count: usize) {
    let orders = world.system().accounts.orders_for_buyer(UserId(buyer)).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "{string} has {int} in stock")]
async fn check_stock(world: &mut MarketWorld, name: String, stock: i64) {
    let system = world.system();
    let product = system.db.fetch_product(system.product(&name)).await.expect("Error fetching product").unwrap();
    assert_eq!(product.stock, stock);
}

#[then(expr = "the payment of buyer {int} is {word}")]
async fn check_payment_status(world: &mut MarketWorld, buyer: i64, status: String) {
    let system = world.system();
    let payment_id = system.receipt_for(buyer).payment.id;
    let payment = system.db.fetch_payment(payment_id).await.expect("Error fetching payment").unwrap();
    let expected = status.parse::<PaymentStatus>().expect("Not a valid payment status");
    assert_eq!(payment.status, expected);
}

#[then(expr = "the notification is {word}")]
async fn check_outcome(world: &mut MarketWorld, kind: String) {
    let outcome = world.system().last_outcome.as_ref().expect("No notification has been processed");
    let actual = match outcome {
        SettlementOutcome::Applied { .. } => "applied",
        SettlementOutcome::Duplicate { .. } => "duplicate",
        SettlementOutcome::Rejected { .. } => "rejected",
        SettlementOutcome::UnknownTransaction { .. } => "unknown",
        SettlementOutcome::UnrecognisedStatus { .. } => "ignored",
    };
    assert_eq!(actual, kind, "{}", outcome.describe());
}

#[then(expr = "the request fails with {string}")]
async fn check_error(world: &mut MarketWorld, message: String) {
    let error = world.system().last_error.as_ref().expect("The request did not fail");
    assert!(error.contains(&message), "Expected an error containing '{message}', got '{error}'");
}

#[then("the request succeeds")]
async fn check_success(world: &mut MarketWorld) {
    assert_eq!(world.system().last_error, None);
}
