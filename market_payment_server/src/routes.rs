//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database or gateway call in this module is awaited, so
//! placement requests that are waiting on a stock lock do not hold up other requests on the same worker.
use actix_web::{get, web, HttpResponse, Responder};
use gateway_tools::GatewayNotification;
use log::*;
use market_payment_engine::{
    db_types::{NewOrder, OrderId},
    provider::PaymentProvider,
    traits::{AccountManagement, MarketplaceDatabase},
    AccountApi,
    OrderFlowApi,
    PaymentApi,
    SettlementApi,
};

use crate::{
    auth::{Identity, Role},
    data_objects::{
        CreatePaymentRequest,
        JsonResponse,
        MockPaymentConfirmation,
        OrderStatusUpdate,
        PaymentCreatedResponse,
        PlaceOrderRequest,
    },
    errors::{AuthError, ServerError},
    integrations::gateway::NotificationVerifier,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(place_order => Post "/orders" impl MarketplaceDatabase);
/// Route handler for placing an order.
///
/// The caller (taken from the identity headers) is the buyer. The body lists the cart as `product_id`/`quantity` pairs
/// and may name one of the buyer's delivery addresses. On success the new order, with its line items and the unit
/// prices captured at placement, is returned with `201 Created`.
///
/// Requests that fail because stock ran out return `409 Conflict` and leave every product untouched.
pub async fn place_order<B: MarketplaceDatabase>(
    identity: Identity,
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let PlaceOrderRequest { items, address_id } = body.into_inner();
    debug!("💻️ POST place_order for buyer {} with {} line(s)", identity.user_id, items.len());
    let mut order = NewOrder::new(identity.user_id, items);
    if let Some(address_id) = address_id {
        order = order.with_address(address_id);
    }
    let order = api.place_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl AccountManagement);
/// Route handler for the orders endpoint
///
/// Buyers fetch their own orders, newest first, each with its line items.
pub async fn my_orders<B: AccountManagement>(
    identity: Identity,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", identity.user_id);
    let orders = api.orders_for_buyer(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl AccountManagement);
/// Fetch one of the caller's own orders. Orders belonging to someone else return `403 Forbidden`.
pub async fn order_by_id<B: AccountManagement>(
    identity: Identity,
    path: web::Path<OrderId>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for {}", identity.user_id);
    let order = api.order_for_buyer(identity.user_id, order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Post "/orders/{order_id}/status" impl MarketplaceDatabase where requires [Role::Seller, Role::Admin]);
/// Route handler for fulfillment updates.
///
/// Sellers (for orders containing their products) and admins can move a paid order to `shipped`, and a shipped order
/// to `completed`. Payment-driven statuses (`paid`, `cancelled`) cannot be set here.
pub async fn update_order_status<B: MarketplaceDatabase>(
    identity: Identity,
    path: web::Path<OrderId>,
    body: web::Json<OrderStatusUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    info!("💻️ POST update_order_status. {} {} wants order #{order_id} to be {status}", identity.role, identity.user_id);
    let actor = identity.fulfillment_actor().ok_or_else(|| {
        ServerError::from(AuthError::InsufficientPermissions("Buyers cannot fulfil orders".to_string()))
    })?;
    let order = api.advance_fulfillment(actor, order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(create_payment => Post "/payments" impl MarketplaceDatabase, PaymentProvider);
/// Route handler for opening a payment.
///
/// The buyer supplies the order, a delivery address and the amount, which must equal the order total. The response
/// carries the session token and the redirect URL for the hosted checkout. If the server is running in mock mode, the
/// session is simulated and `mode` is `mock`.
///
/// Gateway failures return `502 Bad Gateway` with the gateway's message.
pub async fn create_payment<B, P>(
    identity: Identity,
    body: web::Json<CreatePaymentRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase,
    P: PaymentProvider,
{
    let CreatePaymentRequest { order_id, address_id, amount } = body.into_inner();
    debug!("💻️ POST create_payment for order #{order_id} by {}", identity.user_id);
    let receipt = api.create_payment(identity.user_id, order_id, address_id, amount).await?;
    Ok(HttpResponse::Created().json(PaymentCreatedResponse::from(receipt)))
}

route!(my_payments => Get "/payments" impl AccountManagement);
pub async fn my_payments<B: AccountManagement>(
    identity: Identity,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_payments for {}", identity.user_id);
    let payments = api.payments_for_buyer(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(payment_for_order => Get "/payments/orders/{order_id}" impl AccountManagement);
/// The most recent payment attempt for one of the caller's orders.
pub async fn payment_for_order<B: AccountManagement>(
    identity: Identity,
    path: web::Path<OrderId>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET payment for order #{order_id} for {}", identity.user_id);
    let payment = api.payment_for_order(identity.user_id, order_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(mock_payment_success => Post "/payments/mock-success" impl MarketplaceDatabase);
/// Development helper that settles a mock payment as if the gateway had reported `settlement`.
///
/// Returns `403 Forbidden` when the server is taking real payments.
pub async fn mock_payment_success<B: MarketplaceDatabase>(
    identity: Identity,
    body: web::Json<MockPaymentConfirmation>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = body.into_inner().payment_id;
    info!("💻️ POST mock_payment_success for payment #{payment_id} by {}", identity.user_id);
    let payment = api.confirm_mock(payment_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

//----------------------------------------------   Webhook  ----------------------------------------------------

route!(payment_webhook => Post "/payments/webhook" impl MarketplaceDatabase);
/// Route handler for payment gateway notifications.
///
/// The gateway redelivers any notification that is not answered with a 2xx status. So every notification that has
/// been dealt with, including duplicates, late arrivals for settled payments, unknown transactions and statuses we
/// do not act on, is answered with `200 OK`. Only transient failures (e.g. a lock timeout) produce a 5xx, so that the
/// gateway tries again later.
///
/// In live mode the notification signature is checked first, and forged notifications are refused with `403`.
pub async fn payment_webhook<B: MarketplaceDatabase>(
    body: web::Json<GatewayNotification>,
    api: web::Data<SettlementApi<B>>,
    verifier: web::Data<NotificationVerifier>,
) -> Result<HttpResponse, ServerError> {
    let notification = body.into_inner();
    trace!("💻️ Received payment notification: {notification:?}");
    verifier.check(&notification)?;
    let outcome = api.settle(&notification.order_id, &notification.transaction_status).await?;
    info!("💻️ Payment notification processed. {}", outcome.describe());
    Ok(HttpResponse::Ok().json(JsonResponse::success(outcome.describe())))
}
