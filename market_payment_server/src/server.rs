use std::time::Duration;

use actix_web::{dev::Server, error::JsonPayloadError, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use market_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    provider::PaymentProvider,
    AccountApi,
    OrderFlowApi,
    PaymentApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::gateway::{ConfiguredProvider, NotificationVerifier},
    routes::{
        health,
        CreatePaymentRoute,
        MockPaymentSuccessRoute,
        MyOrdersRoute,
        MyPaymentsRoute,
        OrderByIdRoute,
        PaymentForOrderRoute,
        PaymentWebhookRoute,
        PlaceOrderRoute,
        UpdateOrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(&config.database_url, config.max_connections, config.lock_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    let handlers = EventHandlers::new(config.event_buffer_size, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that record order lifecycle events in the log. Notifications to buyers and sellers hang off these events.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_placed(|ev| {
            async move {
                let order = ev.order;
                info!("📬️ Order #{} placed by buyer {}. Total: {}", order.id, order.buyer_id, order.total_price);
            }
            .boxed()
        })
        .on_order_paid(|ev| {
            async move {
                info!("📬️ Order #{} has been paid. Transaction {}", ev.order.id, ev.payment.txid);
            }
            .boxed()
        })
        .on_order_cancelled(|ev| {
            async move {
                let (order, payment) = (ev.order, ev.payment);
                info!("📬️ Order #{} was cancelled. Payment {} is {}", order.id, payment.txid, payment.status);
            }
            .boxed()
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let provider = ConfiguredProvider::from_config(&config.gateway)?;
    let mode = provider.mode();
    let verifier = NotificationVerifier::new(&config.gateway, mode);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let payments_api = PaymentApi::new(db.clone(), provider.clone());
        let settlement_api = SettlementApi::new(db.clone(), producers.clone(), mode);
        let accounts_api = AccountApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mpg::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(verifier.clone()));
        // Routes that act on behalf of an identified caller
        let api_scope = web::scope("/api")
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(MockPaymentSuccessRoute::<SqliteDatabase>::new())
            .service(PaymentForOrderRoute::<SqliteDatabase>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, ConfiguredProvider>::new())
            .service(MyPaymentsRoute::<SqliteDatabase>::new());
        // The gateway posts notifications without caller identity
        app.service(health).service(PaymentWebhookRoute::<SqliteDatabase>::new()).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

pub fn json_error_handler(err: JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting malformed request body. {err}");
    ServerError::InvalidRequestBody(err.to_string()).into()
}
