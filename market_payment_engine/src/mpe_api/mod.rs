//! # Marketplace payment engine public API
//!
//! The `mpe_api` module exposes the programmatic API for the marketplace payment engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] places orders against shared inventory and drives fulfillment.
//! * [`payment_api`] opens payment attempts for placed orders and obtains sessions from the payment provider.
//! * [`settlement_api`] applies provider notifications (and mock confirmations) to payments and orders.
//! * [`accounts_api`] gives buyers read access to their own orders and payments.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs,
//! plus whatever collaborators it uses (event producers, a payment provider).
//!
//! ```rust,ignore
//! use market_payment_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.place_order(new_order).await?;
//! ```
pub mod accounts_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_api;
pub mod payment_objects;
pub mod settlement_api;
