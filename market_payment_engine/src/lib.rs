//! Marketplace Payment Engine
//!
//! The marketplace payment engine places orders against the shared, per-seller inventory of a multi-seller
//! marketplace, and settles payments for those orders.
//!
//! It guarantees that:
//! * no two concurrent orders oversell the same stock unit;
//! * every placed order has at most one payment attempt that can still settle;
//! * asynchronous payment provider notifications converge each order to a terminal state exactly once, even when
//!   they are duplicated or arrive out of order.
//!
//! The library is divided into these main sections:
//! 1. Database management and control. SQLite is the supported backend ([`SqliteDatabase`]). You should never need
//!    to access the database directly; use the public API instead. The data types used in the database are defined in
//!    the [`db_types`] module and are public.
//! 2. The public API ([`mod@mpe_api`]): [`OrderFlowApi`], [`PaymentApi`], [`SettlementApi`] and [`AccountApi`].
//!    Backends need to implement the traits in [`traits`] to act as a backend for the marketplace payment server.
//! 3. The order and payment lifecycle rules ([`state_machine`]).
//! 4. Payment providers ([`provider`]), which open payable sessions.
//!
//! The engine also emits events when orders are placed, paid or cancelled. A simple actor framework in [`events`]
//! lets you hook into these events and run custom actions on detached tasks.
mod sqlite;

pub mod db_types;
pub mod events;
mod mpe_api;
pub mod provider;
pub mod state_machine;
pub mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use mpe_api::{
    accounts_api::AccountApi,
    order_flow_api::{validate_cart, OrderFlowApi},
    order_objects,
    payment_api::PaymentApi,
    payment_objects,
    settlement_api::SettlementApi,
};
pub use sqlite::{db::DEFAULT_LOCK_TIMEOUT, SqliteDatabase};
pub use traits::{AccountApiError, AccountManagement, MarketplaceDatabase, MarketplaceError, SettlementResult};
