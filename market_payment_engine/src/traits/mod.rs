//! #  Backend contracts
//!
//! This module defines the behaviour that a database backend needs to expose in order to be used by the marketplace
//! payment engine.
//!
//! * [`MarketplaceDatabase`] covers every state-changing operation: placing orders against locked inventory,
//!   opening payments, attaching provider sessions, settlement and fulfillment. Each method is a single atomic unit.
//! * [`AccountManagement`] provides read-only queries for products, orders, payments and addresses.
mod account_management;
mod marketplace_database;

mod data_objects;

pub use account_management::{AccountApiError, AccountManagement};
pub use data_objects::SettlementResult;
pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
