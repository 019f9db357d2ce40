//! Client-side tooling for the hosted payment gateway.
//!
//! The gateway is a "snap" style hosted checkout: the merchant creates a transaction and receives a session token
//! plus a redirect URL for the buyer. Settlement results arrive later as HTTP notifications, which are described by
//! [`GatewayNotification`] and authenticated with [`GatewayNotification::verify_signature`].
mod api;
mod config;
mod error;
mod helpers;

mod data_objects;

pub use api::GatewayApi;
pub use config::{is_placeholder_key, GatewayConfig, DEFAULT_GATEWAY_BASE_URL};
pub use data_objects::{
    CustomerDetails,
    GatewayNotification,
    ItemDetail,
    SnapSession,
    SnapTransactionRequest,
    TransactionDetails,
};
pub use error::GatewayApiError;
pub use helpers::{gross_amount, notification_signature};
