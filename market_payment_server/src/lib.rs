//! # Marketplace payment server
//! This crate hosts the HTTP server for the marketplace payment gateway. It is responsible for:
//! * Accepting orders from buyers and reserving stock for them.
//! * Opening payment sessions with the hosted payment gateway (or a mock session in development).
//! * Receiving the gateway's payment notifications and settling orders accordingly.
//! * Letting sellers and admins move paid orders through fulfillment.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payments/webhook`: Payment notifications from the gateway.
//! * `/api/orders`, `/api/orders/{order_id}` and `/api/orders/{order_id}/status`: Order placement, queries and
//!   fulfillment.
//! * `/api/payments`, `/api/payments/orders/{order_id}` and `/api/payments/mock-success`: Payment creation, queries
//!   and mock confirmation.
//!
//! Everything under `/api` requires the caller identity headers described in [auth].

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
