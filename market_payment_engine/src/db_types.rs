use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
pub use mpg_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Type conversion error: {0}")]
pub struct ConversionError(pub String);

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| ConversionError(format!("Invalid {}: {s}. {e}", stringify!($name))))
            }
        }

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }
    };
}

id_type!(
    /// A marketplace user. Buyers and sellers share the same id space, issued by the upstream identity provider.
    UserId
);
id_type!(ProductId);
id_type!(OrderId);
id_type!(OrderItemId);
id_type!(PaymentId);
id_type!(AddressId);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been placed and stock reserved, but no payment has settled.
    Pending,
    /// Payment for the order has settled successfully.
    Paid,
    /// The seller has dispatched the order.
    Shipped,
    /// The buyer has received the order.
    Completed,
    /// Payment failed, was denied, or expired.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Shipped => write!(f, "shipped"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------     OrderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Regular,
    /// At least one product in the order is sold ahead of harvest/production.
    Preorder,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Regular => write!(f, "regular"),
            OrderType::Preorder => write!(f, "preorder"),
        }
    }
}

impl FromStr for OrderType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Self::Regular),
            "preorder" | "pre-order" => Ok(Self::Preorder),
            s => Err(ConversionError(format!("Invalid order type: {s}"))),
        }
    }
}

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Success => write!(f, "success"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------    SessionMode      ---------------------------------------------------------
/// Whether payment sessions are opened against the real payment provider, or are simulated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Live,
    Mock,
}

impl Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Live => write!(f, "live"),
            SessionMode::Mock => write!(f, "mock"),
        }
    }
}

//--------------------------------------        Product       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub is_pre_order: bool,
    pub is_subscription: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: UserId,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub is_pre_order: bool,
    pub is_subscription: bool,
}

impl NewProduct {
    pub fn new<S: Into<String>>(seller_id: UserId, name: S, price: Money, stock: i64) -> Self {
        Self { seller_id, name: name.into(), price, stock, is_pre_order: false, is_subscription: false }
    }

    pub fn pre_order(mut self) -> Self {
        self.is_pre_order = true;
        self
    }
}

//--------------------------------------       OrderItem      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// The unit price at the time the order was placed.
    pub price: Money,
}

impl OrderItem {
    pub fn subtotal(&self) -> Money {
        self.price * self.quantity
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub total_price: Money,
    pub status: OrderStatusType,
    pub order_type: OrderType,
    pub address_id: Option<AddressId>,
    pub payment_id: Option<PaymentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

//--------------------------------------      CartItem       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl CartItem {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub buyer_id: UserId,
    /// Optional delivery address. It can also be supplied later, when the payment is created.
    pub address_id: Option<AddressId>,
    /// The cart lines, in the order the buyer submitted them.
    pub items: Vec<CartItem>,
}

impl NewOrder {
    pub fn new(buyer_id: UserId, items: Vec<CartItem>) -> Self {
        Self { buyer_id, address_id: None, items }
    }

    pub fn with_address(mut self, address_id: AddressId) -> Self {
        self.address_id = Some(address_id);
        self
    }
}

//--------------------------------------        Payment       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub amount: Money,
    pub status: PaymentStatus,
    /// The unique, locally generated transaction id that the payment provider echoes back in its notifications.
    pub txid: String,
    pub session_token: Option<String>,
    pub session_url: Option<String>,
    pub session_mode: Option<SessionMode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub amount: Money,
    pub txid: String,
}

impl NewPayment {
    /// Creates a new payment record with a fresh transaction id of the form `ORD-<order>-<unix time>-<nonce>`.
    pub fn new(order_id: OrderId, buyer_id: UserId, amount: Money) -> Self {
        let txid = format!("ORD-{:03}-{}-{:04x}", order_id.value(), Utc::now().timestamp(), rand::random::<u16>());
        Self { order_id, buyer_id, amount, txid }
    }
}

//--------------------------------------    PaymentSession    ---------------------------------------------------------
/// A payable session handed out by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub token: String,
    pub redirect_url: String,
    pub mode: SessionMode,
}

//--------------------------------------        Address       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub recipient_name: String,
    pub phone_number: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: UserId,
    pub recipient_name: String,
    pub phone_number: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

impl NewAddress {
    pub fn new<S: Into<String>>(user_id: UserId, recipient_name: S, phone_number: S) -> Self {
        Self {
            user_id,
            recipient_name: recipient_name.into(),
            phone_number: phone_number.into(),
            street: String::new(),
            city: String::new(),
            province: String::new(),
            postal_code: String::new(),
        }
    }

    pub fn with_street<S: Into<String>>(mut self, street: S, city: S, province: S, postal_code: S) -> Self {
        self.street = street.into();
        self.city = city.into();
        self.province = province.into();
        self.postal_code = postal_code.into();
        self
    }
}
