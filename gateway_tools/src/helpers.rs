use std::fmt::Write;

use mpg_common::Money;
use sha2::{Digest, Sha512};

use crate::GatewayApiError;

/// The gateway expects gross amounts in whole currency units.
pub fn gross_amount(amount: Money) -> Result<i64, GatewayApiError> {
    amount
        .whole_major_units()
        .ok_or_else(|| GatewayApiError::InvalidCurrencyAmount(format!("{amount} has a fractional part")))
}

/// `SHA512(order_id + status_code + gross_amount + server_key)`, hex encoded.
pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hasher.finalize().iter().fold(String::with_capacity(128), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
