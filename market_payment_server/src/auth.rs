//! Caller identity.
//!
//! Authentication itself happens upstream of this server. The authentication layer forwards the caller's user id and
//! role in the `mpg_user_id` and `mpg_user_role` headers, and [`Identity`] extracts them for route handlers. Requests
//! that reach an identity-aware route without these headers are rejected with `401 Unauthorized`.
use std::{fmt::Display, str::FromStr};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::*;
use market_payment_engine::{db_types::UserId, order_objects::FulfillmentActor};
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, ServerError};

pub const USER_ID_HEADER: &str = "mpg_user_id";
pub const USER_ROLE_HEADER: &str = "mpg_user_role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Seller => write!(f, "seller"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" | "user" => Ok(Role::Buyer),
            "seller" | "farmer" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::InvalidIdentity(format!("Unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AuthError::MissingIdentity(format!("The {USER_ID_HEADER} header is required")))?
            .to_str()
            .map_err(|e| AuthError::InvalidIdentity(e.to_string()))?
            .trim()
            .parse::<UserId>()
            .map_err(|e| AuthError::InvalidIdentity(e.to_string()))?;
        let role = headers
            .get(USER_ROLE_HEADER)
            .ok_or_else(|| AuthError::MissingIdentity(format!("The {USER_ROLE_HEADER} header is required")))?
            .to_str()
            .map_err(|e| AuthError::InvalidIdentity(e.to_string()))?
            .parse::<Role>()?;
        Ok(Self { user_id, role })
    }

    /// The capacity in which this caller may move orders through fulfillment, if any.
    pub fn fulfillment_actor(&self) -> Option<FulfillmentActor> {
        match self.role {
            Role::Admin => Some(FulfillmentActor::Admin),
            Role::Seller => Some(FulfillmentActor::Seller(self.user_id)),
            Role::Buyer => None,
        }
    }
}

impl FromRequest for Identity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = Identity::from_headers(req.headers()).map_err(|e| {
            debug!("💻️ Rejecting request to {}. {e}", req.path());
            ServerError::from(e)
        });
        ready(result)
    }
}
