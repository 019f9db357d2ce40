use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use market_payment_engine::MarketplaceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The payment notification signature is invalid.")]
    InvalidNotificationSignature,
    #[error("{0}")]
    Marketplace(#[from] MarketplaceError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentity(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidIdentity(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InvalidNotificationSignature => StatusCode::FORBIDDEN,
            Self::Marketplace(e) => marketplace_status_code(e),
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

fn marketplace_status_code(e: &MarketplaceError) -> StatusCode {
    use MarketplaceError::*;
    match e {
        EmptyCart | InvalidQuantity { .. } | AddressRequired | AmountMismatch { .. } => StatusCode::BAD_REQUEST,
        Unauthorized | MockModeDisabled => StatusCode::FORBIDDEN,
        ProductNotFound(_) | OrderNotFound(_) | PaymentNotFound(_) => StatusCode::NOT_FOUND,
        InsufficientStock { .. } |
        OrderNotPayable { .. } |
        OrderTransitionForbidden { .. } |
        OrderTransitionNoOp { .. } |
        PaymentTransitionForbidden { .. } |
        SessionAlreadyAttached(_) |
        PaymentSuperseded(_) => StatusCode::CONFLICT,
        ProviderError(_) => StatusCode::BAD_GATEWAY,
        LockTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No identity was supplied. {0}")]
    MissingIdentity(String),
    #[error("The supplied identity is not valid. {0}")]
    InvalidIdentity(String),
    #[error("Insufficient permissions. {0}")]
    InsufficientPermissions(String),
}
