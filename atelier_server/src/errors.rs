use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use atelier_engine::MarketError;
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
    #[error("{0}")]
    Market(#[from] MarketError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentity | AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
                AuthError::Unverified(_) => StatusCode::FORBIDDEN,
            },
            Self::Market(e) => market_status(e),
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

fn market_status(e: &MarketError) -> StatusCode {
    match e {
        MarketError::InvalidTransition { .. } | MarketError::NotReviewable(_) | MarketError::Conflict(_) => {
            StatusCode::CONFLICT
        },
        MarketError::Forbidden(_) | MarketError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        MarketError::MissingField(_) | MarketError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        MarketError::NotFound(_) => StatusCode::NOT_FOUND,
        MarketError::Unavailable(_) | MarketError::AggregationFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
        MarketError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No identity was supplied with the request.")]
    MissingIdentity,
    #[error("The identity signature is invalid or missing.")]
    InvalidSignature,
    #[error("{0} has not verified their email address yet.")]
    Unverified(String),
}
