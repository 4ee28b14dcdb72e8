use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Failure talking to the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),
}

/// Reasons a coupon code is rejected.
#[derive(Error, Debug)]
pub enum CouponError {
    #[error("coupon code is not valid")]
    InvalidCode,

    #[error("coupon is not valid for this flight package")]
    PackageMismatch,

    #[error("coupon has expired")]
    Expired,

    #[error("coupon usage limit has been reached")]
    UsageExhausted,

    #[error("coupon lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

impl CouponError {
    /// Stable identifier returned to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            CouponError::InvalidCode => "invalid_code",
            CouponError::PackageMismatch => "package_mismatch",
            CouponError::Expired => "expired",
            CouponError::UsageExhausted => "usage_exhausted",
            CouponError::Lookup(_) => "lookup_failed",
        }
    }

    /// Whether the coupon itself was rejected, as opposed to the lookup failing.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, CouponError::Lookup(_))
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation",
            ApiError::Coupon(err) => err.kind(),
            ApiError::Store(_) | ApiError::Blocking(_) => "internal",
        }
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        ApiError::Store(err.into())
    }
}

impl From<diesel::r2d2::PoolError> for ApiError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        ApiError::Store(err.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Coupon(err) if err.is_rejection() => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("request failed: {self}");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}
