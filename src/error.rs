//! API errors and their JSON rendering.
//!
//! Every failure leaves the service as `{"error": "<message>"}` with a status
//! matching its kind. Rocket's own HTML error pages are replaced by the
//! catchers at the bottom of this module.

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed, missing or extraneous input (400).
    #[error("{0}")]
    Validation(String),

    /// No todo with the requested id (404).
    #[error("Todo not found")]
    NotFound,

    /// Persistence failure during a write (500). The transaction has already
    /// been rolled back when this is produced.
    #[error("{0}")]
    Store(String),

    /// Request body above the configured size limit (413).
    #[error("Request body is too large")]
    PayloadTooLarge,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::NotFound => Status::NotFound,
            ApiError::Store(_) => Status::InternalServerError,
            ApiError::PayloadTooLarge => Status::PayloadTooLarge,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn new(msg: impl Into<String>) -> Json<Self> {
        Json(ErrorBody { error: msg.into() })
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        (status, ErrorBody::new(self.to_string())).respond_to(req)
    }
}

#[catch(404)]
pub fn not_found() -> Json<ErrorBody> {
    ErrorBody::new("Not found")
}

#[catch(422)]
pub fn unprocessable() -> Json<ErrorBody> {
    ErrorBody::new("Unprocessable request")
}

#[catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    ErrorBody::new("Internal server error")
}

#[catch(default)]
pub fn default_catcher(status: Status, _req: &Request<'_>) -> (Status, Json<ErrorBody>) {
    (status, ErrorBody::new(status.reason_lossy()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ApiError::validation("Title is required"), Status::BadRequest)]
    #[case(ApiError::NotFound, Status::NotFound)]
    #[case(ApiError::Store("disk I/O error".into()), Status::InternalServerError)]
    #[case(ApiError::PayloadTooLarge, Status::PayloadTooLarge)]
    fn maps_each_kind_to_its_status(#[case] err: ApiError, #[case] expected: Status) {
        assert_eq!(err.status(), expected);
    }

    #[test]
    fn messages_are_passed_through_verbatim() {
        assert_eq!(ApiError::NotFound.to_string(), "Todo not found");
        assert_eq!(
            ApiError::Store("Database error: locked".into()).to_string(),
            "Database error: locked"
        );
        assert_eq!(
            ApiError::validation("Request body is missing").to_string(),
            "Request body is missing"
        );
    }
}
