//! JSON envelopes and error-to-status mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::{AdminError, ErrorKind};

/// Success envelope: `{"status":"success","message"?,"data":...}`
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    data: T,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Build a success response with the given status code
pub fn success<T: Serialize>(status: StatusCode, body: ApiSuccess<T>) -> Response {
    (status, Json(body)).into_response()
}

/// Error envelope body
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    status: &'static str,
    error: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// An [`AdminError`] on its way to the client
///
/// With `debug` off, database and configuration failures are reported with
/// a generic message; the full error is only logged.
#[derive(Debug)]
pub struct ApiError {
    pub error: AdminError,
    pub debug: bool,
}

impl ApiError {
    pub fn new(error: AdminError, debug: bool) -> Self {
        Self { error, debug }
    }

    /// 400 response for a request body that could not be decoded
    pub fn bad_request(message: impl Into<String>, debug: bool) -> Self {
        Self::new(AdminError::validation(message), debug)
    }

    pub fn status_code(&self) -> StatusCode {
        status_for(self.error.kind())
    }

    pub fn body(&self) -> ApiErrorBody {
        let kind = self.error.kind();

        let mut body = ApiErrorBody {
            status: "error",
            error: kind,
            message: self.error.to_string(),
            errors: None,
            sql: None,
            detail: None,
        };

        match &self.error {
            AdminError::Validation { errors } => {
                body.errors = Some(errors.clone());
            }
            AdminError::Database { message, sql, .. } => {
                if self.debug {
                    body.sql = sql.clone();
                    body.detail = Some(message.clone());
                } else {
                    body.message = "A database error occurred".to_string();
                }
            }
            AdminError::Configuration(message) => {
                if self.debug {
                    body.detail = Some(message.clone());
                } else {
                    body.message = "The server is misconfigured".to_string();
                }
            }
            AdminError::NotFound(_) | AdminError::Conflict(_) => {}
        }

        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Database | ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
