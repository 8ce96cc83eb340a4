use std::borrow::Cow;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crowdfund_types::api::{Envelope, ValidationErrors};

/// Failures raised by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("not found")]
    NotFound,

    #[error("not the owner of this campaign")]
    NotOwner,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }
}

/// An API failure, written to the client as the error envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: Cow<'static, str>,
    errors: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn validation(message: impl Into<Cow<'static, str>>, errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
            errors: Some(errors),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status.as_u16();
        match self.errors {
            Some(errors) => (
                self.status,
                Json(Envelope::error(self.message, code, ValidationErrors { errors })),
            )
                .into_response(),
            None => (self.status, Json(Envelope::error(self.message, code, ()))).into_response(),
        }
    }
}

/// Wraps a service result into the error envelope at the handler boundary.
/// The client only ever sees `message`; internal detail goes to the log.
pub trait OrEnvelope<T> {
    fn or_envelope(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> OrEnvelope<T> for Result<T, ServiceError> {
    fn or_envelope(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| match e {
            ServiceError::Validation(errors) => ApiError::validation(message, errors),
            ServiceError::NotFound => ApiError::new(StatusCode::NOT_FOUND, message),
            ServiceError::NotOwner => {
                warn!("{}: ownership check failed", message);
                ApiError::new(StatusCode::FORBIDDEN, message)
            }
            ServiceError::Internal(err) => {
                error!("{}: {:#}", message, err);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        })
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("Invalid request body", vec![rejection.body_text()])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid path parameter".into(),
            errors: Some(vec![rejection.body_text()]),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid query string".into(),
            errors: Some(vec![rejection.body_text()]),
        }
    }
}
