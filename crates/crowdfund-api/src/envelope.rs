//! Success envelopes and extractors whose rejections are envelopes too.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crowdfund_types::api::Envelope;

use crate::error::ApiError;

pub fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (status, Json(Envelope::success(message, status.as_u16(), data))).into_response()
}

pub fn ok<T: Serialize>(message: &str, data: T) -> Response {
    respond(StatusCode::OK, message, data)
}

/// Error envelope that still carries a payload, such as `{ is_uploaded: false }`.
pub fn fail<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (status, Json(Envelope::error(message, status.as_u16(), data))).into_response()
}

/// `Json` whose rejection is a validation envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejection is an error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` whose rejection is an error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
