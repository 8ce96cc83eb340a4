//! Server-rendered admin interface. Pages are composed by [`templates`] and
//! gated by the signed cookie session in [`session`].

pub mod campaigns;
pub mod session;
pub mod session_store;
pub mod templates;
pub mod transactions;
pub mod users;

use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::ServiceError;
use crate::state::AppState;

pub const ERROR_PAGE: &str = "error.html";

/// Plain 302 redirect, the status browsers and the admin forms expect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Render a composed page, falling back to the error page.
pub fn page<C: Serialize>(state: &AppState, name: &str, ctx: C) -> Response {
    match state.templates.render(name, ctx) {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            error!("Failed to render {}: {:#}", name, e);
            error_page(state, StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
        }
    }
}

#[derive(Serialize)]
struct ErrorContext<'a> {
    message: &'a str,
}

pub fn error_page(state: &AppState, status: StatusCode, message: &str) -> Response {
    match state.templates.render(ERROR_PAGE, ErrorContext { message }) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            error!("Failed to render error page: {:#}", e);
            (status, message.to_string()).into_response()
        }
    }
}

/// Turns a service failure into the error page. Validation failures are
/// re-rendered by the form handlers themselves and only land here when a
/// handler has no form to show.
pub trait OrPage<T> {
    fn or_page(self, state: &AppState) -> Result<T, Response>;
}

impl<T> OrPage<T> for Result<T, ServiceError> {
    fn or_page(self, state: &AppState) -> Result<T, Response> {
        self.map_err(|e| match e {
            ServiceError::NotFound => error_page(state, StatusCode::NOT_FOUND, "Not found"),
            ServiceError::Validation(errors) => {
                warn!("Admin request rejected: {}", errors.join(", "));
                error_page(state, StatusCode::UNPROCESSABLE_ENTITY, &errors.join(", "))
            }
            ServiceError::NotOwner => error_page(state, StatusCode::FORBIDDEN, "Forbidden"),
            ServiceError::Internal(err) => {
                error!("Admin request failed: {:#}", err);
                error_page(state, StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        })
    }
}

/// Public URL of a stored file, empty when there is none.
pub fn image_url(path: Option<&str>) -> String {
    path.map(|p| format!("/{}", p)).unwrap_or_default()
}
