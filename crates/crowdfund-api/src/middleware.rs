use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::{debug, error};

use crowdfund_db::models::UserRow;

use crate::error::{ApiError, ServiceError};
use crate::service::{blocking, users};
use crate::state::AppState;
use crate::web;

const ALLOW_HEADERS: &str = "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, \
     Authorization, accept, origin, Cache-Control, X-Requested-With";
const ALLOW_METHODS: &str = "POST, HEAD, PATCH, OPTIONS, GET, PUT";

/// Permissive CORS on every response. Preflight requests are answered with
/// 204 before routing, so no gate or handler ever sees an `OPTIONS` request.
pub async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
}

/// The authenticated API user, attached by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

/// Pull the token out of an `Authorization` value. The value must mention
/// `Bearer` and consist of exactly two whitespace separated parts.
pub fn bearer_token(value: &str) -> Option<&str> {
    if !value.contains("Bearer") {
        return None;
    }
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(token), None) => Some(token),
        _ => None,
    }
}

/// Bearer token gate for the JSON API.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| {
            debug!("Missing or malformed Authorization header");
            ApiError::unauthorized()
        })?;

    let claims = state.tokens.validate(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized()
    })?;

    let user_id = claims.user_id;
    let db = state.db.clone();
    let user = blocking(move || users::get(&db, user_id))
        .await
        .map_err(|e| match e {
            ServiceError::Internal(err) => {
                error!("User lookup failed during auth: {:#}", err);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Unauthorized")
            }
            _ => {
                debug!("Token names unknown user {}", user_id);
                ApiError::unauthorized()
            }
        })?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Session gate for the admin pages. Trusts the stored session record and
/// does not look the user up again.
pub async fn require_admin_session(session: Session, mut req: Request, next: Next) -> Response {
    match web::session::current(&session).await {
        Some(admin) => {
            req.extensions_mut().insert(admin);
            next.run(req).await
        }
        None => web::found("/login"),
    }
}
