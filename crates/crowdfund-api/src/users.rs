use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
};
use tracing::{error, info, warn};

use crowdfund_db::models::UserRow;
use crowdfund_types::api::{
    CheckEmailRequest, EmailAvailability, LoginRequest, RegisterUserRequest, UploadResult, UserResponse,
};

use crate::envelope::{ApiJson, fail, ok, respond};
use crate::error::{ApiError, OrEnvelope, ServiceError};
use crate::middleware::CurrentUser;
use crate::service::{blocking, users};
use crate::state::AppState;
use crate::upload::read_upload;

fn user_response(user: &UserRow, token: String) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name.clone(),
        occupation: user.occupation.clone(),
        email: user.email.clone(),
        token,
        image_url: user.avatar_file_name.clone().unwrap_or_default(),
    }
}

fn issue_token(state: &AppState, user: &UserRow, message: &'static str) -> Result<String, ApiError> {
    state.tokens.issue(user.id).map_err(|e| {
        error!("Token issue for user {} failed: {}", user.id, e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    })
}

/// POST /api/v1/users
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterUserRequest>,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let registration = users::Registration {
        name: req.name,
        occupation: req.occupation,
        email: req.email,
        password: req.password,
    };
    let user = blocking(move || users::register(&db, &registration))
        .await
        .or_envelope("Register account failed")?;
    let token = issue_token(&state, &user, "Register account failed")?;

    Ok(respond(
        StatusCode::CREATED,
        "Account has been registered",
        user_response(&user, token),
    ))
}

/// POST /api/v1/sessions
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let user = blocking(move || users::login(&db, &req.email, &req.password))
        .await
        .or_envelope("Login failed")?;
    let token = issue_token(&state, &user, "Login failed")?;

    info!("User {} logged in", user.id);
    Ok(ok("Successfully logged in", user_response(&user, token)))
}

/// POST /api/v1/email_checkers
pub async fn check_email(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CheckEmailRequest>,
) -> Result<Response, ApiError> {
    if req.email.trim().is_empty() {
        return Err(ApiError::validation(
            "Email checking failed",
            vec!["email is required".to_string()],
        ));
    }

    let db = state.db.clone();
    let is_available = blocking(move || users::is_email_available(&db, &req.email))
        .await
        .or_envelope("Email checking failed")?;

    let message = if is_available {
        "Email is available"
    } else {
        "Email has been registered"
    };
    Ok(ok(message, EmailAvailability { is_available }))
}

/// POST /api/v1/avatars. Multipart field `avatar`.
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    const FAILED: &str = "Failed to upload avatar image";

    let upload = match read_upload(multipart, "avatar").await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("Unreadable avatar upload from user {}: {}", user.id, e);
            return Ok(fail(StatusCode::BAD_REQUEST, FAILED, UploadResult { is_uploaded: false }));
        }
    };
    let Some(file) = upload.file else {
        return Err(ApiError::validation(FAILED, vec!["avatar is required".to_string()]));
    };

    let path = state
        .storage
        .save(user.id, &file.file_name, &file.bytes)
        .await
        .map_err(ServiceError::Internal)
        .or_envelope(FAILED)?;

    let db = state.db.clone();
    let user_id = user.id;
    blocking(move || users::save_avatar(&db, user_id, &path))
        .await
        .or_envelope(FAILED)?;

    info!("User {} uploaded a new avatar", user_id);
    Ok(ok("Avatar successfully uploaded", UploadResult { is_uploaded: true }))
}

/// GET /api/v1/users/fetch
pub async fn fetch(CurrentUser(user): CurrentUser) -> Response {
    ok("Successfully fetched user data", user_response(&user, String::new()))
}
