use axum::{
    Form,
    extract::State,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tracing::{error, info, warn};

use crowdfund_types::models::Role;

use super::session_store::SqliteStore;
use super::{OrPage, found, page};
use crate::error::ServiceError;
use crate::service::{blocking, users};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "crowdfund_session";
const ADMIN_KEY: &str = "admin";

/// Identity of the logged in admin, kept in the server side session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    #[serde(rename = "userID")]
    pub user_id: i64,
    #[serde(rename = "userName")]
    pub user_name: String,
}

/// Cookie signing key and idle timeout of admin sessions.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub idle_timeout: time::Duration,
}

/// The session layer for the admin pages: records live in `store`, the
/// browser only holds the signed session id.
pub fn layer(store: SqliteStore, settings: &SessionSettings) -> SessionManagerLayer<SqliteStore, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_path("/")
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(settings.idle_timeout))
        .with_signed(settings.key.clone())
}

/// The admin attached to `session`, if any.
pub async fn current(session: &Session) -> Option<AdminSession> {
    match session.get::<AdminSession>(ADMIN_KEY).await {
        Ok(admin) => admin,
        Err(e) => {
            error!("Failed to read admin session: {}", e);
            None
        }
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginPage {}

/// GET /login
pub async fn new(State(state): State<AppState>) -> Response {
    page(&state, "session_new.html", LoginPage {})
}

/// POST /session. Only admins get a session; anything else goes back to the
/// login page.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, Response> {
    let db = state.db.clone();
    let email = form.email.clone();
    let checked = blocking(move || users::login(&db, &form.email, &form.password)).await;

    let user = match checked {
        Err(ServiceError::Validation(_)) => {
            warn!("Failed admin login for {}", email);
            return Ok(found("/login"));
        }
        other => other.or_page(&state)?,
    };
    if user.role != Role::Admin {
        warn!("User {} is not an admin, web login refused", user.id);
        return Ok(found("/login"));
    }

    let admin = AdminSession {
        user_id: user.id,
        user_name: user.name,
    };
    session
        .cycle_id()
        .await
        .map_err(|e| ServiceError::Internal(e.into()))
        .or_page(&state)?;
    session
        .insert(ADMIN_KEY, &admin)
        .await
        .map_err(|e| ServiceError::Internal(e.into()))
        .or_page(&state)?;

    info!("Admin {} logged in", admin.user_id);
    Ok(found("/users"))
}

/// GET /logout. Deletes the session record, so the old cookie stops working.
pub async fn destroy(State(state): State<AppState>, session: Session) -> Result<Response, Response> {
    session
        .flush()
        .await
        .map_err(|e| ServiceError::Internal(e.into()))
        .or_page(&state)?;
    Ok(found("/login"))
}
