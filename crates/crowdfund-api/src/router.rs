use std::path::PathBuf;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::{cors, require_admin_session, require_auth};
use crate::state::AppState;
use crate::upload::MAX_UPLOAD_SIZE;
use crate::web::session_store::SqliteStore;
use crate::{campaigns, transactions, users, web};

/// Directories of the static assets used by the admin pages.
#[derive(Debug, Clone)]
pub struct AssetDirs {
    pub css: PathBuf,
    pub js: PathBuf,
    pub webfonts: PathBuf,
}

impl AssetDirs {
    pub fn under(root: PathBuf) -> Self {
        Self {
            css: root.join("css"),
            js: root.join("js"),
            webfonts: root.join("webfonts"),
        }
    }
}

pub fn build(state: AppState, assets: &AssetDirs) -> Router {
    let public_api = Router::new()
        .route("/users", post(users::register))
        .route("/sessions", post(users::login))
        .route("/email_checkers", post(users::check_email))
        .route("/campaigns", get(campaigns::list))
        .route("/campaigns/{id}", get(campaigns::detail))
        .route("/transactions/notification", post(transactions::notification));

    let protected_api = Router::new()
        .route("/avatars", post(users::upload_avatar))
        .route("/users/fetch", get(users::fetch))
        .route("/campaigns", post(campaigns::create))
        .route("/campaigns/{id}", put(campaigns::update))
        .route("/campaign-images", post(campaigns::upload_image))
        .route("/campaigns/{id}/transactions", get(transactions::campaign_transactions))
        .route(
            "/transactions",
            get(transactions::user_transactions).post(transactions::create),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/users", get(web::users::index).post(web::users::create))
        .route("/users/new", get(web::users::new))
        .route("/users/edit/{id}", get(web::users::edit))
        .route("/users/update/{id}", post(web::users::update))
        .route(
            "/users/avatar/{id}",
            get(web::users::new_avatar).post(web::users::create_avatar),
        )
        .route("/campaigns", get(web::campaigns::index).post(web::campaigns::create))
        .route("/campaigns/new", get(web::campaigns::new))
        .route(
            "/campaigns/image/{id}",
            get(web::campaigns::new_image).post(web::campaigns::create_image),
        )
        .route("/campaigns/edit/{id}", get(web::campaigns::edit))
        .route("/campaigns/update/{id}", post(web::campaigns::update))
        .route("/campaigns/show/{id}", get(web::campaigns::show))
        .route("/transactions", get(web::transactions::index))
        .route_layer(middleware::from_fn(require_admin_session));

    let login = Router::new()
        .route("/login", get(web::session::new))
        .route("/session", post(web::session::create))
        .route("/logout", get(web::session::destroy));

    let sessions = web::session::layer(SqliteStore::new(state.db.clone()), &state.sessions);
    let admin_web = admin.merge(login).layer(sessions);

    Router::new()
        .nest("/api/v1", public_api.merge(protected_api))
        .merge(admin_web)
        .nest_service("/images", ServeDir::new(state.storage.dir()))
        .nest_service("/css", ServeDir::new(&assets.css))
        .nest_service("/js", ServeDir::new(&assets.js))
        .nest_service("/webfonts", ServeDir::new(&assets.webfonts))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
