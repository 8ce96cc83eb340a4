mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_sessions::cookie::Key;
use tracing::{info, warn};

use crowdfund_api::payment::SnapGateway;
use crowdfund_api::router::{self, AssetDirs};
use crowdfund_api::service::users;
use crowdfund_api::state::AppState;
use crowdfund_api::storage::Storage;
use crowdfund_api::token::TokenService;
use crowdfund_api::web::session::SessionSettings;
use crowdfund_api::web::session_store::SqliteStore;
use crowdfund_api::web::templates::Templates;
use crowdfund_db::Database;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crowdfund=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    info!("Database ready at {}", config.db_path.display());

    if let Some(seed) = &config.admin {
        let admin = users::ensure_admin(&db, &seed.email, &seed.password)?;
        info!("Admin account {} ready", admin.id);
    }

    let templates = Templates::load(&config.templates_dir)?;
    let storage = Storage::new(config.images_dir.clone()).await?;

    if config.payment_server_key.is_empty() {
        warn!("CROWDFUND_PAYMENT_SERVER_KEY is empty, payment gateway calls will be rejected");
    }
    let payments = SnapGateway::new(config.payment_endpoint.clone(), config.payment_server_key.clone());

    let sessions = SessionSettings {
        key: Key::try_from(config.session_secret.as_bytes())?,
        idle_timeout: time::Duration::hours(config.session_idle_hours),
    };
    let purged = SqliteStore::new(db.clone()).purge_expired().await?;
    if purged > 0 {
        info!("Removed {} expired admin sessions", purged);
    }

    let state = AppState {
        db,
        tokens: TokenService::new(&config.jwt_secret, chrono::Duration::hours(config.token_ttl_hours)),
        storage: Arc::new(storage),
        payments: Arc::new(payments),
        templates: Arc::new(templates),
        sessions,
    };

    let app = router::build(state, &AssetDirs::under(config.assets_dir.clone()));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Crowdfund server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
