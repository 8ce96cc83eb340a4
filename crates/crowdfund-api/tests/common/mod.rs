#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_sessions::cookie::Key;

use crowdfund_api::payment::{PaymentGateway, PaymentRequest};
use crowdfund_api::router::{self, AssetDirs};
use crowdfund_api::service::campaigns::{self, CampaignInput};
use crowdfund_api::service::users::{self, Registration};
use crowdfund_api::state::AppState;
use crowdfund_api::storage::Storage;
use crowdfund_api::token::TokenService;
use crowdfund_api::web::session::SessionSettings;
use crowdfund_api::web::templates::Templates;
use crowdfund_db::Database;
use crowdfund_db::models::UserRow;

pub const PASSWORD: &str = "correct horse";

pub struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn payment_url(&self, request: &PaymentRequest) -> anyhow::Result<String> {
        Ok(format!("https://pay.test/{}", request.order_id))
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<Database>,
    pub tokens: TokenService,
    pub images: TempDir,
    _templates: Option<TempDir>,
    _assets: TempDir,
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, body).expect("write template");
}

/// App with a small template set written to a temp dir.
pub async fn app() -> TestApp {
    let templates_dir = TempDir::new().expect("temp dir");
    write(templates_dir.path(), "layouts/layout.html", "<main>{% block content %}{% endblock %}</main>");
    write(templates_dir.path(), "session/session_new.html", "<form>login</form>");
    write(
        templates_dir.path(),
        "user/user_index.html",
        "{% for u in users %}<p>{{ u.email }}</p>{% endfor %}",
    );
    write(templates_dir.path(), "error/error.html", "<p>{{ message }}</p>");

    let templates = Templates::load(templates_dir.path()).expect("templates");
    build(templates, Some(templates_dir)).await
}

/// App rendering the shipped `web/templates` directory.
pub async fn site_app() -> TestApp {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../web/templates");
    let templates = Templates::load(&dir).expect("site templates");
    build(templates, None).await
}

async fn build(templates: Templates, templates_dir: Option<TempDir>) -> TestApp {
    let images = TempDir::new().expect("temp dir");
    let assets = TempDir::new().expect("temp dir");

    let db = Arc::new(Database::open_in_memory().expect("db"));
    let tokens = TokenService::new("integration-secret", chrono::Duration::hours(1));
    let state = AppState {
        db: db.clone(),
        tokens: tokens.clone(),
        storage: Arc::new(Storage::new(images.path().to_path_buf()).await.expect("storage")),
        payments: Arc::new(FakeGateway),
        templates: Arc::new(templates),
        sessions: SessionSettings {
            key: Key::from(&[3u8; 64]),
            idle_timeout: time::Duration::hours(1),
        },
    };

    TestApp {
        router: router::build(state, &AssetDirs::under(assets.path().to_path_buf())),
        db,
        tokens,
        images,
        _templates: templates_dir,
        _assets: assets,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("router call")
    }

    pub fn user(&self, email: &str) -> UserRow {
        users::register(
            &self.db,
            &Registration {
                name: "Test User".to_string(),
                occupation: "tester".to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .expect("register")
    }

    pub fn admin(&self, email: &str) -> UserRow {
        users::ensure_admin(&self.db, email, PASSWORD).expect("admin")
    }

    pub fn campaign(&self, owner: &UserRow, name: &str) -> i64 {
        campaigns::create(
            &self.db,
            owner.id,
            &CampaignInput {
                name: name.to_string(),
                short_description: "short".to_string(),
                description: "long".to_string(),
                goal_amount: 1_000,
                perks: "sticker, mug".to_string(),
            },
        )
        .expect("campaign")
        .id
    }

    pub fn bearer(&self, user: &UserRow) -> String {
        format!("Bearer {}", self.tokens.issue(user.id).expect("token"))
    }

    pub fn stored_files(&self) -> usize {
        fs::read_dir(self.images.path()).expect("images dir").count()
    }

    /// Bytes behind a stored `images/...` path.
    pub fn stored_bytes(&self, public_path: &str) -> Vec<u8> {
        let name = public_path.strip_prefix("images/").expect("public image path");
        fs::read(self.images.path().join(name)).expect("stored file")
    }

    /// Log in through the form and return the `name=value` session cookie.
    pub async fn admin_cookie(&self, email: &str) -> String {
        let response = self.send(login(email, PASSWORD)).await;
        assert_eq!(response.headers()[header::LOCATION], "/users");
        session_cookie(&response)
    }
}

pub fn login(email: &str, password: &str) -> Request<Body> {
    form("POST", "/session", None, &[("email", email), ("password", password)])
}

/// An urlencoded form request, optionally carrying a cookie.
pub fn form(method: &str, uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            b' ' => "+".to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

pub fn with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request")
}

/// `name=value` of the first Set-Cookie header.
pub fn session_cookie(response: &Response<Body>) -> String {
    let raw = response.headers()[header::SET_COOKIE].to_str().expect("cookie header");
    raw.split(';').next().expect("cookie pair").to_string()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).expect("request")
}

pub fn json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub const BOUNDARY: &str = "crowdfund-test-boundary";

/// A multipart body with text `fields` and one file part.
pub fn multipart_body(fields: &[(&str, &str)], file_field: &str, file_name: &str, bytes: &[u8]) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{file_field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
