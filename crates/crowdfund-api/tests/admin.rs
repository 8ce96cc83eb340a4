mod common;

use axum::http::{StatusCode, header};

use common::{PASSWORD, app, body_text, get, login, session_cookie, with_cookie};

#[tokio::test]
async fn admin_pages_redirect_without_session() {
    let app = app().await;
    for uri in ["/users", "/campaigns", "/transactions", "/users/edit/1"] {
        let response = app.send(get(uri)).await;
        assert_eq!(response.status(), StatusCode::FOUND, "GET {}", uri);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    let response = app.send(get("/login")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn forged_cookie_is_rejected() {
    let app = app().await;
    let response = app.send(with_cookie("/users", "crowdfund_session=eyJ1c2VySUQiOjF9")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn non_admin_cannot_log_in() {
    let app = app().await;
    app.user("plain@example.com");

    let response = app.send(login("plain@example.com", PASSWORD)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/login");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn login_then_logout() {
    let app = app().await;
    app.admin("root@example.com");
    app.user("listed@example.com");

    let response = app.send(login("root@example.com", PASSWORD)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/users");
    let issued = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(issued.contains("HttpOnly"));
    assert!(issued.contains("Max-Age="));
    let cookie = session_cookie(&response);

    let response = app.send(with_cookie("/users", &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("listed@example.com"));

    let response = app.send(with_cookie("/logout", &cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    // A copy of the cookie kept from before logout no longer opens anything.
    for uri in ["/users", "/campaigns", "/transactions"] {
        let response = app.send(with_cookie(uri, &cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND, "GET {}", uri);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}

#[tokio::test]
async fn session_lives_in_the_database() {
    let app = app().await;
    app.admin("root@example.com");

    let cookie = app.admin_cookie("root@example.com").await;
    let live = |app: &common::TestApp| {
        app.db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get::<_, i64>(0))?))
            .unwrap()
    };
    assert_eq!(live(&app), 1);

    app.send(with_cookie("/logout", &cookie)).await;
    assert_eq!(live(&app), 0);
}
