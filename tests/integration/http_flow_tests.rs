//! End-to-end HTTP flows through the router
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use canary_common::{SessionInfo, SESSION_COOKIE_NAME};
use tower::ServiceExt;

use crate::test_utils::{test_app, test_app_with, test_settings};

async fn create_alice(app: &Router) {
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/users")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"alice","password":"s3cret"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

fn form_login(body: &'static str) -> Request<Body> {
    Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn json_login(body: &'static str) -> Request<Body> {
    Request::post("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn with_cookie(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("{SESSION_COOKIE_NAME}={token}"))
        .body(Body::empty())
        .unwrap()
}

fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

fn token_from(cookie: &str) -> String {
    let pair = cookie.split(';').next().unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert_eq!(name, SESSION_COOKIE_NAME);
    value.to_string()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_form_login_session_logout() {
    let app = test_app();
    create_alice(&app).await;

    let response = app
        .clone()
        .oneshot(form_login("username=alice&password=s3cret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    let token = token_from(&set_cookie(&response).unwrap());

    let response = app
        .clone()
        .oneshot(with_cookie("GET", "/api/session", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let info: SessionInfo = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(info.username, "alice");

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(with_cookie("POST", "/logout", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
    }

    let response = app
        .oneshot(with_cookie("GET", "/api/session", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_without_content_type_is_form() {
    let app = test_app();
    create_alice(&app).await;

    let response = app
        .oneshot(
            Request::post("/login")
                .body(Body::from("username=alice&password=s3cret"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie(&response).is_some());
}

#[tokio::test]
async fn test_form_login_failure_redirects_without_cookie() {
    let app = test_app();
    create_alice(&app).await;

    let response = app
        .oneshot(form_login("username=alice&password=wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?error=Invalid+credentials"
    );
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_json_login_sets_cookie() {
    let app = test_app();
    create_alice(&app).await;

    let response = app
        .oneshot(json_login(r#"{"username":"alice","password":"s3cret"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response).unwrap();
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["success"], "true");
}

#[tokio::test]
async fn test_json_failures_do_not_reveal_which_part_was_wrong() {
    let app = test_app();
    create_alice(&app).await;

    let wrong_password = app
        .clone()
        .oneshot(json_login(r#"{"username":"alice","password":"nope"}"#))
        .await
        .unwrap();
    let unknown_user = app
        .oneshot(json_login(r#"{"username":"mallory","password":"s3cret"}"#))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(wrong_password).await, body_bytes(unknown_user).await);
}

#[tokio::test]
async fn test_secure_cookie_flag_from_settings() {
    let mut settings = test_settings();
    settings.server.secure_cookies = true;
    let app = test_app_with(settings);
    create_alice(&app).await;

    let response = app
        .oneshot(json_login(r#"{"username":"alice","password":"s3cret"}"#))
        .await
        .unwrap();
    assert!(set_cookie(&response).unwrap().ends_with("; Secure"));
}

#[tokio::test]
async fn test_garbage_cookie_is_unauthorized() {
    let response = test_app()
        .oneshot(with_cookie("GET", "/api/session", "forged-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
