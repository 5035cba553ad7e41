//! In-process tests for the storefront router.
//!
//! These exercise routing, the session/auth extractors, and the public
//! pages without a marketplace API: every protected path must bounce an
//! unauthenticated browser to the login page before any API call happens.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use trove_integration_tests::test_app;

async fn get(path: &str) -> axum::response::Response {
    test_app()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(path: &str, body: &str) -> axum::response::Response {
    test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// Public Pages
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let response = get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let response = get("/").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/products");
}

#[tokio::test]
async fn test_login_page_renders() {
    let response = get("/login").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Log in"));
    assert!(body.contains("action=\"/login\""));
}

#[tokio::test]
async fn test_login_page_shows_error_notification() {
    let response = get("/login?error=Invalid%20credentials").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Invalid credentials"));
}

#[tokio::test]
async fn test_signup_page_renders() {
    let response = get("/signup").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Create an account"));
    assert!(body.contains("password_confirm"));
}

// ============================================================================
// Auth Gate
// ============================================================================

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    for path in [
        "/products",
        "/product/abc123",
        "/add-product",
        "/my-listings",
        "/my-listings/abc123/edit",
        "/cart",
        "/profile",
        "/purchases",
    ] {
        let response = get(path).await;
        assert!(
            response.status().is_redirection(),
            "{path} should redirect when logged out, got {}",
            response.status()
        );
        assert_eq!(location(&response), "/login", "{path} should land on login");
    }
}

#[tokio::test]
async fn test_fragments_return_401_when_logged_out() {
    // HTMX fragments must not swap a login page into the navigation bar
    let response = get("/fragments/cart-count").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_badge_renders_guest_links() {
    let response = get("/fragments/user-badge").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("/login"));
    assert!(body.contains("/signup"));
}

// ============================================================================
// Form Validation (rejected before any API call)
// ============================================================================

#[tokio::test]
async fn test_login_requires_both_fields() {
    let response = post_form("/login", "email=&password=").await;
    assert!(response.status().is_redirection());
    assert!(location(&response).starts_with("/login?error="));
}

#[tokio::test]
async fn test_signup_rejects_password_mismatch() {
    let response = post_form(
        "/signup",
        "username=ada&email=ada%40example.com&password=hunter22&password_confirm=hunter23",
    )
    .await;
    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response),
        "/signup?error=Passwords%20do%20not%20match"
    );
}

#[tokio::test]
async fn test_signup_rejects_short_password() {
    let response = post_form(
        "/signup",
        "username=ada&email=ada%40example.com&password=abc&password_confirm=abc",
    )
    .await;
    assert!(response.status().is_redirection());
    assert!(location(&response).contains("at%20least%206%20characters"));
}

#[tokio::test]
async fn test_signup_rejects_missing_fields() {
    let response = post_form("/signup", "username=&email=&password=&password_confirm=").await;
    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response),
        "/signup?error=All%20fields%20are%20required"
    );
}

#[tokio::test]
async fn test_logout_redirects_to_login() {
    let response = post_form("/logout", "").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");
}
