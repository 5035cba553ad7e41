//! Authentication route handlers.
//!
//! Handles login, registration, and logout against the marketplace API.
//! Successful auth stores the API's bearer token in the session; the browser
//! never sees it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalUser, clear_session_auth, set_session_auth};
use crate::models::CurrentUser;
use crate::routes::redirect_with_error;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Navigation user badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/user_badge.html")]
pub struct UserBadgeTemplate {
    pub user: Option<CurrentUser>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Handle login form submission.
///
/// Exchanges credentials for a bearer token and stores it in the session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Ok(redirect_with_error("/login", "Email and password are required").into_response());
    }

    match state.market().login(form.email.trim(), &form.password).await {
        Ok(auth) => {
            let user = CurrentUser {
                id: auth.user.id.clone(),
                username: auth.user.username.clone(),
                email: auth.user.email.clone(),
            };
            set_session_auth(&session, &auth.access_token, &user).await?;

            set_sentry_user(&user.id, Some(&user.email));
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            Ok(redirect_with_error("/login", &e.notification()).into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn signup_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    SignupTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Handle registration form submission.
///
/// The API logs the new account in immediately, so a successful signup
/// lands on the catalog with a live session.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return Ok(redirect_with_error("/signup", "All fields are required").into_response());
    }
    if form.password != form.password_confirm {
        return Ok(redirect_with_error("/signup", "Passwords do not match").into_response());
    }
    if form.password.len() < 6 {
        return Ok(
            redirect_with_error("/signup", "Password must be at least 6 characters")
                .into_response(),
        );
    }

    match state.market().register(username, email, &form.password).await {
        Ok(auth) => {
            let user = CurrentUser {
                id: auth.user.id.clone(),
                username: auth.user.username.clone(),
                email: auth.user.email.clone(),
            };
            set_session_auth(&session, &auth.access_token, &user).await?;

            set_sentry_user(&user.id, Some(&user.email));
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            Ok(redirect_with_error("/signup", &e.notification()).into_response())
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// The bearer token is stateless on the API side, so logout is purely a
/// session wipe here.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_session_auth(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }

    clear_sentry_user();
    Redirect::to("/login").into_response()
}

// =============================================================================
// Fragments
// =============================================================================

/// Navigation user badge (HTMX).
///
/// Renders the username for logged-in users and login/signup links for
/// guests, so the shared layout carries no per-user state.
pub async fn user_badge(OptionalUser(user): OptionalUser) -> impl IntoResponse {
    UserBadgeTemplate { user }
}
