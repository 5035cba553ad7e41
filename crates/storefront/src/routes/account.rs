//! Account route handlers.
//!
//! Profile display/update and purchase history. The profile fetch doubles
//! as token validation, so a stale session is caught here first.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::market::{Purchase, User};
use crate::middleware::{RequireToken, set_session_auth};
use crate::models::CurrentUser;
use crate::routes::{
    auth::MessageQuery, expire_session, mutation_failure, redirect_with_error,
    redirect_with_success,
};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Profile update form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub user: User,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Purchase history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/purchases.html")]
pub struct PurchasesTemplate {
    pub purchases: Vec<Purchase>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the profile page with fresh data from the API.
#[instrument(skip(state, session, token))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Query(query): Query<MessageQuery>,
) -> Response {
    match state.market().profile(&token).await {
        Ok(user) => ProfileTemplate {
            user,
            error: query.error,
            success: query.success,
        }
        .into_response(),
        Err(e) if e.is_auth() => {
            expire_session(&session).await;
            redirect_with_error("/login", &e.notification()).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch profile: {e}");
            redirect_with_error("/products", &e.notification()).into_response()
        }
    }
}

/// Handle profile update form submission.
///
/// On success the session's cached identity is refreshed so the
/// navigation badge shows the new username immediately.
#[instrument(skip(state, session, token))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() || email.is_empty() {
        return Ok(
            redirect_with_error("/profile", "Username and email are required").into_response(),
        );
    }

    match state.market().update_profile(&token, username, email).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id.clone(),
                username: user.username.clone(),
                email: user.email.clone(),
            };
            set_session_auth(&session, &token, &current).await?;

            Ok(redirect_with_success("/profile", "Profile updated").into_response())
        }
        Err(e) => Ok(mutation_failure(&session, e, "/profile").await),
    }
}

/// Display the purchase history, newest first as the API returns it.
#[instrument(skip(state, session, token))]
pub async fn purchases(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Query(query): Query<MessageQuery>,
) -> Response {
    match state.market().purchases(&token).await {
        Ok(purchases) => PurchasesTemplate {
            purchases,
            error: query.error,
            success: query.success,
        }
        .into_response(),
        Err(e) if e.is_auth() => {
            expire_session(&session).await;
            redirect_with_error("/login", &e.notification()).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch purchases: {e}");
            PurchasesTemplate {
                purchases: Vec::new(),
                error: Some(e.notification()),
                success: query.success,
            }
            .into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::market::PurchaseLine;
    use trove_core::PurchaseId;

    #[test]
    fn test_no_purchases_renders_empty_state() {
        let html = PurchasesTemplate {
            purchases: Vec::new(),
            error: None,
            success: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("You have no previous purchases."));
    }

    #[test]
    fn test_purchase_card_shows_short_id_and_total() {
        let purchase = Purchase {
            id: PurchaseId::from("65f2a1b2c3d4e5f6a7b8c9d2"),
            created_at: "2026-03-14T09:26:53".to_string(),
            items: vec![PurchaseLine {
                title: "Book".to_string(),
                price: "12.50".parse().unwrap(),
                quantity: 2,
            }],
        };
        let html = PurchasesTemplate {
            purchases: vec![purchase],
            error: None,
            success: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("Order 65f2a1b2"));
        assert!(html.contains("March 14, 2026"));
        assert!(html.contains("$25.00"));
    }
}
