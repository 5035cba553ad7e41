//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a marketplace session token in route
//! handlers. Token validity is NOT checked here; a page's data fetch is what
//! proves the token, and a 401 from the API clears the session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a stored marketplace bearer token.
///
/// If no token is in the session, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireToken(token): RequireToken,
/// ) -> impl IntoResponse {
///     // token is the raw bearer string for MarketClient calls
/// }
/// ```
pub struct RequireToken(pub String);

/// Error returned when authentication is required but no token is stored.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for HTMX fragment requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireToken
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let token: String = session
            .get(session_keys::ACCESS_TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                // Fragments get a bare 401 so HTMX doesn't swap in a login page
                if parts.uri.path().starts_with("/fragments/") {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::RedirectToLogin
                }
            })?;

        Ok(Self(token))
    }
}

/// Extractor that optionally gets the session's cached user identity.
///
/// Unlike `RequireToken`, this never rejects the request. Used by pages that
/// render differently for guests (the navigation bar user badge).
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to store the bearer token and user identity after login/register.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_session_auth(
    session: &Session,
    token: &str,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::ACCESS_TOKEN, token).await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the stored token and user identity (logout, or a 401
/// from the marketplace API).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session_auth(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<String>(session_keys::ACCESS_TOKEN)
        .await?;
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
