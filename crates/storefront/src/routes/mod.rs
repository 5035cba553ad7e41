//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /products
//! GET  /health                 - Health check
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /signup                 - Registration page
//! POST /signup                 - Registration action
//! POST /logout                 - Logout action
//!
//! # Products (requires login)
//! GET  /products               - Catalog with ?category= and ?search= filters
//! GET  /product/{id}           - Product detail
//! GET  /add-product            - New listing form
//! POST /add-product            - Create listing (multipart)
//! GET  /my-listings            - Own listings
//! GET  /my-listings/{id}/edit  - Edit listing form
//! POST /my-listings/{id}/edit  - Update listing (multipart)
//! POST /my-listings/{id}/delete - Delete listing
//!
//! # Cart (requires login)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add product to cart
//! POST /cart/increase          - Increment item quantity
//! POST /cart/decrease          - Decrement item quantity (floor of 1)
//! POST /cart/remove            - Remove product from cart
//! POST /cart/checkout          - Convert cart into a purchase
//!
//! # Account (requires login)
//! GET  /profile                - Profile page
//! POST /profile                - Update profile
//! GET  /purchases              - Purchase history
//!
//! # HTMX fragments
//! GET  /fragments/cart-count   - Cart count badge
//! GET  /fragments/user-badge   - Navigation user badge
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::market::MarketError;
use crate::middleware::clear_session_auth;
use crate::state::AppState;

/// Maximum accepted size for listing image uploads (16 MiB, matching the
/// marketplace API's request limit).
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Redirect to a path with a user-facing error message in the query string.
pub(crate) fn redirect_with_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?error={}", urlencoding::encode(message)))
}

/// Redirect to a path with a success message in the query string.
pub(crate) fn redirect_with_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?success={}", urlencoding::encode(message)))
}

/// Turn a failed mutation into a redirect.
///
/// A rejected token clears the session and lands on the login page; any
/// other failure goes back to `back` with the error as a notification.
pub(crate) async fn mutation_failure(session: &Session, err: MarketError, back: &str) -> Response {
    if err.is_auth() {
        expire_session(session).await;
        return redirect_with_error("/login", &err.notification()).into_response();
    }
    redirect_with_error(back, &err.notification()).into_response()
}

/// Drop the stored token and user identity after the API rejected the token.
pub(crate) async fn expire_session(session: &Session) {
    if let Err(e) = clear_session_auth(session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    crate::error::clear_sentry_user();
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/product/{id}", get(products::show))
        .route(
            "/add-product",
            get(products::new_listing).post(products::create_listing),
        )
        .route("/my-listings", get(products::my_listings))
        .route(
            "/my-listings/{id}/edit",
            get(products::edit_listing).post(products::update_listing),
        )
        .route("/my-listings/{id}/delete", post(products::delete_listing))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/increase", post(cart::increase))
        .route("/decrease", post(cart::decrease))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).post(account::update_profile),
        )
        .route("/purchases", get(account::purchases))
}

/// Create the HTMX fragment routes router.
///
/// Mounted with full paths (not nested) so the auth extractor sees the
/// `/fragments/` prefix and rejects with 401 instead of a login redirect.
pub fn fragment_routes() -> Router<AppState> {
    Router::new()
        .route("/fragments/cart-count", get(cart::count))
        .route("/fragments/user-badge", get(auth::user_badge))
}

/// Redirect the root path to the catalog.
async fn home() -> Redirect {
    Redirect::to("/products")
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(product_routes())
        .merge(account_routes())
        .nest("/cart", cart_routes())
        .merge(fragment_routes())
}
