//! Cart route handlers.
//!
//! The marketplace API owns the cart; every mutation here is a plain
//! POST-redirect-GET round trip, so concurrent clicks serialize on the
//! API rather than racing in the page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use trove_core::ProductId;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::market::CartItem;
use crate::middleware::RequireToken;
use crate::routes::{
    auth::MessageQuery, expire_session, mutation_failure, redirect_with_error,
    redirect_with_success,
};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
    /// Page to return to after the add (defaults to the catalog).
    pub next: Option<String>,
}

/// Quantity stepper form data. Carries the quantity as currently rendered;
/// the handler computes the new value.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub product_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub count: u32,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

/// Sum of `price * quantity` and total item count over the cart.
fn cart_totals(items: &[CartItem]) -> (Decimal, u32) {
    let subtotal = items
        .iter()
        .map(|item| item.product.price * Decimal::from(item.quantity))
        .sum();
    let count = items.iter().map(|item| item.quantity).sum();
    (subtotal, count)
}

/// New quantity for a decrement, or `None` when already at the floor of 1.
const fn decreased_quantity(current: u32) -> Option<u32> {
    if current <= 1 { None } else { Some(current - 1) }
}

/// Sanitize the post-add return path. Only site-relative paths are
/// accepted; anything else falls back to the catalog.
fn return_path(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/products",
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Query(query): Query<MessageQuery>,
) -> Response {
    match state.market().cart(&token).await {
        Ok(items) => {
            let (subtotal, count) = cart_totals(&items);
            CartShowTemplate {
                items,
                subtotal,
                count,
                error: query.error,
                success: query.success,
            }
            .into_response()
        }
        Err(e) if e.is_auth() => {
            expire_session(&session).await;
            redirect_with_error("/login", &e.notification()).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch cart: {e}");
            CartShowTemplate {
                items: Vec::new(),
                subtotal: Decimal::ZERO,
                count: 0,
                error: Some(e.notification()),
                success: query.success,
            }
            .into_response()
        }
    }
}

/// Add a product to the cart, then return to the originating page.
#[instrument(skip(state, session, token))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::from(form.product_id);
    let quantity = form.quantity.unwrap_or(1).max(1);
    let back = return_path(form.next.as_deref()).to_string();

    match state
        .market()
        .add_to_cart(&token, &product_id, quantity)
        .await
    {
        Ok(()) => {
            add_breadcrumb(
                "cart",
                "Added item to cart",
                Some(&[("product_id", product_id.as_str())]),
            );
            redirect_with_success(&back, "Added to cart").into_response()
        }
        Err(e) => mutation_failure(&session, e, &back).await,
    }
}

/// Increment a cart item's quantity.
#[instrument(skip(state, session, token))]
pub async fn increase(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Form(form): Form<QuantityForm>,
) -> Response {
    let product_id = ProductId::from(form.product_id);
    let quantity = form.quantity.saturating_add(1);

    match state
        .market()
        .update_cart_item(&token, &product_id, quantity)
        .await
    {
        Ok(()) => Redirect::to("/cart").into_response(),
        Err(e) => mutation_failure(&session, e, "/cart").await,
    }
}

/// Decrement a cart item's quantity.
///
/// Quantities floor at 1: a decrement at 1 is a no-op and never reaches
/// the API. Removal is a separate, explicit action.
#[instrument(skip(state, session, token))]
pub async fn decrease(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Form(form): Form<QuantityForm>,
) -> Response {
    let Some(quantity) = decreased_quantity(form.quantity) else {
        return Redirect::to("/cart").into_response();
    };
    let product_id = ProductId::from(form.product_id);

    match state
        .market()
        .update_cart_item(&token, &product_id, quantity)
        .await
    {
        Ok(()) => Redirect::to("/cart").into_response(),
        Err(e) => mutation_failure(&session, e, "/cart").await,
    }
}

/// Remove a product from the cart.
#[instrument(skip(state, session, token))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let product_id = ProductId::from(form.product_id);

    match state.market().remove_from_cart(&token, &product_id).await {
        Ok(()) => redirect_with_success("/cart", "Removed from cart").into_response(),
        Err(e) => mutation_failure(&session, e, "/cart").await,
    }
}

/// Convert the cart into a purchase.
///
/// The API rejects an empty cart, so the error path covers the race where
/// two tabs check out the same cart.
#[instrument(skip(state, session, token))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
) -> Response {
    match state.market().checkout(&token).await {
        Ok(()) => {
            add_breadcrumb("cart", "Checkout completed", None);
            redirect_with_success("/purchases", "Checkout successful").into_response()
        }
        Err(e) => mutation_failure(&session, e, "/cart").await,
    }
}

/// Cart count badge (HTMX).
///
/// A stale token renders as zero rather than an error fragment; the badge
/// is decoration, and the next full-page load handles the re-login. Other
/// failures propagate, which leaves the badge untouched (htmx ignores
/// non-2xx responses by default).
#[instrument(skip(state, token))]
pub async fn count(
    State(state): State<AppState>,
    RequireToken(token): RequireToken,
) -> Result<CartCountTemplate, AppError> {
    let count = match state.market().cart(&token).await {
        Ok(items) => cart_totals(&items).1,
        Err(e) if e.is_auth() => {
            tracing::debug!("Cart count with stale token");
            0
        }
        Err(e) => return Err(e.into()),
    };

    Ok(CartCountTemplate { count })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::market::Product;
    use trove_core::Category;

    fn item(price: &str, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id: ProductId::from("p1"),
                title: "Test".to_string(),
                description: String::new(),
                category: Category::Other,
                price: price.parse().unwrap(),
                image_url: None,
                seller_id: None,
            },
            quantity,
        }
    }

    #[test]
    fn test_cart_totals() {
        let items = vec![item("12.50", 2), item("3.00", 1)];
        let (subtotal, count) = cart_totals(&items);
        assert_eq!(subtotal.to_string(), "28.00");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_cart_totals_empty() {
        let (subtotal, count) = cart_totals(&[]);
        assert_eq!(subtotal, Decimal::ZERO);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_decrease_floors_at_one() {
        assert_eq!(decreased_quantity(3), Some(2));
        assert_eq!(decreased_quantity(2), Some(1));
        assert_eq!(decreased_quantity(1), None);
        assert_eq!(decreased_quantity(0), None);
    }

    #[test]
    fn test_return_path_rejects_external_urls() {
        assert_eq!(return_path(Some("/product/abc")), "/product/abc");
        assert_eq!(return_path(Some("https://evil.example")), "/products");
        assert_eq!(return_path(Some("//evil.example")), "/products");
        assert_eq!(return_path(None), "/products");
    }

    #[test]
    fn test_empty_cart_renders_empty_state() {
        let html = CartShowTemplate {
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            count: 0,
            error: None,
            success: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("Your cart is empty."));
        assert!(!html.contains("Checkout"));
    }

    #[test]
    fn test_cart_renders_lines_and_subtotal() {
        let items = vec![item("12.50", 2)];
        let (subtotal, count) = cart_totals(&items);
        let html = CartShowTemplate {
            items,
            subtotal,
            count,
            error: None,
            success: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("$12.50 each"));
        assert!(html.contains("$25.00"));
        assert!(html.contains("Checkout"));
    }
}
