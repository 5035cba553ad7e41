//! Product route handlers.
//!
//! Covers the shared catalog (browse, filter, search, detail) and the
//! seller side (create, edit, delete listings). Listing forms are
//! multipart so the optional image upload travels with the text fields.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use trove_core::{Category, ProductId};

use crate::filters;
use crate::market::{ImageUpload, ListingFields, Product};
use crate::middleware::RequireToken;
use crate::routes::{
    auth::MessageQuery, expire_session, mutation_failure, redirect_with_error,
    redirect_with_success,
};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// Catalog filter query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<Product>,
    pub categories: [Category; 6],
    pub selected_category: Option<Category>,
    pub search: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Product,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// New listing form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/new.html")]
pub struct NewListingTemplate {
    pub categories: [Category; 6],
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Edit listing form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/edit.html")]
pub struct EditListingTemplate {
    pub product: Product,
    pub categories: [Category; 6],
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Own listings page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/listings.html")]
pub struct MyListingsTemplate {
    pub products: Vec<Product>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Catalog Routes
// =============================================================================

/// Display the catalog, optionally filtered by category and search text.
///
/// Unknown category values are treated as "no filter" rather than an error.
#[instrument(skip(state, session, token))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let selected_category = query.category.as_deref().and_then(Category::parse);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let search_filter = (!search.is_empty()).then_some(search.as_str());

    match state
        .market()
        .products(&token, selected_category, search_filter)
        .await
    {
        Ok(products) => ProductsIndexTemplate {
            products,
            categories: Category::ALL,
            selected_category,
            search,
            error: query.error,
            success: query.success,
        }
        .into_response(),
        Err(e) if e.is_auth() => {
            expire_session(&session).await;
            redirect_with_error("/login", &e.notification()).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch catalog: {e}");
            ProductsIndexTemplate {
                products: Vec::new(),
                categories: Category::ALL,
                selected_category,
                search,
                error: Some(e.notification()),
                success: query.success,
            }
            .into_response()
        }
    }
}

/// Display a product detail page.
#[instrument(skip(state, session, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Path(id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Response {
    let product_id = ProductId::from(id);

    match state.market().product(&token, &product_id).await {
        Ok(product) => ProductShowTemplate {
            product,
            error: query.error,
            success: query.success,
        }
        .into_response(),
        Err(e) if e.is_auth() => {
            expire_session(&session).await;
            redirect_with_error("/login", &e.notification()).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch product {product_id}: {e}");
            redirect_with_error("/products", &e.notification()).into_response()
        }
    }
}

// =============================================================================
// Seller Routes
// =============================================================================

/// Display the new listing form.
pub async fn new_listing(
    RequireToken(_token): RequireToken,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    NewListingTemplate {
        categories: Category::ALL,
        error: query.error,
        success: query.success,
    }
}

/// Handle new listing form submission.
#[instrument(skip(state, session, token, multipart))]
pub async fn create_listing(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    multipart: Multipart,
) -> Response {
    let fields = match parse_listing_form(multipart).await {
        Ok(fields) => fields,
        Err(message) => return redirect_with_error("/add-product", &message).into_response(),
    };

    match state.market().create_listing(&token, fields).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Listing created");
            redirect_with_success("/my-listings", "Listing created").into_response()
        }
        Err(e) => mutation_failure(&session, e, "/add-product").await,
    }
}

/// Display the user's own listings.
#[instrument(skip(state, session, token))]
pub async fn my_listings(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Query(query): Query<MessageQuery>,
) -> Response {
    match state.market().my_listings(&token).await {
        Ok(products) => MyListingsTemplate {
            products,
            error: query.error,
            success: query.success,
        }
        .into_response(),
        Err(e) if e.is_auth() => {
            expire_session(&session).await;
            redirect_with_error("/login", &e.notification()).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch own listings: {e}");
            MyListingsTemplate {
                products: Vec::new(),
                error: Some(e.notification()),
                success: query.success,
            }
            .into_response()
        }
    }
}

/// Display the edit form for one of the user's listings, prefilled with
/// the current values.
#[instrument(skip(state, session, token))]
pub async fn edit_listing(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Path(id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Response {
    let product_id = ProductId::from(id);

    match state.market().product(&token, &product_id).await {
        Ok(product) => EditListingTemplate {
            product,
            categories: Category::ALL,
            error: query.error,
            success: query.success,
        }
        .into_response(),
        Err(e) if e.is_auth() => {
            expire_session(&session).await;
            redirect_with_error("/login", &e.notification()).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch listing {product_id}: {e}");
            redirect_with_error("/my-listings", &e.notification()).into_response()
        }
    }
}

/// Handle edit listing form submission.
#[instrument(skip(state, session, token, multipart))]
pub async fn update_listing(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let product_id = ProductId::from(id);
    let back = format!("/my-listings/{product_id}/edit");

    let fields = match parse_listing_form(multipart).await {
        Ok(fields) => fields,
        Err(message) => return redirect_with_error(&back, &message).into_response(),
    };

    match state
        .market()
        .update_listing(&token, &product_id, fields)
        .await
    {
        Ok(_) => redirect_with_success("/my-listings", "Listing updated").into_response(),
        Err(e) => mutation_failure(&session, e, &back).await,
    }
}

/// Handle listing deletion.
#[instrument(skip(state, session, token))]
pub async fn delete_listing(
    State(state): State<AppState>,
    session: Session,
    RequireToken(token): RequireToken,
    Path(id): Path<String>,
) -> Response {
    let product_id = ProductId::from(id);

    match state.market().delete_listing(&token, &product_id).await {
        Ok(()) => redirect_with_success("/my-listings", "Listing deleted").into_response(),
        Err(e) => mutation_failure(&session, e, "/my-listings").await,
    }
}

// =============================================================================
// Form Parsing
// =============================================================================

/// Read and validate the multipart listing form.
///
/// Returns a user-facing message on validation failure. An image part with
/// no selected file (empty filename) counts as "no image".
async fn parse_listing_form(mut multipart: Multipart) -> Result<ListingFields, String> {
    let mut title = String::new();
    let mut category = String::new();
    let mut price = String::new();
    let mut description = String::new();
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| "Invalid form submission".to_string())?
    {
        match field.name().unwrap_or_default() {
            "title" => title = read_text(field).await?,
            "category" => category = read_text(field).await?,
            "price" => price = read_text(field).await?,
            "description" => description = read_text(field).await?,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| "Invalid form submission".to_string())?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let title = title.trim().to_string();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }

    let Some(category) = Category::parse(category.trim()) else {
        return Err("Please select a category".to_string());
    };

    let price = price.trim().to_string();
    let valid_price = price
        .parse::<Decimal>()
        .is_ok_and(|value| value > Decimal::ZERO);
    if !valid_price {
        return Err("Price must be a positive number".to_string());
    }

    Ok(ListingFields {
        title,
        category,
        price,
        description: description.trim().to_string(),
        image,
    })
}

/// Read a text part of the multipart form.
async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, String> {
    field
        .text()
        .await
        .map_err(|_| "Invalid form submission".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog_renders_empty_state() {
        let html = ProductsIndexTemplate {
            products: Vec::new(),
            categories: Category::ALL,
            selected_category: None,
            search: String::new(),
            error: None,
            success: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("No products found."));
        assert!(html.contains("All Categories"));
    }

    #[test]
    fn test_catalog_preserves_active_filters() {
        let html = ProductsIndexTemplate {
            products: Vec::new(),
            categories: Category::ALL,
            selected_category: Some(Category::Books),
            search: "foo".to_string(),
            error: None,
            success: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("value=\"foo\""));
        assert!(html.contains("<option value=\"Books\" selected>"));
    }

    #[test]
    fn test_catalog_renders_product_cards() {
        let product = Product {
            id: ProductId::from("p1"),
            title: "Mechanical Keyboard".to_string(),
            description: String::new(),
            category: Category::Electronics,
            price: "79.99".parse().unwrap(),
            image_url: None,
            seller_id: None,
        };
        let html = ProductsIndexTemplate {
            products: vec![product],
            categories: Category::ALL,
            selected_category: None,
            search: String::new(),
            error: None,
            success: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("Mechanical Keyboard"));
        assert!(html.contains("$79.99"));
        assert!(html.contains("/product/p1"));
        assert!(html.contains("/static/images/placeholder.svg"));
    }
}
