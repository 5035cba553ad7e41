//! Wire types for the marketplace API.
//!
//! These are pass-through DTOs: the client defines no invariants over them
//! beyond optional-field defaults applied at render time. Field names
//! mirror the API's JSON (Mongo-style `_id` keys).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use trove_core::{Category, ProductId, PurchaseId, UserId};

// =============================================================================
// Entities
// =============================================================================

/// An authenticated marketplace user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// A product listed on the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub seller_id: Option<UserId>,
}

impl Product {
    /// Image URL with the placeholder default applied.
    ///
    /// The API sends an empty string when no image was uploaded.
    #[must_use]
    pub fn image_or_placeholder(&self) -> &str {
        match self.image_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => "/static/images/placeholder.svg",
        }
    }
}

/// A (product, quantity) pairing in the user's cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

/// An immutable purchase record created at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct Purchase {
    #[serde(rename = "_id")]
    pub id: PurchaseId,
    /// Creation timestamp as sent by the API. Kept as a string and parsed
    /// leniently at display time; the backend has used both `created_at`
    /// and `purchase_date` for this field.
    #[serde(alias = "purchase_date")]
    pub created_at: String,
    pub items: Vec<PurchaseLine>,
}

/// A snapshot line item inside a purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseLine {
    pub title: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl Purchase {
    /// Sum of `price * quantity` over the line items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum()
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Fields for creating or updating a listing.
///
/// Sent as multipart form data; the price travels as the text the user
/// typed, exactly like a browser form submission.
#[derive(Debug, Clone)]
pub struct ListingFields {
    pub title: String,
    pub category: Category,
    pub price: String,
    pub description: String,
    pub image: Option<ImageUpload>,
}

/// An uploaded image forwarded to the API as a multipart file part.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

// =============================================================================
// Response envelopes
// =============================================================================

/// Response to login/register: a bearer token plus the user it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsEnvelope {
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartEnvelope {
    pub cart_items: Vec<CartItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PurchasesEnvelope {
    pub purchases: Vec<Purchase>,
}

/// Error body shape shared by every endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<String>,
}
