//! Marketplace API client implementation.
//!
//! Plain REST over `reqwest`. Every endpoint goes through the shared
//! [`MarketClient::check`] path so bearer-token attachment and error
//! surfacing behave identically everywhere.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode, multipart};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use trove_core::{Category, ProductId};

use crate::config::MarketApiConfig;

use super::types::{
    AuthSession, CartEnvelope, CartItem, ErrorEnvelope, ListingFields, Product, ProductEnvelope,
    ProductsEnvelope, Purchase, PurchasesEnvelope, User, UserEnvelope,
};
use super::{GENERIC_ERROR, MarketError};

// =============================================================================
// MarketClient
// =============================================================================

/// Client for the marketplace REST API.
///
/// Cheaply cloneable; holds a connection-pooled `reqwest::Client` plus the
/// configured API root.
#[derive(Clone)]
pub struct MarketClient {
    inner: Arc<MarketClientInner>,
}

struct MarketClientInner {
    http: reqwest::Client,
    api_root: url::Url,
}

/// A prepared endpoint request, remembering whether a bearer token was
/// attached. A 401 only means "rejected token" on authenticated requests;
/// the auth endpoints answer bad credentials with 401 plus an `error` body.
struct ApiRequest {
    builder: RequestBuilder,
    authed: bool,
}

impl ApiRequest {
    fn json<T: serde::Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    fn multipart(mut self, form: multipart::Form) -> Self {
        self.builder = self.builder.multipart(form);
        self
    }
}

impl MarketClient {
    /// Create a new marketplace API client.
    #[must_use]
    pub fn new(config: &MarketApiConfig) -> Self {
        Self {
            inner: Arc::new(MarketClientInner {
                http: reqwest::Client::new(),
                api_root: config.api_root.clone(),
            }),
        }
    }

    /// Build a request for an endpoint path relative to the API root,
    /// attaching the bearer token when present.
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<ApiRequest, MarketError> {
        let url = self.inner.api_root.join(path)?;
        let mut builder = self.inner.http.request(method, url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        Ok(ApiRequest {
            builder,
            authed: token.is_some(),
        })
    }

    /// Send a request and normalize the response.
    ///
    /// Non-success statuses become [`MarketError::Api`] with the message
    /// taken from the body's `error` field (falling back to the generic
    /// string). A 401 on a token-bearing request becomes
    /// [`MarketError::Unauthorized`]; a 401 on a token-less request (bad
    /// login credentials) keeps its body message. On success the raw body
    /// text is returned for the caller to decode.
    async fn check(&self, req: ApiRequest) -> Result<String, MarketError> {
        let response = req.builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED && req.authed {
                return Err(MarketError::Unauthorized);
            }
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|body| body.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            tracing::warn!(status = %status, message = %message, "marketplace API error");
            return Err(MarketError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }

    /// Send a request and decode the JSON payload.
    async fn send<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, MarketError> {
        let text = self.check(req).await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse marketplace API response"
            );
            MarketError::Parse(e)
        })
    }

    /// Send a request, discarding any success payload.
    async fn send_unit(&self, req: ApiRequest) -> Result<(), MarketError> {
        self.check(req).await.map(|_| ())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the request
    /// fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, MarketError> {
        let req = self.request(Method::POST, "auth/register", None)?.json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }));
        self.send(req).await
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request
    /// fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, MarketError> {
        let req = self.request(Method::POST, "auth/login", None)?.json(&json!({
            "email": email,
            "password": password,
        }));
        self.send(req).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch the product catalog, optionally filtered by category and/or
    /// search text. Absent filters are omitted from the query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn products(
        &self,
        token: &str,
        category: Option<Category>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, MarketError> {
        let path = products_path(category, search);
        let req = self.request(Method::GET, &path, Some(token))?;
        let envelope: ProductsEnvelope = self.send(req).await?;
        Ok(envelope.products)
    }

    /// Fetch a single product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn product(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<Product, MarketError> {
        let req = self.request(Method::GET, &format!("products/{product_id}"), Some(token))?;
        let envelope: ProductEnvelope = self.send(req).await?;
        Ok(envelope.product)
    }

    /// Create a listing. Sent as multipart form data so the optional image
    /// travels alongside the text fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the fields or the request fails.
    #[instrument(skip(self, token, fields), fields(title = %fields.title))]
    pub async fn create_listing(
        &self,
        token: &str,
        fields: ListingFields,
    ) -> Result<Product, MarketError> {
        let form = listing_form(fields)?;
        let req = self
            .request(Method::POST, "products/", Some(token))?
            .multipart(form);
        let envelope: ProductEnvelope = self.send(req).await?;
        Ok(envelope.product)
    }

    /// Update a listing (multipart, same fields as create).
    ///
    /// # Errors
    ///
    /// Returns an error if the listing is not found or the request fails.
    #[instrument(skip(self, token, fields), fields(product_id = %product_id))]
    pub async fn update_listing(
        &self,
        token: &str,
        product_id: &ProductId,
        fields: ListingFields,
    ) -> Result<Product, MarketError> {
        let form = listing_form(fields)?;
        let req = self
            .request(Method::PUT, &format!("products/{product_id}"), Some(token))?
            .multipart(form);
        let envelope: ProductEnvelope = self.send(req).await?;
        Ok(envelope.product)
    }

    /// Delete a listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing is not found or the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn delete_listing(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<(), MarketError> {
        let req = self.request(
            Method::DELETE,
            &format!("products/{product_id}"),
            Some(token),
        )?;
        self.send_unit(req).await
    }

    /// Fetch the authenticated user's own listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_listings(&self, token: &str) -> Result<Vec<Product>, MarketError> {
        let req = self.request(Method::GET, "products/user", Some(token))?;
        let envelope: ProductsEnvelope = self.send(req).await?;
        Ok(envelope.products)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the cart contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &str) -> Result<Vec<CartItem>, MarketError> {
        let req = self.request(Method::GET, "cart/", Some(token))?;
        let envelope: CartEnvelope = self.send(req).await?;
        Ok(envelope.cart_items)
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id, quantity))]
    pub async fn add_to_cart(
        &self,
        token: &str,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), MarketError> {
        let req = self
            .request(Method::POST, "cart/add", Some(token))?
            .json(&json!({ "product_id": product_id, "quantity": quantity }));
        self.send_unit(req).await
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is not in the cart or the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<(), MarketError> {
        let req = self.request(
            Method::DELETE,
            &format!("cart/remove/{product_id}"),
            Some(token),
        )?;
        self.send_unit(req).await
    }

    /// Set the quantity of a cart item.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is not in the cart or the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id, quantity))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), MarketError> {
        let req = self
            .request(
                Method::PUT,
                &format!("cart/update/{product_id}"),
                Some(token),
            )?
            .json(&json!({ "quantity": quantity }));
        self.send_unit(req).await
    }

    /// Convert the cart into a purchase and empty it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or the request fails.
    #[instrument(skip(self, token))]
    pub async fn checkout(&self, token: &str) -> Result<(), MarketError> {
        let req = self.request(Method::POST, "cart/checkout", Some(token))?;
        self.send_unit(req).await
    }

    // =========================================================================
    // Profile & purchases
    // =========================================================================

    /// Fetch the authenticated user's profile.
    ///
    /// This doubles as token validation: a 401 here means the stored token
    /// is invalid or expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &str) -> Result<User, MarketError> {
        let req = self.request(Method::GET, "users/profile", Some(token))?;
        let envelope: UserEnvelope = self.send(req).await?;
        Ok(envelope.user)
    }

    /// Update the authenticated user's username and email.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the fields or the request fails.
    #[instrument(skip(self, token), fields(username = %username))]
    pub async fn update_profile(
        &self,
        token: &str,
        username: &str,
        email: &str,
    ) -> Result<User, MarketError> {
        let req = self
            .request(Method::PUT, "users/profile", Some(token))?
            .json(&json!({ "username": username, "email": email }));
        let envelope: UserEnvelope = self.send(req).await?;
        Ok(envelope.user)
    }

    /// Fetch the authenticated user's purchase history.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn purchases(&self, token: &str) -> Result<Vec<Purchase>, MarketError> {
        let req = self.request(Method::GET, "users/purchases", Some(token))?;
        let envelope: PurchasesEnvelope = self.send(req).await?;
        Ok(envelope.purchases)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Build the products endpoint path with optional filters.
///
/// Absent or empty filters are omitted from the query string entirely.
fn products_path(category: Option<Category>, search: Option<&str>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let mut filtered = false;

    if let Some(category) = category {
        query.append_pair("category", category.as_str());
        filtered = true;
    }
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        query.append_pair("search", search);
        filtered = true;
    }

    if filtered {
        format!("products/?{}", query.finish())
    } else {
        "products/".to_string()
    }
}

/// Assemble the multipart form for listing create/update.
fn listing_form(fields: ListingFields) -> Result<multipart::Form, MarketError> {
    let mut form = multipart::Form::new()
        .text("title", fields.title)
        .text("category", fields.category.as_str())
        .text("price", fields.price)
        .text("description", fields.description);

    if let Some(image) = fields.image {
        let mut part = multipart::Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        form = form.part("image", part);
    }

    Ok(form)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_products_path_with_both_filters() {
        let path = products_path(Some(Category::Books), Some("foo"));
        assert!(path.starts_with("products/?"));
        assert!(path.contains("category=Books"));
        assert!(path.contains("search=foo"));
    }

    #[test]
    fn test_products_path_omits_absent_params() {
        assert_eq!(products_path(None, None), "products/");

        let category_only = products_path(Some(Category::Sports), None);
        assert_eq!(category_only, "products/?category=Sports");
        assert!(!category_only.contains("search"));

        let search_only = products_path(None, Some("lamp"));
        assert_eq!(search_only, "products/?search=lamp");
        assert!(!search_only.contains("category"));
    }

    #[test]
    fn test_products_path_treats_empty_search_as_absent() {
        assert_eq!(products_path(None, Some("")), "products/");
    }

    #[test]
    fn test_products_path_encodes_values() {
        let path = products_path(Some(Category::HomeGarden), Some("garden gnome"));
        assert!(path.contains("category=Home+%26+Garden"));
        assert!(path.contains("search=garden+gnome"));
    }

    #[test]
    fn test_listing_form_without_image() {
        let fields = ListingFields {
            title: "Lamp".to_string(),
            category: Category::HomeGarden,
            price: "19.99".to_string(),
            description: String::new(),
            image: None,
        };
        assert!(listing_form(fields).is_ok());
    }

    /// Serve a single canned HTTP response on a local port.
    fn serve_once(status_line: &'static str, body: &'static str) -> (std::net::SocketAddr, std::thread::JoinHandle<()>) {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        (addr, handle)
    }

    fn local_client(addr: std::net::SocketAddr) -> MarketClient {
        let config = MarketApiConfig::new(&format!("http://{addr}/api")).unwrap();
        MarketClient::new(&config)
    }

    #[tokio::test]
    async fn test_login_401_surfaces_api_message() {
        let (addr, handle) = serve_once(
            "401 UNAUTHORIZED",
            r#"{"error": "Invalid email or password"}"#,
        );

        let err = local_client(addr)
            .login("ada@example.com", "wrong")
            .await
            .unwrap_err();
        handle.join().unwrap();

        match err {
            MarketError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid email or password");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bearer_401_maps_to_unauthorized() {
        let (addr, handle) = serve_once("401 UNAUTHORIZED", r#"{"error": "Token has expired"}"#);

        let err = local_client(addr).profile("stale-token").await.unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, MarketError::Unauthorized));
    }
}
