//! Integration tests for the Trove storefront.
//!
//! # Test Categories
//!
//! - `storefront_pages` - In-process router tests (no marketplace API needed)
//! - `market_live` - Live marketplace API tests, `#[ignore]`d by default
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests
//! cargo test -p trove-integration-tests
//!
//! # Live API tests (requires a running marketplace API)
//! MARKET_API_ROOT=http://localhost:5000/api \
//!     cargo test -p trove-integration-tests -- --ignored
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::Router;

use trove_storefront::config::{MarketApiConfig, StorefrontConfig};
use trove_storefront::middleware::create_session_layer;
use trove_storefront::routes;
use trove_storefront::state::AppState;

/// Configuration pointed at a marketplace API that is never reached by the
/// in-process page tests (unauthenticated requests redirect before any call).
///
/// # Panics
///
/// Panics if the hard-coded test values fail to parse.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid test host"),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        market: MarketApiConfig::new("http://localhost:5000/api").expect("valid test API root"),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Build the full storefront router with a fresh in-memory session store.
#[must_use]
pub fn test_app() -> Router {
    let config = test_config();
    let state = AppState::new(config.clone());
    let session_layer = create_session_layer(&config);

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .with_state(state)
}
