//! Marketplace API client.
//!
//! # Architecture
//!
//! - The marketplace API is the source of truth - NO local state, direct
//!   REST calls with the session's bearer token
//! - One shared request path (`MarketClient::send`) for every endpoint:
//!   bearer header, JSON or multipart body, uniform error surfacing
//! - Responses are `{payload}` or `{"error": "..."}` JSON envelopes
//!
//! # Example
//!
//! ```rust,ignore
//! use trove_storefront::market::MarketClient;
//!
//! let client = MarketClient::new(&config.market);
//!
//! // Log in and fetch the catalog
//! let session = client.login("ada@example.com", "hunter22").await?;
//! let products = client
//!     .products(&session.access_token, Some(Category::Books), Some("foo"))
//!     .await?;
//! ```

mod client;
pub mod types;

pub use client::MarketClient;
pub use types::*;

use thiserror::Error;

/// Fallback message when an error response carries no usable `error` field.
pub const GENERIC_ERROR: &str = "Something went wrong";

/// Errors that can occur when talking to the marketplace API.
#[derive(Debug, Error)]
pub enum MarketError {
    /// HTTP request failed (network unreachable, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status and an error message.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Message from the response body's `error` field, or [`GENERIC_ERROR`].
        message: String,
    },

    /// The API rejected the bearer token (401). Callers should discard the
    /// session token and send the user back to login.
    #[error("Unauthorized: session token rejected")]
    Unauthorized,

    /// JSON parsing of a success response failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint path did not resolve against the API root.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl MarketError {
    /// Whether this error invalidates the stored session token.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// User-facing notification text for this error.
    ///
    /// Application errors surface their message verbatim; transport and
    /// decode failures degrade to the generic fallback.
    #[must_use]
    pub fn notification(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Unauthorized => "Your session has expired".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => GENERIC_ERROR.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_market_error_display() {
        let err = MarketError::Api {
            status: 404,
            message: "Product not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error (404): Product not found");
    }

    #[test]
    fn test_unauthorized_is_auth() {
        assert!(MarketError::Unauthorized.is_auth());
        assert!(
            !MarketError::Api {
                status: 400,
                message: "bad".to_string()
            }
            .is_auth()
        );
    }

    #[test]
    fn test_notification_surfaces_api_message_verbatim() {
        let err = MarketError::Api {
            status: 400,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.notification(), "Email already registered");
    }

    #[test]
    fn test_notification_falls_back_for_parse_errors() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = MarketError::Parse(parse);
        assert_eq!(err.notification(), GENERIC_ERROR);
    }
}
