//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use trove_core::UserId;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user in the
/// navigation bar without a profile round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's marketplace ID.
    pub id: UserId,
    /// Display name shown in the navigation bar.
    pub username: String,
    /// User's email address.
    pub email: String,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for the marketplace bearer token.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
