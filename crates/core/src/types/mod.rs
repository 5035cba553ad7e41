//! Shared type definitions.
//!
//! - [`id`] - Newtype wrappers for type-safe entity ids
//! - [`category`] - The fixed product category set

pub mod category;
pub mod id;

pub use category::Category;
pub use id::{ProductId, PurchaseId, UserId};
