//! Listing Repository Port
//!
//! Defines the interface for reading and patching listing records.
//! Implementations may keep listings in memory or in SQLite.

use crate::domain::entities::{Listing, ListingPatch};
use async_trait::async_trait;

/// Store-side failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("listing {0} not found")]
    NotFound(String),
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error("invalid listing document: {0}")]
    InvalidDocument(String),
    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Repository for listing documents.
///
/// `list` returns listings in the store's own order; callers must not
/// assume any other ordering.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Get a single listing by id.
    async fn get(&self, id: &str) -> Result<Listing, StoreError>;

    /// Snapshot of all listings.
    async fn list(&self) -> Result<Vec<Listing>, StoreError>;

    /// Overwrite the patched fields of a listing.
    async fn update(&self, id: &str, patch: ListingPatch) -> Result<(), StoreError>;
}
