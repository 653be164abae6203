//! In-Memory Listing Repository
//!
//! Implements ListingRepository over a Vec guarded by a Tokio RwLock.
//! Insertion order is the listing order.

use crate::domain::entities::{Listing, ListingPatch};
use crate::domain::ports::{ListingRepository, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Vec-backed listing repository.
pub struct InMemoryListingRepository {
    listings: Arc<RwLock<Vec<Listing>>>,
}

impl InMemoryListingRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            listings: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a repository holding `listings`, upserted in order.
    pub async fn with_listings(listings: Vec<Listing>) -> Result<Self, StoreError> {
        let repo = Self::new();
        repo.upsert_all(listings).await?;
        Ok(repo)
    }

    /// Insert new listings at the end, replace existing ones in place.
    ///
    /// Every listing must carry an `_id`; nothing is written otherwise.
    pub async fn upsert_all(&self, listings: Vec<Listing>) -> Result<usize, StoreError> {
        let mut keyed = Vec::with_capacity(listings.len());
        for listing in listings {
            let id = listing
                .id()
                .ok_or_else(|| StoreError::InvalidDocument("listing without _id".to_string()))?;
            keyed.push((id, listing));
        }

        let count = keyed.len();
        let mut guard = self.listings.write().await;
        for (id, listing) in keyed {
            match guard.iter_mut().find(|l| l.has_id(&id)) {
                Some(existing) => *existing = listing,
                None => guard.push(listing),
            }
        }
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }
}

impl Default for InMemoryListingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn get(&self, id: &str) -> Result<Listing, StoreError> {
        self.listings
            .read()
            .await
            .iter()
            .find(|l| l.has_id(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Listing>, StoreError> {
        Ok(self.listings.read().await.clone())
    }

    async fn update(&self, id: &str, patch: ListingPatch) -> Result<(), StoreError> {
        let mut guard = self.listings.write().await;
        let listing = guard
            .iter_mut()
            .find(|l| l.has_id(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        listing.apply(&patch);
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(id: &str, name: &str, country: &str) -> Listing {
        Listing::from_value(json!({
            "_id": id,
            "name": name,
            "address": {"country": country}
        }))
        .unwrap()
    }

    async fn seeded() -> InMemoryListingRepository {
        InMemoryListingRepository::with_listings(vec![
            listing("10006546", "Ribeira Charming Duplex", "Portugal"),
            listing("15469178", "Cozy place in Hong Kong Island", "Hong Kong"),
            listing("102995", "UWS Brownstone Prime", "United States"),
        ])
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_is_empty() {
        let repo = InMemoryListingRepository::new();
        assert!(repo.is_empty().await);
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_existing() {
        let repo = seeded().await;
        let l = repo.get("15469178").await.unwrap();
        assert_eq!(l.get("name"), Some(&json!("Cozy place in Hong Kong Island")));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let repo = seeded().await;
        let err = repo.get("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let repo = seeded().await;
        let ids: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .filter_map(|l| l.id())
            .collect();
        assert_eq!(ids, vec!["10006546", "15469178", "102995"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let repo = seeded().await;
        repo.upsert_all(vec![listing("15469178", "Renamed", "Hong Kong")])
            .await
            .unwrap();

        assert_eq!(repo.len().await, 3);
        let all = repo.list().await.unwrap();
        assert_eq!(all[1].get("name"), Some(&json!("Renamed")));
    }

    #[tokio::test]
    async fn test_upsert_rejects_listing_without_id() {
        let repo = InMemoryListingRepository::new();
        let bad = Listing::from_value(json!({"name": "no id"})).unwrap();
        let err = repo.upsert_all(vec![bad]).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_then_get() {
        let repo = seeded().await;
        let patch = ListingPatch::parse(
            "102995",
            json!({"name": "Test Listing Update", "description": "Test Update Description"}),
        )
        .unwrap();
        repo.update("102995", patch).await.unwrap();

        let l = repo.get("102995").await.unwrap();
        assert_eq!(l.get("name"), Some(&json!("Test Listing Update")));
        assert_eq!(l.get("description"), Some(&json!("Test Update Description")));
        assert_eq!(l.country(), Some("United States"));
    }

    #[tokio::test]
    async fn test_numeric_ids_match_their_text_form() {
        let repo = InMemoryListingRepository::with_listings(vec![Listing::from_value(
            json!({"_id": 1001265, "name": "Ocean View Waikiki Marina w/prkg"}),
        )
        .unwrap()])
        .await
        .unwrap();

        assert!(repo.get("1001265").await.is_ok());
        assert!(repo.get("100126").await.is_err());

        let patch = ListingPatch::parse("1001265", json!({"name": "Waikiki"})).unwrap();
        repo.update("1001265", patch).await.unwrap();
        assert_eq!(
            repo.get("1001265").await.unwrap().get("name"),
            Some(&json!("Waikiki"))
        );
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = seeded().await;
        let patch = ListingPatch::parse("nope", json!({"name": "x"})).unwrap();
        let err = repo.update("nope", patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_reads_and_updates() {
        let repo = Arc::new(seeded().await);
        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let patch = ListingPatch::parse("10006546", json!({"beds": i})).unwrap();
                    repo.update("10006546", patch).await.unwrap();
                } else {
                    assert_eq!(repo.list().await.unwrap().len(), 3);
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert!(repo.get("10006546").await.unwrap().get("beds").is_some());
    }
}
