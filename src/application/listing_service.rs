//! Listing Service - Main application use case
//!
//! Orchestrates the model endpoints: geolocating the caller, reading the
//! listing collection and narrowing it to the caller's country. Single-record
//! reads and updates go straight to the store.

use crate::domain::entities::{GeoRecord, Listing, ListingPatch};
use crate::domain::ports::{GeoResolver, ListingRepository, ResolutionFailure, StoreError};
use crate::domain::services::ListingFilter;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound for a single geolocation lookup.
pub const DEFAULT_GEO_TIMEOUT: Duration = Duration::from_millis(250);

/// Listing service - main application use case.
///
/// This service:
/// 1. Resolves the caller's location (failure is tolerated)
/// 2. Reads listings from the repository
/// 3. Applies the country filter for the collection view
pub struct ListingService {
    listing_repo: Arc<dyn ListingRepository>,
    geo_resolver: Option<Arc<dyn GeoResolver>>,
    geo_timeout: Duration,
}

impl ListingService {
    /// Create a new listing service.
    pub fn new(
        listing_repo: Arc<dyn ListingRepository>,
        geo_resolver: Option<Arc<dyn GeoResolver>>,
    ) -> Self {
        Self {
            listing_repo,
            geo_resolver,
            geo_timeout: DEFAULT_GEO_TIMEOUT,
        }
    }

    /// Override the lookup timeout.
    pub fn with_geo_timeout(mut self, timeout: Duration) -> Self {
        self.geo_timeout = timeout;
        self
    }

    pub fn has_geo_resolver(&self) -> bool {
        self.geo_resolver.is_some()
    }

    /// Resolve geographic information for an IP address.
    ///
    /// The lookup runs on the blocking pool and is abandoned once the
    /// timeout expires.
    pub async fn locate(&self, ip: &str) -> Result<GeoRecord, ResolutionFailure> {
        let resolver = self
            .geo_resolver
            .clone()
            .ok_or(ResolutionFailure::Unavailable)?;
        let ip_owned = ip.to_string();

        let lookup = tokio::task::spawn_blocking(move || resolver.resolve(&ip_owned));

        match tokio::time::timeout(self.geo_timeout, lookup).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ResolutionFailure::Lookup {
                ip: ip.to_string(),
                reason: format!("spawn_blocking error: {:?}", e),
            }),
            Err(_) => Err(ResolutionFailure::Timeout),
        }
    }

    /// Listings visible to a caller at `client_ip`.
    ///
    /// When the caller cannot be located the whole collection is returned.
    /// Store failures are propagated.
    pub async fn list_for_client(&self, client_ip: Option<&str>) -> Result<Vec<Listing>, StoreError> {
        let country = match client_ip {
            Some(ip) => match self.locate(ip).await {
                Ok(geo) => {
                    tracing::debug!("client {} located in {} ({})", ip, geo.country, geo.city);
                    Some(geo.country)
                }
                Err(e) => {
                    tracing::warn!("geolocation skipped for {}: {}", ip, e);
                    None
                }
            },
            None => {
                tracing::debug!("no client ip available, serving unfiltered listings");
                None
            }
        };

        let listings = self.listing_repo.list().await?;
        let total = listings.len();
        let filtered = ListingFilter::by_country(listings, country.as_deref());

        tracing::debug!(
            "listings served={} total={} country={:?}",
            filtered.len(),
            total,
            country
        );
        Ok(filtered)
    }

    /// Get a single listing; no geolocation involved.
    pub async fn get(&self, id: &str) -> Result<Listing, StoreError> {
        self.listing_repo.get(id).await
    }

    /// Forward a validated patch to the store.
    pub async fn update(&self, id: &str, patch: ListingPatch) -> Result<(), StoreError> {
        self.listing_repo.update(id, patch).await?;
        tracing::info!("listing {} updated", id);
        Ok(())
    }
}
