//! geolistings library
//!
//! Listing API with IP-based country filtering. The modules are exposed for
//! integration tests and for the `geo-lookup` tool.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::inbound::{ApiServer, ApiState};
pub use adapters::outbound::{InMemoryListingRepository, MaxMindGeoResolver, SqliteListingRepository};
pub use application::ListingService;
pub use config::load_config;
pub use domain::entities::{GeoRecord, Listing, ListingPatch};
pub use domain::ports::{GeoResolver, ListingRepository, ResolutionFailure, StoreError};
pub use domain::services::ListingFilter;
