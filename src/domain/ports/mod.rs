mod geo_resolver;
mod listing_repository;

pub use geo_resolver::{GeoResolver, ResolutionFailure};
pub use listing_repository::{ListingRepository, StoreError};
