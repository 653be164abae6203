mod maxmind_geo_resolver;
mod memory_listing_repo;
mod sqlite_listing_repo;

pub use maxmind_geo_resolver::{MaxMindGeoResolver, DEFAULT_LOCALE};
pub use memory_listing_repo::InMemoryListingRepository;
pub use sqlite_listing_repo::SqliteListingRepository;
