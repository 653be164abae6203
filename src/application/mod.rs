//! Application Layer
//!
//! Use cases that wire domain services to ports.

mod listing_service;

pub use listing_service::{ListingService, DEFAULT_GEO_TIMEOUT};
