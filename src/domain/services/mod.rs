mod listing_filter;

pub use listing_filter::ListingFilter;
