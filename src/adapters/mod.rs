//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP); outbound adapters
//! implement the domain ports (lookup database, listing stores).

pub mod inbound;
pub mod outbound;
