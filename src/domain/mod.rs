//! Domain Layer
//!
//! Entities, ports and pure services. No I/O lives here.

pub mod entities;
pub mod ports;
pub mod services;
