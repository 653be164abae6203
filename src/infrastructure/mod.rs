//! Infrastructure Layer
//!
//! Cross-cutting concerns and infrastructure components.

pub mod seed;
pub mod shutdown;

pub use seed::load_seed_file;
pub use shutdown::{shutdown_signal, RequestGuard, ShutdownController};
