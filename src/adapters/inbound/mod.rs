mod api_server;
pub mod request_locator;

pub use api_server::{
    handle_panic, ApiError, ApiServer, ApiState, HealthResponse, ListingsResponse,
    MessageResponse, UPDATED_MESSAGE, WELCOME_MESSAGE,
};
pub use request_locator::{IpSource, OVERRIDE_HEADER};
