//! Middleware module
//!
//! Request logging for the HTTP layer

pub mod logging;

pub use logging::{get_client_ip, request_logging_middleware, REQUEST_ID_HEADER};
