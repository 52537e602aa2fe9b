//! API Middleware
//!
//! JWT authentication and request-id tagging for the REST API.

pub mod auth;
pub mod request_id;

pub use auth::{add_config_extension, AuthenticatedCaller, JwtAuth};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
