//! REST API: routing, extractors and handlers.

pub mod extract;
pub mod handlers;
mod routes;

pub use extract::ApiJson;
pub use routes::create_router;
