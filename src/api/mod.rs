//! HTTP API for the web and mobile clients.
//!
//! Routes are nested under `/api/` and pass through a middleware stack:
//! Rate Limit → Access Log → Handler. The hospital directory also streams
//! changes over `/ws/hospitals`.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;
pub mod websocket;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError, ServerSession};
pub use types::ApiContext;
