//! Progress API HTTP server.
//!
//! Serves the shared catalog and per-user progress records under `/api`
//! so several devices can sync through one database.

mod routes;

pub use routes::{ApiServer, build_router, start_server};
