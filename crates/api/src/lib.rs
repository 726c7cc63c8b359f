//! # Dunner API
//!
//! The back-office HTTP surface: one operator credential pair, signed
//! bearer tokens, and thin JSON routes delegating to the core services.

pub mod auth;
pub mod context;
pub mod routes;

pub use context::AppContext;
pub use routes::router;
