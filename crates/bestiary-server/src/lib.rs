//! # bestiary-server
//!
//! HTTP API server for the bestiary design store. The binary in `main.rs`
//! wires configuration, tracing, and the SQLite store into the axum router
//! built by [`routes::app`]; the library surface exists so integration tests
//! can drive the router in-process.

pub mod config;
pub mod error;
pub mod routes;
pub mod validation;

pub use config::Config;
pub use error::ApiError;
pub use routes::{app, SharedStore};
