//! Read-only HTTP query service over the measurement store.

pub mod handlers;
pub mod server;

pub use server::{build_router, run_server};
