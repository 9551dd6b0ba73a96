//! Lookup Sheets API Server module
//!
//! Provides the HTTP REST API over the sheet registry.
//! Run with `sheets-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
