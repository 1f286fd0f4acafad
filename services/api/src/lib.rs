//! Clipshare API service
//!
//! Registration, login, profiles and media uploads over a PostgreSQL user
//! store and S3 object storage.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod uploads;

pub use routes::create_router;
pub use state::AppState;
