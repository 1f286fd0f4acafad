//! Application state shared across handlers

use auth::{JwtService, Notifier};
use common::storage::ObjectStorage;
use std::sync::Arc;

use crate::repositories::{UserRepository, VideoRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub video_repository: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub notifier: Arc<dyn Notifier>,
    pub jwt_service: JwtService,
    /// Login link included in registration emails
    pub login_url: String,
}
