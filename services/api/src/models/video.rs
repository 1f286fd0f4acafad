//! Video models for the API service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An uploaded video with its thumbnail
///
/// Videos do not record their owner; a user's `user_videos` rows point at
/// them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub video_url: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub created_at: DateTime<Utc>,
}
