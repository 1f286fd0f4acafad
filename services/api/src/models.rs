//! API models for request and response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod video;

pub use video::Video;

/// User entity as stored in the database
///
/// Deliberately not `Serialize`: responses go through [`UserProfile`], which
/// has no password field.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub mobile: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    /// Set once the account has completed at least one login
    pub email_registered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub mobile: String,
    pub password_hash: String,
}

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
}

impl RegisterRequest {
    /// Name of the first blank field, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("email", &self.email),
            ("mobile", &self.mobile),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Request for user login
///
/// `email` is the preferred identifier; `firstname` is accepted for clients
/// that still log in by first name.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub password: String,
}

/// Request for a bio update
#[derive(Debug, Deserialize)]
pub struct UpdateBioRequest {
    #[serde(default)]
    pub bio: Option<String>,
}

/// Public projection of a user: everything except the password hash, with
/// the media list populated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub videos: Vec<Video>,
    pub email_registered: bool,
}

impl UserProfile {
    pub fn new(user: User, videos: Vec<Video>) -> Self {
        UserProfile {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            mobile: user.mobile,
            bio: user.bio,
            profile_picture: user.profile_picture,
            videos,
            email_registered: user.email_registered,
        }
    }
}
