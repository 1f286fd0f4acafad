//! HTTP client for the Clipshare API

use chrono::{DateTime, Utc};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::forms::{self, FormError};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not logged in. Run `clipshare login` first.")]
    NotLoggedIn,
    #[error("{0}")]
    Form(#[from] FormError),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server responded {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("Cannot read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Serialize)]
pub struct Registration {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub mobile: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub mobile: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub email_registered: bool,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePictureResponse {
    profile_picture_url: String,
}

#[derive(Debug, Deserialize)]
struct VideoUploadResponse {
    video: Video,
}

/// A client bound to one server and, optionally, one session token
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        ApiClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, or fail without sending anything
    fn authorized(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        Ok(request.bearer_auth(token))
    }

    pub async fn register(&self, registration: &Registration) -> ClientResult<String> {
        let response = self
            .http
            .post(self.url("/api/users/register"))
            .json(registration)
            .send()
            .await?;
        let body: MessageResponse = parse(response).await?;
        Ok(body.message)
    }

    /// Returns the session token
    pub async fn login(&self, identifier: &str, password: &str) -> ClientResult<String> {
        let key = if identifier.contains('@') {
            "email"
        } else {
            "firstname"
        };
        let mut body = serde_json::json!({ "password": password });
        body[key] = Value::from(identifier);

        let response = self
            .http
            .post(self.url("/api/users/login"))
            .json(&body)
            .send()
            .await?;
        let body: LoginResponse = parse(response).await?;
        Ok(body.token)
    }

    pub async fn me(&self) -> ClientResult<Profile> {
        let request = self.authorized(self.http.get(self.url("/api/users/me")))?;
        parse(request.send().await?).await
    }

    pub async fn user(&self, id: &str) -> ClientResult<Profile> {
        let response = self
            .http
            .get(self.url(&format!("/api/users/{id}")))
            .send()
            .await?;
        parse(response).await
    }

    pub async fn users(&self) -> ClientResult<Vec<Profile>> {
        let response = self.http.get(self.url("/api/users/all")).send().await?;
        parse(response).await
    }

    pub async fn update_bio(&self, bio: &str) -> ClientResult<String> {
        let request = self.authorized(self.http.put(self.url("/api/users/bio")))?;
        let body: MessageResponse =
            parse(request.json(&serde_json::json!({ "bio": bio })).send().await?).await?;
        Ok(body.message)
    }

    /// Returns the new picture's URL
    pub async fn upload_profile_picture(&self, path: &Path) -> ClientResult<String> {
        let request = self.authorized(self.http.post(self.url("/api/uploads/profile-picture")))?;
        let form = Form::new().part("file", file_part(path).await?);
        let body: ProfilePictureResponse = parse(request.multipart(form).send().await?).await?;
        Ok(body.profile_picture_url)
    }

    pub async fn upload_video(
        &self,
        title: &str,
        description: &str,
        video: &Path,
        thumbnail: &Path,
    ) -> ClientResult<Video> {
        let request = self.authorized(self.http.post(self.url("/api/uploads/video")))?;

        let title = forms::require("title", title)?.to_string();
        let description = forms::require("description", description)?.to_string();
        forms::check_description(&description)?;

        let form = Form::new()
            .text("title", title)
            .text("description", description)
            .part("video", file_part(video).await?)
            .part("thumbnail", file_part(thumbnail).await?);

        let body: VideoUploadResponse = parse(request.multipart(form).send().await?).await?;
        Ok(body.video)
    }
}

async fn file_part(path: &Path) -> ClientResult<Part> {
    let content_type = forms::content_type_for(path)?;
    let data = tokio::fs::read(path).await.map_err(|source| ClientError::File {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    Ok(Part::bytes(data).file_name(file_name).mime_str(content_type)?)
}

/// Decode a success body, or turn an error body into [`ClientError::Api`]
async fn parse<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await?;
    Err(ClientError::Api {
        status,
        message: error_message(&text),
    })
}

/// The server reports failures under `message` or `error`
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
